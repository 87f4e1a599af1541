use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{ClientError, ClientResult};

/// Body printed for every successful command in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    pub version: String,
    pub error: ErrorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContract {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    /// `domain` for request mistakes, `internal` for ledger faults.
    pub kind: &'static str,
}

pub fn success<T>(command: &str, data: T) -> ClientResult<SuccessEnvelope>
where
    T: Serialize,
{
    let json_data = serde_json::to_value(data)
        .map_err(|err| ClientError::internal_serialization(&err.to_string()))?;
    Ok(SuccessEnvelope {
        ok: true,
        command: command.to_string(),
        version: API_VERSION.to_string(),
        data: json_data,
    })
}

pub fn failure_from_error(error: &ClientError) -> FailureEnvelope {
    FailureEnvelope {
        ok: false,
        version: API_VERSION.to_string(),
        error: ErrorContract {
            code: error.code.clone(),
            message: error.message.clone(),
            recovery_steps: error.recovery_steps.clone(),
            kind: if error.is_internal() {
                "internal"
            } else {
                "domain"
            },
        },
        data: error.data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use crate::ClientError;

    use super::{failure_from_error, success};

    #[test]
    fn success_wraps_payload_with_command_name() {
        let envelope = success("bills generate", json!({ "created": [] }));
        assert!(envelope.is_ok());
        if let Ok(envelope) = envelope {
            assert!(envelope.ok);
            assert_eq!(envelope.command, "bills generate");
            assert_eq!(envelope.data, json!({ "created": [] }));
        }
    }

    #[test]
    fn failure_marks_error_kind() {
        let domain = failure_from_error(&ClientError::bill_not_found("bill_1"));
        assert_eq!(domain.error.kind, "domain");
        assert!(domain.data.is_some());

        let internal = failure_from_error(&ClientError::ledger_locked(Path::new("/tmp/x.db")));
        assert_eq!(internal.error.kind, "internal");
    }
}
