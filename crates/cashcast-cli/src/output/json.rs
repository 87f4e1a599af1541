use std::io;

use cashcast_client::contracts::envelope::failure_from_error;
use cashcast_client::{ClientError, SuccessEnvelope};
use serde::Serialize;

/// JSON mode prints the envelope as-is so scripts can rely on `ok`,
/// `command`, `version` and `data` for every command.
pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    serialize_json_pretty(success)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&failure_from_error(error))
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use cashcast_client::{ClientError, SuccessEnvelope};
    use serde_json::{Value, json};

    use super::{render_error_json, render_success_json};

    #[test]
    fn success_json_keeps_the_envelope() {
        let payload = SuccessEnvelope {
            ok: true,
            command: "bills generate".to_string(),
            version: "0.1.0".to_string(),
            data: json!({"period": "2025-07", "created": []}),
        };

        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(true));
                assert_eq!(value["command"], "bills generate");
                assert_eq!(value["data"]["period"], "2025-07");
            }
        }
    }

    #[test]
    fn error_json_marks_domain_and_internal_failures() {
        let domain = render_error_json(&ClientError::bill_not_found("bill_1"));
        assert!(domain.is_ok());
        if let Ok(text) = domain {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(false));
                assert_eq!(value["error"]["code"], "bill_not_found");
                assert_eq!(value["error"]["kind"], "domain");
                assert_eq!(value["data"]["bill_id"], "bill_1");
            }
        }

        let internal = render_error_json(&ClientError::ledger_locked(std::path::Path::new(
            "/tmp/ledger.db",
        )));
        assert!(internal.is_ok());
        if let Ok(text) = internal {
            assert!(text.contains("\"internal\""));
        }
    }
}
