use std::io;
use std::path::Path;

use rusqlite::ffi::ErrorCode;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Infrastructure failures the caller cannot fix by changing its request.
    pub fn is_internal(&self) -> bool {
        self.code.starts_with("internal_")
            || matches!(
                self.code.as_str(),
                "ledger_init_permission_denied"
                    | "ledger_locked"
                    | "ledger_corrupt"
                    | "migration_failed"
                    | "ledger_init_failed"
            )
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `cashcast {cmd} --help` for usage."),
            None => "Run `cashcast --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn invalid_settings(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "invalid_settings",
            &format!("Settings file `{location}` could not be read: {detail}"),
            vec![
                format!("Fix the JSON in `{location}` or delete it to use defaults."),
                "All settings fields are optional.".to_string(),
            ],
        )
        .with_data(json!({
            "settings_path": location,
        }))
    }

    pub fn organization_not_found(organization_id: &str) -> Self {
        Self::new(
            "organization_not_found",
            &format!("Organization `{organization_id}` was not found."),
            vec![
                "Run `cashcast org list` to find a valid organization id.".to_string(),
                "Create one with `cashcast org create <name>`.".to_string(),
            ],
        )
        .with_data(json!({
            "organization_id": organization_id,
        }))
    }

    pub fn record_not_found(record_id: &str) -> Self {
        Self::new(
            "record_not_found",
            &format!("Transaction `{record_id}` was not found in this organization."),
            vec!["Run `cashcast txn list --org <org_id>` to find a valid record id.".to_string()],
        )
        .with_data(json!({
            "record_id": record_id,
        }))
    }

    pub fn group_not_found(group_id: &str) -> Self {
        Self::new(
            "group_not_found",
            &format!("Group `{group_id}` has no transactions in this organization."),
            vec![
                "Run `cashcast txn list --org <org_id>` and copy a group_installment_id."
                    .to_string(),
            ],
        )
        .with_data(json!({
            "group_installment_id": group_id,
        }))
    }

    pub fn bill_not_found(bill_id: &str) -> Self {
        Self::new(
            "bill_not_found",
            &format!("Bill `{bill_id}` was not found in this organization."),
            vec!["Run `cashcast bills list --org <org_id>` to find a valid bill id.".to_string()],
        )
        .with_data(json!({
            "bill_id": bill_id,
        }))
    }

    pub fn bank_not_found(bank_id: &str) -> Self {
        Self::new(
            "bank_not_found",
            &format!("Bank `{bank_id}` was not found in this organization."),
            vec!["Run `cashcast bank list --org <org_id>` to find a valid bank id.".to_string()],
        )
        .with_data(json!({
            "bank_id": bank_id,
        }))
    }

    pub fn duplicate_bill_source(source_transaction_id: &str, existing_bill_id: &str) -> Self {
        Self::new(
            "duplicate_bill_source",
            &format!(
                "Transaction `{source_transaction_id}` already produced bill `{existing_bill_id}`."
            ),
            vec![
                "Update the existing bill with `cashcast bills update` instead.".to_string(),
                "Or delete it first with `cashcast bills delete`.".to_string(),
            ],
        )
        .with_data(json!({
            "source_transaction_id": source_transaction_id,
            "existing_bill_id": existing_bill_id,
        }))
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `CASHCAST_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite ledger file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }

    /// Filesystem failure while preparing the ledger home at `path`.
    pub fn from_io(path: &Path, error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => {
                Self::ledger_init_permission_denied(path, &error.to_string())
            }
            _ => Self::ledger_init_failed(path, &error.to_string()),
        }
    }

    /// SQLite failure against the ledger database at `path`.
    pub fn from_sqlite(path: &Path, error: &rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::ledger_locked(path),
            Some(ErrorCode::NotADatabase) => Self::ledger_corrupt(path),
            Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly) => {
                Self::ledger_init_permission_denied(path, &error.to_string())
            }
            _ => Self::ledger_init_failed(path, &error.to_string()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::ClientError;

    #[test]
    fn not_found_errors_are_domain_errors() {
        let error = ClientError::organization_not_found("org_1");
        assert!(!error.is_internal());
        assert_eq!(error.code, "organization_not_found");
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        assert!(ClientError::ledger_locked(Path::new("/tmp/ledger.db")).is_internal());
        assert!(ClientError::internal_serialization("boom").is_internal());
        assert!(!ClientError::duplicate_bill_source("rec_1", "bill_1").is_internal());
    }

    #[test]
    fn busy_database_maps_to_locked() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let error = ClientError::from_sqlite(Path::new("/tmp/ledger.db"), &busy);
        assert_eq!(error.code, "ledger_locked");
    }

    #[test]
    fn command_hint_is_attached_to_invalid_argument() {
        let error = ClientError::invalid_argument_for_command("bad month", Some("bills list"));
        assert_eq!(error.code, "invalid_argument");
        assert!(error.recovery_steps[0].contains("cashcast bills list --help"));
        assert!(error.data.is_some());
    }
}
