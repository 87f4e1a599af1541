use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::migrations::{EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES, run_pending};
use crate::home::LedgerHome;
use crate::settings::{EngineSettings, load_home_settings};
use crate::store::open_connection;
use crate::{ClientError, ClientResult};

const ORGANIZATIONS_COLUMNS: [&str; 3] = ["organization_id", "name", "created_at"];
const BANKS_COLUMNS: [&str; 3] = ["bank_id", "organization_id", "name"];
const LEDGER_RECORDS_COLUMNS: [&str; 22] = [
    "record_id",
    "organization_id",
    "kind",
    "book",
    "description",
    "company",
    "category",
    "amount",
    "expiration_date",
    "purchase_date",
    "balance_close_date",
    "type_payment",
    "installment_current",
    "installment_total_payment",
    "group_installment_id",
    "paid",
    "is_hidden",
    "bank_id",
    "bank_type_account_id",
    "external_transaction_id",
    "repeat_index",
    "dedupe_key",
];
const BILLS_COLUMNS: [&str; 13] = [
    "bill_id",
    "series_id",
    "organization_id",
    "description",
    "company",
    "category",
    "amount",
    "day_of_month",
    "period",
    "expiration_date",
    "active",
    "paid",
    "source_transaction_id",
];

const REQUIRED_CORE_TABLES: [(&str, &[&str]); 5] = [
    ("internal_meta", &["key", "value"]),
    ("organizations", &ORGANIZATIONS_COLUMNS),
    ("banks", &BANKS_COLUMNS),
    ("ledger_records", &LEDGER_RECORDS_COLUMNS),
    ("bills", &BILLS_COLUMNS),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub schema_version: String,
    pub settings: EngineSettings,
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home_override))
}

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(home_override)
}

fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let ledger_home = LedgerHome::resolve(home_override)?;
    ledger_home.prepare()?;
    let settings = load_home_settings(ledger_home.root())?;

    let db_path = ledger_home.db_path();
    let mut connection = open_connection(&db_path)?;

    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    verify_core_tables(&connection, &db_path)?;
    verify_indexes(&connection, &db_path)?;
    let schema_version = read_schema_version(&connection, &db_path)?;
    debug!(db_path = %db_path.display(), %schema_version, "ledger ready");

    Ok(SetupContext {
        home: ledger_home.root().to_path_buf(),
        db_path,
        schema_version,
        settings,
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    match error {
        rusqlite_migration::Error::RusqliteError { query: _, err } => {
            let mapped = ClientError::from_sqlite(db_path, err);
            if mapped.code == "ledger_locked"
                || mapped.code == "ledger_corrupt"
                || mapped.code == "ledger_init_permission_denied"
            {
                mapped
            } else {
                ClientError::migration_failed(db_path, &error.to_string())
            }
        }
        _ => ClientError::migration_failed(db_path, &error.to_string()),
    }
}

fn verify_core_tables(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    let user_version = connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|error| ClientError::from_sqlite(db_path, &error))?;
    if user_version != EXPECTED_USER_VERSION {
        return Err(ClientError::ledger_corrupt(db_path));
    }

    for (table_name, required_columns) in REQUIRED_CORE_TABLES {
        if !sqlite_object_exists(connection, "table", table_name, db_path)? {
            return Err(ClientError::ledger_corrupt(db_path));
        }

        let columns = table_columns(connection, table_name, db_path)?;
        for required_column in required_columns {
            if !columns.iter().any(|column| column == required_column) {
                return Err(ClientError::ledger_corrupt(db_path));
            }
        }
    }

    Ok(())
}

fn verify_indexes(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for index_name in REQUIRED_INDEX_NAMES {
        if !sqlite_object_exists(connection, "index", index_name, db_path)? {
            return Err(ClientError::ledger_corrupt(db_path));
        }
    }
    Ok(())
}

fn sqlite_object_exists(
    connection: &Connection,
    object_type: &str,
    object_name: &str,
    db_path: &Path,
) -> ClientResult<bool> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 LIMIT 1",
            params![object_type, object_name],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| ClientError::from_sqlite(db_path, &error))?
        .unwrap_or(false);

    Ok(exists)
}

fn table_columns(
    connection: &Connection,
    table_name: &str,
    db_path: &Path,
) -> ClientResult<Vec<String>> {
    if !is_required_core_table(table_name) {
        return Err(ClientError::ledger_init_failed(
            db_path,
            "Refused PRAGMA table inspection for non-core table.",
        ));
    }

    // SAFETY: `table_name` is restricted to the compile-time allowlist from
    // REQUIRED_CORE_TABLES above and never originates from user input.
    let sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| ClientError::from_sqlite(db_path, &error))?;

    let column_iter = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| ClientError::from_sqlite(db_path, &error))?;

    let mut columns: Vec<String> = Vec::new();
    for row in column_iter {
        let column = row.map_err(|error| ClientError::from_sqlite(db_path, &error))?;
        columns.push(column);
    }

    Ok(columns)
}

fn is_required_core_table(table_name: &str) -> bool {
    REQUIRED_CORE_TABLES
        .iter()
        .any(|(required_name, _)| required_name == &table_name)
}

fn read_schema_version(connection: &Connection, db_path: &Path) -> ClientResult<String> {
    let value = connection
        .query_row(
            "SELECT value FROM internal_meta WHERE key = 'schema_version' LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| ClientError::from_sqlite(db_path, &error))?;

    Ok(value.unwrap_or_else(|| "v1".to_string()))
}
