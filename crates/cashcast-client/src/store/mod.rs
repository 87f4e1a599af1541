//! Persistence seams for the engine.
//!
//! The engine only talks to these traits; `SqliteStore` is the ledger-backed
//! implementation used by every command.

mod bills;
mod organizations;
mod records;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::Connection;
use rusqlite::ffi::ErrorCode;

use crate::ledger::period::MonthKey;
use crate::ledger::{Bill, BillUpdate, Book, LedgerKind, LedgerRecord, LedgerRecordUpdate};
use crate::{ClientError, ClientResult};

/// Narrows a record search. Empty `kinds` means every kind.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub kinds: Vec<LedgerKind>,
    pub book: Option<Book>,
    pub bank_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub group_installment_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub period: Option<MonthKey>,
    /// Every period up to and including this one.
    pub until_period: Option<MonthKey>,
    pub paid: Option<bool>,
    pub active: Option<bool>,
    pub source_transaction_id: Option<String>,
    pub series_id: Option<String>,
}

pub trait LedgerRepository {
    fn search_many(
        &self,
        organization_id: &str,
        filter: &RecordFilter,
    ) -> ClientResult<Vec<LedgerRecord>>;

    fn find(&self, organization_id: &str, record_id: &str) -> ClientResult<LedgerRecord>;

    /// Inserts in one transaction, skipping records that already exist.
    /// Returns how many rows were written.
    fn create_many(&mut self, records: &[LedgerRecord]) -> ClientResult<usize>;

    fn update(
        &self,
        organization_id: &str,
        record_id: &str,
        update: &LedgerRecordUpdate,
    ) -> ClientResult<LedgerRecord>;

    fn delete(&self, organization_id: &str, record_id: &str) -> ClientResult<()>;

    fn update_group(
        &mut self,
        organization_id: &str,
        group_installment_id: &str,
        update: &LedgerRecordUpdate,
    ) -> ClientResult<usize>;

    fn delete_group(&self, organization_id: &str, group_installment_id: &str)
    -> ClientResult<usize>;
}

pub trait BillRepository {
    fn search_many(&self, organization_id: &str, filter: &BillFilter) -> ClientResult<Vec<Bill>>;

    /// Atomic conditional insert; `false` when the occurrence already exists.
    fn insert_if_absent(&self, bill: &Bill) -> ClientResult<bool>;

    /// Changes one occurrence and carries everything but `paid` into the
    /// later occurrences of its series.
    fn update(
        &self,
        organization_id: &str,
        bill_id: &str,
        update: &BillUpdate,
    ) -> ClientResult<Bill>;

    fn delete(&self, organization_id: &str, bill_id: &str) -> ClientResult<()>;
}

pub struct SqliteStore {
    connection: Connection,
    db_path: PathBuf,
}

/// Opens the ledger database with a short busy wait and foreign keys on, so
/// organization deletes cascade to every owned row.
pub(crate) fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connect = || -> rusqlite::Result<Connection> {
        let connection = Connection::open(db_path)?;
        connection.busy_timeout(Duration::from_millis(250))?;
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(connection)
    };
    connect().map_err(|error| ClientError::from_sqlite(db_path, &error))
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> ClientResult<Self> {
        Ok(Self {
            connection: open_connection(db_path)?,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Unique-index violations on writes are caller mistakes, not ledger faults.
pub(crate) fn map_write_error(db_path: &Path, error: &rusqlite::Error) -> ClientError {
    if error.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        return ClientError::invalid_argument(
            "The change would collide with an existing entry in this organization.",
        );
    }
    ClientError::from_sqlite(db_path, error)
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
