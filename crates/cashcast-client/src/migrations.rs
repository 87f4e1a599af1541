use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");

pub const EXPECTED_USER_VERSION: i64 = 1;

pub const REQUIRED_INDEX_NAMES: [&str; 7] = [
    "idx_banks_organization",
    "idx_ledger_records_dedupe",
    "idx_ledger_records_org_book_date",
    "idx_ledger_records_group",
    "idx_bills_occurrence",
    "idx_bills_content_period",
    "idx_bills_source_period",
];

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![M::up(BOOTSTRAP_SQL)]);
    migrations.to_latest(conn)
}
