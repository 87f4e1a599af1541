use std::path::Path;

use rusqlite::{Connection, Row, TransactionBehavior, params};

use crate::ledger::period::{format_iso_date, parse_calendar_date};
use crate::ledger::{Book, LedgerKind, LedgerRecord, LedgerRecordUpdate, PaymentType};
use crate::store::{LedgerRepository, RecordFilter, SqliteStore, map_write_error, now_timestamp};
use crate::{ClientError, ClientResult};

const RECORD_COLUMNS: &str = "record_id,
    organization_id,
    kind,
    book,
    description,
    company,
    category,
    amount,
    expiration_date,
    purchase_date,
    balance_close_date,
    type_payment,
    installment_current,
    installment_total_payment,
    group_installment_id,
    paid,
    is_hidden,
    bank_id,
    bank_type_account_id,
    external_transaction_id,
    repeat_index";

#[derive(Debug)]
struct StoredRecord {
    record_id: String,
    organization_id: String,
    kind: String,
    book: String,
    description: String,
    company: Option<String>,
    category: String,
    amount: i64,
    expiration_date: String,
    purchase_date: Option<String>,
    balance_close_date: Option<String>,
    type_payment: String,
    installment_current: Option<u32>,
    installment_total_payment: Option<u32>,
    group_installment_id: Option<String>,
    paid: bool,
    is_hidden: bool,
    bank_id: Option<String>,
    bank_type_account_id: Option<String>,
    external_transaction_id: Option<String>,
    repeat_index: u32,
}

impl LedgerRepository for SqliteStore {
    fn search_many(
        &self,
        organization_id: &str,
        filter: &RecordFilter,
    ) -> ClientResult<Vec<LedgerRecord>> {
        let kinds = encode_kinds(&filter.kinds)?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM ledger_records
             WHERE organization_id = ?1
               AND (?2 IS NULL OR kind IN (SELECT value FROM json_each(?2)))
               AND (?3 IS NULL OR book = ?3)
               AND (?4 IS NULL OR bank_id = ?4)
               AND (?5 IS NULL OR expiration_date >= ?5)
               AND (?6 IS NULL OR expiration_date <= ?6)
               AND (?7 IS NULL OR group_installment_id = ?7)
             ORDER BY expiration_date ASC, record_id ASC"
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        let rows_iter = statement
            .query_map(
                params![
                    organization_id,
                    kinds,
                    filter.book.map(Book::as_str),
                    filter.bank_id,
                    filter.from.as_ref().map(format_iso_date),
                    filter.to.as_ref().map(format_iso_date),
                    filter.group_installment_id,
                ],
                read_stored_record,
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        let mut records = Vec::new();
        for row in rows_iter {
            let stored = row.map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
            if let Some(record) = decode_record(stored) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn find(&self, organization_id: &str, record_id: &str) -> ClientResult<LedgerRecord> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM ledger_records
             WHERE organization_id = ?1 AND record_id = ?2"
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        let mut rows = statement
            .query_map(params![organization_id, record_id], read_stored_record)
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        match rows.next() {
            Some(row) => {
                let stored = row.map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
                decode_record(stored).ok_or_else(|| ClientError::ledger_corrupt(&self.db_path))
            }
            None => Err(ClientError::record_not_found(record_id)),
        }
    }

    fn create_many(&mut self, records: &[LedgerRecord]) -> ClientResult<usize> {
        let db_path = self.db_path.clone();
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|error| ClientError::from_sqlite(&db_path, &error))?;

        let created_at = now_timestamp();
        let mut inserted = 0_usize;
        for record in records {
            inserted += insert_record(&transaction, &db_path, record, &created_at)?;
        }

        transaction
            .commit()
            .map_err(|error| ClientError::from_sqlite(&db_path, &error))?;

        tracing::debug!(
            submitted = records.len(),
            inserted,
            "ledger records written"
        );
        Ok(inserted)
    }

    fn update(
        &self,
        organization_id: &str,
        record_id: &str,
        update: &LedgerRecordUpdate,
    ) -> ClientResult<LedgerRecord> {
        let mut record = self.find(organization_id, record_id)?;
        update.apply(&mut record);
        rewrite_record(&self.connection, &self.db_path, &record)?;
        Ok(record)
    }

    fn delete(&self, organization_id: &str, record_id: &str) -> ClientResult<()> {
        let deleted = self
            .connection
            .execute(
                "DELETE FROM ledger_records WHERE organization_id = ?1 AND record_id = ?2",
                params![organization_id, record_id],
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        if deleted == 0 {
            return Err(ClientError::record_not_found(record_id));
        }
        Ok(())
    }

    fn update_group(
        &mut self,
        organization_id: &str,
        group_installment_id: &str,
        update: &LedgerRecordUpdate,
    ) -> ClientResult<usize> {
        let filter = RecordFilter {
            group_installment_id: Some(group_installment_id.to_string()),
            ..RecordFilter::default()
        };
        let members = LedgerRepository::search_many(self, organization_id, &filter)?;
        if members.is_empty() {
            return Err(ClientError::group_not_found(group_installment_id));
        }

        let db_path = self.db_path.clone();
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|error| ClientError::from_sqlite(&db_path, &error))?;
        for mut record in members.iter().cloned() {
            update.apply(&mut record);
            rewrite_record(&transaction, &db_path, &record)?;
        }
        transaction
            .commit()
            .map_err(|error| ClientError::from_sqlite(&db_path, &error))?;

        Ok(members.len())
    }

    fn delete_group(
        &self,
        organization_id: &str,
        group_installment_id: &str,
    ) -> ClientResult<usize> {
        let deleted = self
            .connection
            .execute(
                "DELETE FROM ledger_records
                 WHERE organization_id = ?1 AND group_installment_id = ?2",
                params![organization_id, group_installment_id],
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        if deleted == 0 {
            return Err(ClientError::group_not_found(group_installment_id));
        }
        Ok(deleted)
    }
}

fn insert_record(
    connection: &Connection,
    db_path: &Path,
    record: &LedgerRecord,
    created_at: &str,
) -> ClientResult<usize> {
    connection
        .execute(
            "INSERT INTO ledger_records (
                record_id,
                organization_id,
                kind,
                book,
                description,
                company,
                category,
                amount,
                expiration_date,
                purchase_date,
                balance_close_date,
                type_payment,
                installment_current,
                installment_total_payment,
                group_installment_id,
                paid,
                is_hidden,
                bank_id,
                bank_type_account_id,
                external_transaction_id,
                repeat_index,
                dedupe_key,
                created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
             ON CONFLICT DO NOTHING",
            params![
                &record.record_id,
                &record.organization_id,
                record.kind.as_str(),
                record.book.as_str(),
                &record.description,
                &record.company,
                &record.category,
                record.amount,
                format_iso_date(&record.expiration_date),
                record.purchase_date.as_ref().map(format_iso_date),
                record.balance_close_date.as_ref().map(format_iso_date),
                record.type_payment.as_str(),
                record.installment_current,
                record.installment_total_payment,
                &record.group_installment_id,
                record.paid,
                record.is_hidden,
                &record.bank_id,
                &record.bank_type_account_id,
                &record.external_transaction_id,
                record.repeat_index,
                record.dedupe_key(),
                created_at
            ],
        )
        .map_err(|error| ClientError::from_sqlite(db_path, &error))
}

fn rewrite_record(connection: &Connection, db_path: &Path, record: &LedgerRecord) -> ClientResult<()> {
    connection
        .execute(
            "UPDATE ledger_records SET
                description = ?3,
                company = ?4,
                category = ?5,
                amount = ?6,
                expiration_date = ?7,
                paid = ?8,
                is_hidden = ?9,
                bank_id = ?10,
                dedupe_key = ?11
             WHERE organization_id = ?1 AND record_id = ?2",
            params![
                &record.organization_id,
                &record.record_id,
                &record.description,
                &record.company,
                &record.category,
                record.amount,
                format_iso_date(&record.expiration_date),
                record.paid,
                record.is_hidden,
                &record.bank_id,
                record.dedupe_key()
            ],
        )
        .map_err(|error| map_write_error(db_path, &error))?;
    Ok(())
}

fn encode_kinds(kinds: &[LedgerKind]) -> ClientResult<Option<String>> {
    if kinds.is_empty() {
        return Ok(None);
    }
    let labels = kinds.iter().map(|kind| kind.as_str()).collect::<Vec<_>>();
    serde_json::to_string(&labels)
        .map(Some)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

fn read_stored_record(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        record_id: row.get(0)?,
        organization_id: row.get(1)?,
        kind: row.get(2)?,
        book: row.get(3)?,
        description: row.get(4)?,
        company: row.get(5)?,
        category: row.get(6)?,
        amount: row.get(7)?,
        expiration_date: row.get(8)?,
        purchase_date: row.get(9)?,
        balance_close_date: row.get(10)?,
        type_payment: row.get(11)?,
        installment_current: row.get(12)?,
        installment_total_payment: row.get(13)?,
        group_installment_id: row.get(14)?,
        paid: row.get(15)?,
        is_hidden: row.get(16)?,
        bank_id: row.get(17)?,
        bank_type_account_id: row.get(18)?,
        external_transaction_id: row.get(19)?,
        repeat_index: row.get(20)?,
    })
}

fn decode_record(stored: StoredRecord) -> Option<LedgerRecord> {
    let Some(kind) = LedgerKind::parse(&stored.kind) else {
        tracing::warn!(record_id = %stored.record_id, kind = %stored.kind, "skipping record with unknown kind");
        return None;
    };
    let Some(book) = Book::parse(&stored.book) else {
        tracing::warn!(record_id = %stored.record_id, book = %stored.book, "skipping record with unknown book");
        return None;
    };
    let Some(expiration_date) = parse_calendar_date(&stored.expiration_date) else {
        tracing::warn!(record_id = %stored.record_id, "skipping record with unreadable expiration date");
        return None;
    };

    Some(LedgerRecord {
        record_id: stored.record_id,
        organization_id: stored.organization_id,
        kind,
        book,
        description: stored.description,
        company: stored.company,
        category: stored.category,
        amount: stored.amount,
        expiration_date,
        purchase_date: stored.purchase_date.as_deref().and_then(parse_calendar_date),
        balance_close_date: stored
            .balance_close_date
            .as_deref()
            .and_then(parse_calendar_date),
        type_payment: PaymentType::parse(&stored.type_payment),
        installment_current: stored.installment_current,
        installment_total_payment: stored.installment_total_payment,
        group_installment_id: stored.group_installment_id,
        paid: stored.paid,
        is_hidden: stored.is_hidden,
        bank_id: stored.bank_id,
        bank_type_account_id: stored.bank_type_account_id,
        external_transaction_id: stored.external_transaction_id,
        repeat_index: stored.repeat_index,
    })
}
