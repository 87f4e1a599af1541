use rusqlite::{Connection, Row, params};

use crate::ledger::period::{MonthKey, format_iso_date, parse_calendar_date};
use crate::ledger::{Bill, BillUpdate};
use crate::store::{BillFilter, BillRepository, SqliteStore, map_write_error, now_timestamp};
use crate::{ClientError, ClientResult};

const BILL_COLUMNS: &str = "bill_id,
    series_id,
    organization_id,
    description,
    company,
    category,
    amount,
    day_of_month,
    period,
    expiration_date,
    active,
    paid,
    source_transaction_id";

#[derive(Debug)]
struct StoredBill {
    bill_id: String,
    series_id: String,
    organization_id: String,
    description: String,
    company: String,
    category: String,
    amount: i64,
    day_of_month: u32,
    period: String,
    expiration_date: String,
    active: bool,
    paid: bool,
    source_transaction_id: Option<String>,
}

impl BillRepository for SqliteStore {
    fn search_many(&self, organization_id: &str, filter: &BillFilter) -> ClientResult<Vec<Bill>> {
        let sql = format!(
            "SELECT {BILL_COLUMNS}
             FROM bills
             WHERE organization_id = ?1
               AND (?2 IS NULL OR period = ?2)
               AND (?3 IS NULL OR period <= ?3)
               AND (?4 IS NULL OR paid = ?4)
               AND (?5 IS NULL OR active = ?5)
               AND (?6 IS NULL OR source_transaction_id = ?6)
               AND (?7 IS NULL OR series_id = ?7)
             ORDER BY period ASC, day_of_month ASC, description ASC, bill_id ASC"
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        let rows_iter = statement
            .query_map(
                params![
                    organization_id,
                    filter.period.map(|period| period.to_string()),
                    filter.until_period.map(|period| period.to_string()),
                    filter.paid,
                    filter.active,
                    filter.source_transaction_id,
                    filter.series_id,
                ],
                read_stored_bill,
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        let mut bills = Vec::new();
        for row in rows_iter {
            let stored = row.map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
            if let Some(bill) = decode_bill(stored) {
                bills.push(bill);
            }
        }
        Ok(bills)
    }

    fn insert_if_absent(&self, bill: &Bill) -> ClientResult<bool> {
        let inserted = self
            .connection
            .execute(
                "INSERT INTO bills (
                    bill_id,
                    series_id,
                    organization_id,
                    description,
                    company,
                    category,
                    amount,
                    day_of_month,
                    period,
                    expiration_date,
                    active,
                    paid,
                    source_transaction_id,
                    created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT DO NOTHING",
                params![
                    &bill.bill_id,
                    &bill.series_id,
                    &bill.organization_id,
                    &bill.description,
                    &bill.company,
                    &bill.category,
                    bill.amount,
                    bill.day_of_month,
                    bill.period.to_string(),
                    format_iso_date(&bill.expiration_date),
                    bill.active,
                    bill.paid,
                    &bill.source_transaction_id,
                    now_timestamp()
                ],
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        Ok(inserted == 1)
    }

    fn update(
        &self,
        organization_id: &str,
        bill_id: &str,
        update: &BillUpdate,
    ) -> ClientResult<Bill> {
        let mut bill = self.find_bill(organization_id, bill_id)?;
        update.apply(&mut bill);

        let carried = update.carried_forward();
        let mut later = Vec::new();
        if !carried.is_empty() {
            later = BillRepository::search_many(
                self,
                organization_id,
                &BillFilter {
                    series_id: Some(bill.series_id.clone()),
                    ..BillFilter::default()
                },
            )?;
            later.retain(|occurrence| occurrence.period > bill.period);
            for occurrence in &mut later {
                carried.apply(occurrence);
            }
        }

        let transaction = self
            .connection
            .unchecked_transaction()
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        for changed in std::iter::once(&bill).chain(later.iter()) {
            write_bill(&transaction, changed)
                .map_err(|error| map_write_error(&self.db_path, &error))?;
        }
        transaction
            .commit()
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        tracing::debug!(
            bill_id = %bill.bill_id,
            series_id = %bill.series_id,
            carried = later.len(),
            "bill updated"
        );
        Ok(bill)
    }

    fn delete(&self, organization_id: &str, bill_id: &str) -> ClientResult<()> {
        let deleted = self
            .connection
            .execute(
                "DELETE FROM bills WHERE organization_id = ?1 AND bill_id = ?2",
                params![organization_id, bill_id],
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        if deleted == 0 {
            return Err(ClientError::bill_not_found(bill_id));
        }
        Ok(())
    }
}

impl SqliteStore {
    pub fn find_bill(&self, organization_id: &str, bill_id: &str) -> ClientResult<Bill> {
        let sql = format!(
            "SELECT {BILL_COLUMNS}
             FROM bills
             WHERE organization_id = ?1 AND bill_id = ?2"
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        let mut rows = statement
            .query_map(params![organization_id, bill_id], read_stored_bill)
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        match rows.next() {
            Some(row) => {
                let stored = row.map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
                decode_bill(stored).ok_or_else(|| ClientError::ledger_corrupt(&self.db_path))
            }
            None => Err(ClientError::bill_not_found(bill_id)),
        }
    }
}

fn write_bill(connection: &Connection, bill: &Bill) -> rusqlite::Result<usize> {
    connection.execute(
        "UPDATE bills SET
            description = ?3,
            company = ?4,
            category = ?5,
            amount = ?6,
            day_of_month = ?7,
            expiration_date = ?8,
            active = ?9,
            paid = ?10
         WHERE organization_id = ?1 AND bill_id = ?2",
        params![
            &bill.organization_id,
            &bill.bill_id,
            &bill.description,
            &bill.company,
            &bill.category,
            bill.amount,
            bill.day_of_month,
            format_iso_date(&bill.expiration_date),
            bill.active,
            bill.paid
        ],
    )
}

fn read_stored_bill(row: &Row<'_>) -> rusqlite::Result<StoredBill> {
    Ok(StoredBill {
        bill_id: row.get(0)?,
        series_id: row.get(1)?,
        organization_id: row.get(2)?,
        description: row.get(3)?,
        company: row.get(4)?,
        category: row.get(5)?,
        amount: row.get(6)?,
        day_of_month: row.get(7)?,
        period: row.get(8)?,
        expiration_date: row.get(9)?,
        active: row.get(10)?,
        paid: row.get(11)?,
        source_transaction_id: row.get(12)?,
    })
}

fn decode_bill(stored: StoredBill) -> Option<Bill> {
    let (Some(period), Some(expiration_date)) = (
        MonthKey::parse(&stored.period),
        parse_calendar_date(&stored.expiration_date),
    ) else {
        tracing::warn!(bill_id = %stored.bill_id, "skipping bill with unreadable period or due date");
        return None;
    };

    Some(Bill {
        bill_id: stored.bill_id,
        series_id: stored.series_id,
        organization_id: stored.organization_id,
        description: stored.description,
        company: stored.company,
        category: stored.category,
        amount: stored.amount,
        day_of_month: stored.day_of_month,
        period,
        expiration_date,
        active: stored.active,
        paid: stored.paid,
        source_transaction_id: stored.source_transaction_id,
    })
}
