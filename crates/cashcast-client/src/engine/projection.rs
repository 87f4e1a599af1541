use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::period::MonthKey;
use crate::ledger::{Bank, Book, LedgerKind, LedgerRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionTotals {
    pub total_gains: i64,
    pub total_expenses: i64,
    pub total_credits: i64,
    pub total_balance: i64,
}

impl ProjectionTotals {
    /// Hidden records never count.
    fn add(&mut self, record: &LedgerRecord) {
        if record.is_hidden {
            return;
        }
        match record.kind {
            LedgerKind::Expense => self.total_expenses += record.amount,
            LedgerKind::Gain => self.total_gains += record.amount,
            LedgerKind::Credit => self.total_credits += record.amount,
        }
        self.total_balance = self.total_gains - self.total_expenses - self.total_credits;
    }

    fn merge(&mut self, other: &Self) {
        self.total_gains += other.total_gains;
        self.total_expenses += other.total_expenses;
        self.total_credits += other.total_credits;
        self.total_balance = self.total_gains - self.total_expenses - self.total_credits;
    }

    fn is_zero(&self) -> bool {
        self.total_gains == 0 && self.total_expenses == 0 && self.total_credits == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProjection {
    pub month: MonthKey,
    pub expenses: i64,
    pub gains: i64,
    pub credits: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionSummary {
    pub start_month: MonthKey,
    pub end_month: MonthKey,
    pub months: u32,
    pub summary: ProjectionTotals,
    pub monthly_data: Vec<MonthlyProjection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedEntry {
    #[serde(flatten)]
    pub record: LedgerRecord,
    pub bank: Option<Bank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthDetail {
    pub month: MonthKey,
    pub expenses: Vec<ProjectedEntry>,
    pub gains: Vec<ProjectedEntry>,
    pub credits: Vec<ProjectedEntry>,
    pub totals: ProjectionTotals,
    pub hidden_count: usize,
}

/// Rolls projection-book records up into `months` buckets starting at
/// `start`. Months with nothing to show are left out of `monthly_data` but
/// the whole period still counts towards `summary`.
pub fn summarize_period(
    records: &[LedgerRecord],
    start: MonthKey,
    months: u32,
) -> ProjectionSummary {
    let span = i32::try_from(months.max(1)).unwrap_or(i32::MAX);
    let end = start.add_months(span - 1);

    let mut buckets: BTreeMap<MonthKey, ProjectionTotals> = BTreeMap::new();
    for record in records.iter().filter(|record| record.book == Book::Projection) {
        let month = MonthKey::of(record.expiration_date);
        if month < start || month > end {
            continue;
        }
        buckets.entry(month).or_default().add(record);
    }

    let mut summary = ProjectionTotals::default();
    let mut monthly_data = Vec::new();
    for (month, totals) in &buckets {
        summary.merge(totals);
        if totals.is_zero() {
            continue;
        }
        monthly_data.push(MonthlyProjection {
            month: *month,
            expenses: totals.total_expenses,
            gains: totals.total_gains,
            credits: totals.total_credits,
            balance: totals.total_balance,
        });
    }

    ProjectionSummary {
        start_month: start,
        end_month: end,
        months: months.max(1),
        summary,
        monthly_data,
    }
}

/// Lists the projection records of `month` that are still ahead of the
/// current month, newest first and split by kind.
pub fn month_details(
    records: &[LedgerRecord],
    banks: &[Bank],
    month: MonthKey,
    today: NaiveDate,
) -> MonthDetail {
    let floor = MonthKey::of(today).first_day();
    let banks_by_id = banks
        .iter()
        .map(|bank| (bank.bank_id.as_str(), bank))
        .collect::<HashMap<_, _>>();

    let mut selected = records
        .iter()
        .filter(|record| record.book == Book::Projection)
        .filter(|record| month.contains(record.expiration_date))
        .filter(|record| record.expiration_date >= floor)
        .collect::<Vec<_>>();
    selected.sort_by(|left, right| {
        right
            .expiration_date
            .cmp(&left.expiration_date)
            .then_with(|| right.record_id.cmp(&left.record_id))
    });

    let mut detail = MonthDetail {
        month,
        expenses: Vec::new(),
        gains: Vec::new(),
        credits: Vec::new(),
        totals: ProjectionTotals::default(),
        hidden_count: 0,
    };
    for record in selected {
        detail.totals.add(record);
        if record.is_hidden {
            detail.hidden_count += 1;
        }
        let entry = ProjectedEntry {
            record: record.clone(),
            bank: record
                .bank_id
                .as_deref()
                .and_then(|bank_id| banks_by_id.get(bank_id))
                .map(|bank| (*bank).clone()),
        };
        match record.kind {
            LedgerKind::Expense => detail.expenses.push(entry),
            LedgerKind::Gain => detail.gains.push(entry),
            LedgerKind::Credit => detail.credits.push(entry),
        }
    }
    detail
}
