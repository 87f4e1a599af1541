use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::ledger::period::MonthKey;
use crate::ledger::{LedgerKind, LedgerRecord};

/// Lookback used to surface recurring transactions.
pub const RECURRING_WINDOW_MONTHS: u32 = 12;
/// Lookback used to infer bills from real transactions.
pub const BILL_INFERENCE_WINDOW_MONTHS: u32 = 5;

/// Which side of the ledger a detection run looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurringFlow {
    /// Expenses and credit-card charges.
    Outflow,
    Inflow,
}

impl RecurringFlow {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outflow => "outflow",
            Self::Inflow => "inflow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "outflow" | "expenses" | "expense" => Some(Self::Outflow),
            "inflow" | "gains" | "gain" => Some(Self::Inflow),
            _ => None,
        }
    }

    pub fn kinds(self) -> &'static [LedgerKind] {
        match self {
            Self::Outflow => &[LedgerKind::Expense, LedgerKind::Credit],
            Self::Inflow => &[LedgerKind::Gain],
        }
    }
}

/// Inclusive date range covered by a lookback of `months` ending at `today`.
pub fn lookback_window(today: NaiveDate, months: u32) -> (NaiveDate, NaiveDate) {
    let span = i32::try_from(months).unwrap_or(i32::MAX);
    let start = MonthKey::of(today).add_months(-span).first_day();
    (start, today)
}

#[derive(Debug, Clone)]
pub struct RecurringPattern {
    /// Most recent instance of the group.
    pub representative: LedgerRecord,
    /// Distinct calendar months the group touched.
    pub recurrence_count: usize,
    /// `YYYY/MM` labels, ascending.
    pub months: Vec<String>,
    pub majority_day: u32,
    pub occurrence_count: usize,
}

#[derive(Debug, Default)]
struct Cluster<'a> {
    rows: Vec<&'a LedgerRecord>,
    months: BTreeSet<MonthKey>,
    day_counts: BTreeMap<u32, usize>,
}

/// Finds `(description, category)` pairs that repeat across months on a
/// consistent day.
///
/// A group qualifies when it spans more than one month and one day-of-month
/// accounts for strictly more than half of its instances.
pub fn detect_recurring(records: &[LedgerRecord]) -> Vec<RecurringPattern> {
    let mut clusters: BTreeMap<String, Cluster<'_>> = BTreeMap::new();
    for record in records {
        let key = format!("{}|{}", record.description, record.category);
        let cluster = clusters.entry(key).or_default();
        cluster.rows.push(record);
        cluster.months.insert(MonthKey::of(record.expiration_date));
        *cluster
            .day_counts
            .entry(record.expiration_date.day())
            .or_insert(0) += 1;
    }

    let mut patterns: Vec<RecurringPattern> = Vec::new();
    for cluster in clusters.values() {
        if cluster.months.len() <= 1 {
            continue;
        }

        let Some(majority_day) = majority_day(&cluster.day_counts, cluster.rows.len()) else {
            continue;
        };

        let Some(representative) = cluster.rows.iter().copied().max_by(|left, right| {
            left.expiration_date
                .cmp(&right.expiration_date)
                .then_with(|| left.record_id.cmp(&right.record_id))
        }) else {
            continue;
        };

        patterns.push(RecurringPattern {
            representative: representative.clone(),
            recurrence_count: cluster.months.len(),
            months: cluster
                .months
                .iter()
                .map(|month| month.slash_label())
                .collect(),
            majority_day,
            occurrence_count: cluster.rows.len(),
        });
    }

    patterns.sort_by(compare_patterns);
    patterns
}

/// The day holding a strict majority of instances, if any.
fn majority_day(day_counts: &BTreeMap<u32, usize>, total: usize) -> Option<u32> {
    let (day, count) = day_counts
        .iter()
        .max_by(|left, right| left.1.cmp(right.1).then_with(|| right.0.cmp(left.0)))?;
    if count * 2 > total {
        return Some(*day);
    }
    None
}

fn compare_patterns(left: &RecurringPattern, right: &RecurringPattern) -> Ordering {
    right
        .recurrence_count
        .cmp(&left.recurrence_count)
        .then_with(|| {
            left.representative
                .description
                .cmp(&right.representative.description)
        })
        .then_with(|| {
            left.representative
                .category
                .cmp(&right.representative.category)
        })
}
