use serde::{Deserialize, Serialize};

use crate::engine::projection::{MonthDetail, ProjectionSummary};
use crate::ledger::period::MonthKey;
use crate::ledger::{Bank, Bill, LedgerRecord, Organization};

/// One element of the JSON array accepted by `txn create`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftInput {
    pub kind: String,
    pub book: Option<String>,
    pub description: String,
    pub company: Option<String>,
    pub company_override: Option<String>,
    pub category: Option<String>,
    pub amount: Option<i64>,
    pub expiration_date: String,
    pub purchase_date: Option<String>,
    pub balance_close_date: Option<String>,
    pub type_payment: Option<String>,
    pub installment_total_payment: Option<u32>,
    pub paid: bool,
    pub is_hidden: bool,
    pub bank_id: Option<String>,
    pub bank_type_account_id: Option<String>,
    pub external_transaction_id: Option<String>,
    pub group_installment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationData {
    pub organization: Organization,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationListData {
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankData {
    pub bank: Bank,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankListData {
    pub organization_id: String,
    pub banks: Vec<Bank>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionCreateData {
    pub organization_id: String,
    pub source: String,
    pub drafts: usize,
    pub planned: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub records: Vec<LedgerRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionListData {
    pub organization_id: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub count: usize,
    pub records: Vec<LedgerRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionData {
    pub record: LedgerRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedData {
    pub id: String,
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupChangeData {
    pub group_installment_id: String,
    pub affected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringData {
    pub organization_id: String,
    pub flow: String,
    pub window_months: u32,
    pub from: String,
    pub to: String,
    pub bank_id: Option<String>,
    pub rows: Vec<RecurringRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringRow {
    pub record_id: String,
    pub description: String,
    pub category: String,
    pub company: Option<String>,
    pub kind: String,
    pub amount: i64,
    pub last_seen_at: String,
    pub majority_day: u32,
    pub recurrence_count: usize,
    pub occurrence_count: usize,
    pub months: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillListData {
    pub organization_id: String,
    pub period: MonthKey,
    /// Occurrences the lazy generator created while serving this read.
    pub generated: usize,
    pub bills: Vec<Bill>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillData {
    pub bill: Bill,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillGenerateData {
    pub organization_id: String,
    pub period: MonthKey,
    pub created: Vec<Bill>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillSuggestion {
    pub source_transaction_id: String,
    pub description: String,
    pub company: String,
    pub category: String,
    pub amount: i64,
    pub day_of_month: u32,
    pub recurrence_count: usize,
    pub months: Vec<String>,
    pub already_tracked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillSuggestData {
    pub organization_id: String,
    pub window_months: u32,
    pub suggestions: Vec<BillSuggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionSummaryData {
    pub organization_id: String,
    #[serde(flatten)]
    pub projection: ProjectionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionMonthData {
    pub organization_id: String,
    #[serde(flatten)]
    pub detail: MonthDetail,
}
