use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::ledger::period::MonthKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Expense,
    Gain,
    Credit,
}

impl LedgerKind {
    pub const ALL: [LedgerKind; 3] = [Self::Expense, Self::Gain, Self::Credit];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Gain => "gain",
            Self::Credit => "credit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" | "expenses" => Some(Self::Expense),
            "gain" | "gains" => Some(Self::Gain),
            "credit" | "credits" => Some(Self::Credit),
            _ => None,
        }
    }
}

/// Which book a record lives in: settled movements or forward planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Book {
    Ledger,
    Projection,
}

impl Book {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Projection => "projection",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ledger" => Some(Self::Ledger),
            "projection" | "projections" => Some(Self::Projection),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentType {
    Installment,
    Recurrent,
    /// Any plain one-off method label (`debit`, `pix`, `cash`, ...).
    OneOff(String),
}

impl PaymentType {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "installment" => Self::Installment,
            "recurrent" => Self::Recurrent,
            "" => Self::OneOff("single".to_string()),
            other => Self::OneOff(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Installment => "installment",
            Self::Recurrent => "recurrent",
            Self::OneOff(label) => label,
        }
    }

    pub fn is_recurrent(&self) -> bool {
        matches!(self, Self::Recurrent)
    }
}

impl Serialize for PaymentType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One persisted expense, gain or credit-card charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    pub record_id: String,
    pub organization_id: String,
    pub kind: LedgerKind,
    pub book: Book,
    pub description: String,
    pub company: Option<String>,
    pub category: String,
    pub amount: i64,
    pub expiration_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    pub balance_close_date: Option<NaiveDate>,
    pub type_payment: PaymentType,
    pub installment_current: Option<u32>,
    pub installment_total_payment: Option<u32>,
    pub group_installment_id: Option<String>,
    pub paid: bool,
    pub is_hidden: bool,
    pub bank_id: Option<String>,
    pub bank_type_account_id: Option<String>,
    pub external_transaction_id: Option<String>,
    /// Counts earlier identical records from the same ingest batch, so
    /// repeated lines in one batch are all kept.
    #[serde(skip)]
    pub repeat_index: u32,
}

impl LedgerRecord {
    /// Identity used by "skip duplicates" inserts: resubmitting the same
    /// logical record never creates a second row.
    pub fn dedupe_key(&self) -> String {
        let installment = match (self.installment_current, self.installment_total_payment) {
            (Some(current), Some(total)) => format!("{current}/{total}"),
            _ => String::new(),
        };
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.kind.as_str(),
            self.book.as_str(),
            self.description,
            self.category,
            self.amount,
            self.expiration_date.format("%Y-%m-%d"),
            self.type_payment.as_str(),
            installment,
            self.bank_id.as_deref().unwrap_or(""),
            self.external_transaction_id.as_deref().unwrap_or(""),
            self.repeat_index
        )
    }
}

/// A user-entered charge before expansion into ledger records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub organization_id: String,
    pub kind: LedgerKind,
    pub book: Book,
    pub description: String,
    pub company: Option<String>,
    /// Explicit company name that bypasses separator truncation.
    pub company_override: Option<String>,
    pub category: Option<String>,
    pub amount: i64,
    pub expiration_date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    pub balance_close_date: Option<NaiveDate>,
    pub type_payment: PaymentType,
    pub installment_total_payment: Option<u32>,
    pub paid: bool,
    pub is_hidden: bool,
    pub bank_id: Option<String>,
    pub bank_type_account_id: Option<String>,
    pub external_transaction_id: Option<String>,
    pub group_installment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub bill_id: String,
    /// Shared by every monthly occurrence of one standing bill.
    pub series_id: String,
    pub organization_id: String,
    pub description: String,
    pub company: String,
    pub category: String,
    pub amount: i64,
    pub day_of_month: u32,
    pub period: MonthKey,
    pub expiration_date: NaiveDate,
    pub active: bool,
    pub paid: bool,
    pub source_transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub organization_id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bank {
    pub bank_id: String,
    pub organization_id: String,
    pub name: String,
}

/// Field-by-field change request; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRecordUpdate {
    pub description: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub amount: Option<i64>,
    pub expiration_date: Option<NaiveDate>,
    pub paid: Option<bool>,
    pub is_hidden: Option<bool>,
    pub bank_id: Option<String>,
}

impl LedgerRecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.company.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.expiration_date.is_none()
            && self.paid.is_none()
            && self.is_hidden.is_none()
            && self.bank_id.is_none()
    }

    pub fn apply(&self, record: &mut LedgerRecord) {
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(company) = &self.company {
            record.company = Some(company.clone());
        }
        if let Some(category) = &self.category {
            record.category = category.clone();
        }
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(expiration_date) = self.expiration_date {
            record.expiration_date = expiration_date;
        }
        if let Some(paid) = self.paid {
            record.paid = paid;
        }
        if let Some(is_hidden) = self.is_hidden {
            record.is_hidden = is_hidden;
        }
        if let Some(bank_id) = &self.bank_id {
            record.bank_id = Some(bank_id.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillUpdate {
    pub description: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub amount: Option<i64>,
    pub day_of_month: Option<u32>,
    pub active: Option<bool>,
    pub paid: Option<bool>,
}

impl BillUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.company.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.day_of_month.is_none()
            && self.active.is_none()
            && self.paid.is_none()
    }

    /// The part of a change that also rewrites later occurrences of the
    /// series. `paid` belongs to a single period and never carries.
    pub fn carried_forward(&self) -> BillUpdate {
        BillUpdate {
            paid: None,
            ..self.clone()
        }
    }

    pub fn apply(&self, bill: &mut Bill) {
        if let Some(description) = &self.description {
            bill.description = description.clone();
        }
        if let Some(company) = &self.company {
            bill.company = company.clone();
        }
        if let Some(category) = &self.category {
            bill.category = category.clone();
        }
        if let Some(amount) = self.amount {
            bill.amount = amount;
        }
        if let Some(day_of_month) = self.day_of_month {
            bill.day_of_month = day_of_month;
            bill.expiration_date = bill.period.clamp_day(day_of_month);
        }
        if let Some(active) = self.active {
            bill.active = active;
        }
        if let Some(paid) = self.paid {
            bill.paid = paid;
        }
    }
}
