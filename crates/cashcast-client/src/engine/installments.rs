use ulid::Ulid;

use crate::engine::category::normalize_category;
use crate::ledger::period::add_months_clamped;
use crate::ledger::{LedgerRecord, PaymentType, TransactionDraft};

const COMPANY_SEPARATOR: &str = " -";

pub fn new_record_id() -> String {
    format!("rec_{}", Ulid::new())
}

pub fn new_group_id() -> String {
    format!("grp_{}", Ulid::new())
}

/// Expands one draft into the ledger records it stands for.
///
/// Drafts without a positive installment count, or that come from a bank
/// feed, produce a single record. Otherwise the draft produces one record per
/// month starting at its expiration date, all sharing one group id.
pub fn expand(draft: &TransactionDraft) -> Vec<LedgerRecord> {
    let total = draft.installment_total_payment.unwrap_or(0);
    if total == 0 || draft.external_transaction_id.is_some() {
        return vec![single_record(draft)];
    }

    let category = normalize_category(draft.category.as_deref(), Some(&draft.description));
    let group_id = draft
        .group_installment_id
        .clone()
        .unwrap_or_else(new_group_id);
    let amounts = apportion(draft.amount, total, &draft.type_payment);
    let company = draft
        .company_override
        .clone()
        .or_else(|| draft.company.clone());

    amounts
        .into_iter()
        .enumerate()
        .map(|(index, amount)| {
            let offset = i32::try_from(index).unwrap_or(i32::MAX);
            LedgerRecord {
                record_id: new_record_id(),
                organization_id: draft.organization_id.clone(),
                kind: draft.kind,
                book: draft.book,
                description: draft.description.clone(),
                company: company.clone(),
                category: category.clone(),
                amount,
                expiration_date: add_months_clamped(draft.expiration_date, offset),
                purchase_date: draft.purchase_date,
                balance_close_date: draft.balance_close_date,
                type_payment: draft.type_payment.clone(),
                installment_current: Some(u32::try_from(index + 1).unwrap_or(u32::MAX)),
                installment_total_payment: Some(total),
                group_installment_id: Some(group_id.clone()),
                paid: index == 0 && draft.paid,
                is_hidden: draft.is_hidden,
                bank_id: draft.bank_id.clone(),
                bank_type_account_id: draft.bank_type_account_id.clone(),
                external_transaction_id: None,
                repeat_index: 0,
            }
        })
        .collect()
}

fn single_record(draft: &TransactionDraft) -> LedgerRecord {
    let company = match &draft.company_override {
        Some(explicit) => Some(explicit.clone()),
        None => {
            let base = draft.company.as_deref().unwrap_or(&draft.description);
            truncate_company(base)
        }
    };

    LedgerRecord {
        record_id: new_record_id(),
        organization_id: draft.organization_id.clone(),
        kind: draft.kind,
        book: draft.book,
        description: draft.description.clone(),
        company,
        category: normalize_category(draft.category.as_deref(), Some(&draft.description)),
        amount: draft.amount,
        expiration_date: draft.expiration_date,
        purchase_date: draft.purchase_date,
        balance_close_date: draft.balance_close_date,
        type_payment: draft.type_payment.clone(),
        installment_current: None,
        installment_total_payment: None,
        group_installment_id: draft.group_installment_id.clone(),
        paid: draft.paid,
        is_hidden: draft.is_hidden,
        bank_id: draft.bank_id.clone(),
        bank_type_account_id: draft.bank_type_account_id.clone(),
        external_transaction_id: draft.external_transaction_id.clone(),
        repeat_index: 0,
    }
}

fn truncate_company(value: &str) -> Option<String> {
    let head = match value.find(COMPANY_SEPARATOR) {
        Some(position) => &value[..position],
        None => value,
    };
    let trimmed = head.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Installment charges split evenly with the remainder on the last period;
/// every other payment type repeats the full amount.
fn apportion(amount: i64, total: u32, type_payment: &PaymentType) -> Vec<i64> {
    let count = usize::try_from(total).unwrap_or(0);
    if !matches!(type_payment, PaymentType::Installment) {
        return vec![amount; count];
    }

    let divisor = i64::from(total);
    let base = amount / divisor;
    let remainder = amount - base * divisor;
    let mut amounts = vec![base; count];
    if let Some(last) = amounts.last_mut() {
        *last += remainder;
    }
    amounts
}
