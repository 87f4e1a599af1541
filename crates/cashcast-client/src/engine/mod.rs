pub mod bills;
pub mod category;
pub mod grouping;
pub mod installments;
pub mod projection;
pub mod recurrence;

use std::collections::BTreeMap;

use crate::engine::grouping::GroupResolver;
use crate::engine::installments::expand;
use crate::ledger::{LedgerRecord, TransactionDraft};

/// Turns one ingest batch into the records to persist: recurring drafts are
/// grouped (joining series already in `existing`), then every draft is
/// expanded with its category normalized. Identical records within the batch
/// are numbered so each one survives the duplicate check.
pub fn plan_ingest(mut drafts: Vec<TransactionDraft>, existing: &[LedgerRecord]) -> Vec<LedgerRecord> {
    GroupResolver::seeded(existing).assign(&mut drafts);
    let mut records = drafts.iter().flat_map(expand).collect::<Vec<_>>();
    number_repeats(&mut records);
    records
}

fn number_repeats(records: &mut [LedgerRecord]) {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    for record in records {
        let count = seen.entry(record.dedupe_key()).or_default();
        record.repeat_index = *count;
        *count += 1;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::ledger::{Book, LedgerKind, PaymentType, TransactionDraft};

    use super::plan_ingest;

    fn draft(description: &str, type_payment: &str, total: Option<u32>) -> TransactionDraft {
        TransactionDraft {
            organization_id: "org_test".to_string(),
            kind: LedgerKind::Expense,
            book: Book::Projection,
            description: description.to_string(),
            company: None,
            company_override: None,
            category: Some("Utilities".to_string()),
            amount: 120_000,
            expiration_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap_or(NaiveDate::MIN),
            purchase_date: None,
            balance_close_date: None,
            type_payment: PaymentType::parse(type_payment),
            installment_total_payment: total,
            paid: true,
            is_hidden: false,
            bank_id: None,
            bank_type_account_id: None,
            external_transaction_id: None,
            group_installment_id: None,
        }
    }

    #[test]
    fn batch_of_mixed_drafts_expands_and_groups() {
        let records = plan_ingest(
            vec![
                draft("Energia", "recurrent", Some(2)),
                draft("Energia", "recurrent", Some(2)),
                draft("TV nova", "installment", Some(3)),
                draft("Padaria", "debit", None),
            ],
            &[],
        );
        assert_eq!(records.len(), 8);

        let energy_groups = records
            .iter()
            .filter(|record| record.description == "Energia")
            .filter_map(|record| record.group_installment_id.clone())
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(energy_groups.len(), 1);
        assert!(records.iter().all(|record| record.category == "Contas"));
    }

    #[test]
    fn identical_lines_in_one_batch_get_distinct_keys() {
        let records = plan_ingest(
            vec![
                draft("Cafe", "debit", None),
                draft("Cafe", "debit", None),
                draft("Padaria", "debit", None),
            ],
            &[],
        );
        let indexes = records
            .iter()
            .map(|record| record.repeat_index)
            .collect::<Vec<_>>();
        assert_eq!(indexes, vec![0, 1, 0]);
        assert_ne!(records[0].dedupe_key(), records[1].dedupe_key());

        let again = plan_ingest(vec![draft("Cafe", "debit", None)], &[]);
        assert_eq!(again[0].dedupe_key(), records[0].dedupe_key());
    }

    #[test]
    fn reentered_recurring_line_joins_existing_series() {
        let existing = plan_ingest(vec![draft("Energia", "recurrent", Some(1))], &[]);
        let again = plan_ingest(vec![draft("Energia", "recurrent", Some(1))], &existing);
        assert_eq!(
            existing[0].group_installment_id,
            again[0].group_installment_id
        );
    }
}
