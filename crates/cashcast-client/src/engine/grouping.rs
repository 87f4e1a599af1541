use std::collections::HashMap;

use crate::engine::category::normalize_category;
use crate::engine::installments::new_group_id;
use crate::ledger::{LedgerRecord, TransactionDraft};

/// Hands out one group id per recurring line (`description|category`).
#[derive(Debug, Default)]
pub struct GroupResolver {
    groups: HashMap<String, String>,
}

impl GroupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the groups of recurring records that already exist, so a
    /// line entered again joins its series instead of starting a new one.
    pub fn seeded<'a, I>(existing: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerRecord>,
    {
        let mut resolver = Self::new();
        for record in existing {
            if !record.type_payment.is_recurrent() {
                continue;
            }
            let Some(group_id) = &record.group_installment_id else {
                continue;
            };
            resolver
                .groups
                .entry(group_key(&record.description, &record.category))
                .or_insert_with(|| group_id.clone());
        }
        resolver
    }

    pub fn resolve(&mut self, description: &str, normalized_category: &str) -> String {
        self.groups
            .entry(group_key(description, normalized_category))
            .or_insert_with(new_group_id)
            .clone()
    }

    /// Fills in the group id of every recurrent draft that has none yet.
    pub fn assign(&mut self, drafts: &mut [TransactionDraft]) {
        for draft in drafts.iter_mut() {
            if !draft.type_payment.is_recurrent() || draft.group_installment_id.is_some() {
                continue;
            }
            let category = normalize_category(draft.category.as_deref(), Some(&draft.description));
            draft.group_installment_id = Some(self.resolve(&draft.description, &category));
        }
    }
}

fn group_key(description: &str, normalized_category: &str) -> String {
    format!("{description}|{normalized_category}")
}
