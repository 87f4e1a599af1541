use std::collections::BTreeMap;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::ClientResult;
use crate::ledger::Bill;
use crate::ledger::period::MonthKey;
use crate::store::{BillFilter, BillRepository};

pub fn new_bill_id() -> String {
    format!("bill_{}", Ulid::new())
}

pub fn new_series_id() -> String {
    format!("ser_{}", Ulid::new())
}

/// The period the generator fills when the caller does not name one.
pub fn default_target_period(today: NaiveDate) -> MonthKey {
    MonthKey::of(today).next()
}

/// Latest occurrence of every bill series at or before `target`, active
/// series only.
pub fn select_templates(bills: &[Bill], target: MonthKey) -> Vec<&Bill> {
    let mut latest: BTreeMap<&str, &Bill> = BTreeMap::new();
    for bill in bills.iter().filter(|bill| bill.period <= target) {
        latest
            .entry(bill.series_id.as_str())
            .and_modify(|current| {
                if bill.period > current.period {
                    *current = bill;
                }
            })
            .or_insert(bill);
    }

    latest.into_values().filter(|bill| bill.active).collect()
}

/// Occurrences `templates` would produce for `target`. Series whose latest
/// occurrence already sits in `target` produce nothing.
pub fn plan_occurrences(templates: &[&Bill], target: MonthKey) -> Vec<Bill> {
    templates
        .iter()
        .filter(|template| template.period != target)
        .map(|template| Bill {
            bill_id: new_bill_id(),
            series_id: template.series_id.clone(),
            organization_id: template.organization_id.clone(),
            description: template.description.clone(),
            company: template.company.clone(),
            category: template.category.clone(),
            amount: template.amount,
            day_of_month: template.day_of_month,
            period: target,
            expiration_date: target.clamp_day(template.day_of_month),
            active: template.active,
            paid: false,
            source_transaction_id: template.source_transaction_id.clone(),
        })
        .collect()
}

/// Materializes the `target` occurrence (next month by default) of every
/// active standing bill and returns only the occurrences it created.
///
/// Each insert is conditional on the occurrence being absent, so overlapping
/// runs for the same organization and period never duplicate a bill.
pub fn generate_monthly_bills<R>(
    repository: &R,
    organization_id: &str,
    target: Option<MonthKey>,
    today: NaiveDate,
) -> ClientResult<Vec<Bill>>
where
    R: BillRepository + ?Sized,
{
    let target = target.unwrap_or_else(|| default_target_period(today));
    let history = repository.search_many(
        organization_id,
        &BillFilter {
            until_period: Some(target),
            ..BillFilter::default()
        },
    )?;

    let templates = select_templates(&history, target);
    let mut created = Vec::new();
    for occurrence in plan_occurrences(&templates, target) {
        if repository.insert_if_absent(&occurrence)? {
            created.push(occurrence);
        }
    }

    tracing::info!(
        organization_id,
        period = %target,
        templates = templates.len(),
        created = created.len(),
        "monthly bills generated"
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use crate::ledger::period::{MonthKey, format_iso_date};
    use crate::ledger::{Bill, BillUpdate};
    use crate::store::{BillFilter, BillRepository};
    use crate::{ClientError, ClientResult};

    use super::{generate_monthly_bills, plan_occurrences, select_templates};

    #[derive(Default)]
    struct MemoryBills {
        rows: RefCell<Vec<Bill>>,
    }

    impl BillRepository for MemoryBills {
        fn search_many(&self, organization_id: &str, filter: &BillFilter) -> ClientResult<Vec<Bill>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|bill| bill.organization_id == organization_id)
                .filter(|bill| filter.until_period.is_none_or(|until| bill.period <= until))
                .filter(|bill| filter.period.is_none_or(|period| bill.period == period))
                .filter(|bill| {
                    filter
                        .series_id
                        .as_deref()
                        .is_none_or(|series_id| bill.series_id == series_id)
                })
                .cloned()
                .collect())
        }

        fn insert_if_absent(&self, bill: &Bill) -> ClientResult<bool> {
            let mut rows = self.rows.borrow_mut();
            let exists = rows.iter().any(|row| {
                row.organization_id == bill.organization_id
                    && row.series_id == bill.series_id
                    && row.period == bill.period
            });
            if exists {
                return Ok(false);
            }
            rows.push(bill.clone());
            Ok(true)
        }

        fn update(&self, _: &str, bill_id: &str, _: &BillUpdate) -> ClientResult<Bill> {
            Err(ClientError::bill_not_found(bill_id))
        }

        fn delete(&self, _: &str, bill_id: &str) -> ClientResult<()> {
            Err(ClientError::bill_not_found(bill_id))
        }
    }

    fn month(value: &str) -> MonthKey {
        MonthKey::parse(value).unwrap_or_else(|| panic!("bad fixture month {value}"))
    }

    fn bill(description: &str, day: u32, period: &str, active: bool) -> Bill {
        let period = month(period);
        Bill {
            bill_id: format!("bill_{description}_{period}"),
            series_id: format!("ser_{description}"),
            organization_id: "org_test".to_string(),
            description: description.to_string(),
            company: String::new(),
            category: "Contas".to_string(),
            amount: 12_000,
            day_of_month: day,
            period,
            expiration_date: period.clamp_day(day),
            active,
            paid: true,
            source_transaction_id: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap_or(NaiveDate::MIN)
    }

    #[test]
    fn templates_are_latest_active_occurrence_per_series() {
        let bills = vec![
            bill("Internet", 10, "2024-11", true),
            bill("Internet", 10, "2024-12", true),
            bill("Academia", 5, "2024-12", false),
            bill("Aluguel", 1, "2025-03", true),
        ];
        let templates = select_templates(&bills, month("2025-01"));
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].period, month("2024-12"));
    }

    #[test]
    fn a_moved_due_day_stays_in_its_series() {
        let mut moved = bill("Internet", 15, "2025-07", true);
        moved.series_id = "ser_Internet".to_string();
        let bills = vec![bill("Internet", 10, "2025-06", true), moved];

        let templates = select_templates(&bills, month("2025-08"));
        assert_eq!(templates.len(), 1);
        let planned = plan_occurrences(&templates, month("2025-08"));
        assert_eq!(planned.len(), 1);
        assert_eq!(format_iso_date(&planned[0].expiration_date), "2025-08-15");
        assert_eq!(planned[0].series_id, "ser_Internet");
    }

    #[test]
    fn occurrences_clamp_day_to_target_month() {
        let bills = vec![bill("Condominio", 31, "2025-01", true)];
        let templates = select_templates(&bills, month("2025-02"));
        let planned = plan_occurrences(&templates, month("2025-02"));
        assert_eq!(planned.len(), 1);
        assert_eq!(format_iso_date(&planned[0].expiration_date), "2025-02-28");
        assert!(!planned[0].paid);
        assert_eq!(planned[0].day_of_month, 31);
    }

    #[test]
    fn generation_defaults_to_next_month_and_is_idempotent() {
        let repository = MemoryBills::default();
        repository
            .rows
            .borrow_mut()
            .push(bill("Internet", 15, "2025-01", true));

        let first = generate_monthly_bills(&repository, "org_test", None, today());
        assert!(first.is_ok());
        if let Ok(created) = first {
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].period, month("2025-02"));
            assert_eq!(format_iso_date(&created[0].expiration_date), "2025-02-15");
        }

        let second = generate_monthly_bills(&repository, "org_test", None, today());
        assert!(second.is_ok());
        if let Ok(created) = second {
            assert!(created.is_empty());
        }
        assert_eq!(repository.rows.borrow().len(), 2);
    }

    #[test]
    fn deactivated_series_stop_generating() {
        let repository = MemoryBills::default();
        {
            let mut rows = repository.rows.borrow_mut();
            rows.push(bill("Academia", 5, "2024-12", true));
            rows.push(bill("Academia", 5, "2025-01", false));
        }

        let result = generate_monthly_bills(&repository, "org_test", Some(month("2025-02")), today());
        assert!(result.is_ok());
        if let Ok(created) = result {
            assert!(created.is_empty());
        }
    }

    #[test]
    fn other_organizations_are_untouched() {
        let repository = MemoryBills::default();
        repository
            .rows
            .borrow_mut()
            .push(bill("Internet", 15, "2025-01", true));

        let result = generate_monthly_bills(&repository, "org_other", None, today());
        assert!(result.is_ok());
        if let Ok(created) = result {
            assert!(created.is_empty());
        }
    }
}
