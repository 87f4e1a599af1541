use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::commands::common::{
    open_scoped_context, require_text, validate_day_of_month, validate_month_count,
};
use crate::commands::recurring::detect_in_window;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    BillData, BillGenerateData, BillListData, BillSuggestData, BillSuggestion, DeletedData,
};
use crate::engine::bills::{
    default_target_period, generate_monthly_bills, new_bill_id, new_series_id,
};
use crate::engine::category::normalize_category;
use crate::engine::recurrence::{RecurringFlow, lookback_window};
use crate::ledger::period::{MonthKey, parse_month_arg};
use crate::ledger::{Bill, BillUpdate};
use crate::store::{BillFilter, BillRepository, LedgerRepository, SqliteStore};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct BillListOptions<'a> {
    pub organization_id: String,
    /// `YYYY-MM`; defaults to the current month.
    pub period: Option<String>,
    pub paid: Option<bool>,
    pub today: Option<NaiveDate>,
    pub home_override: Option<&'a Path>,
}

/// Lists the bills of one period. A period with no bills at all is filled
/// by the generator first, unless the caller only asked for paid bills.
#[doc(hidden)]
pub fn list_with_options(options: BillListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "bills list";
    let requested = options
        .period
        .as_deref()
        .map(|value| parse_month_arg(value, "period", COMMAND))
        .transpose()?;
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let organization_id = organization.organization_id;
    let period = requested.unwrap_or_else(|| MonthKey::of(context.today));

    let mut generated = 0;
    if options.paid != Some(true) {
        let existing = BillRepository::search_many(
            &context.store,
            &organization_id,
            &BillFilter {
                period: Some(period),
                ..BillFilter::default()
            },
        )?;
        if existing.is_empty() {
            generated =
                generate_monthly_bills(&context.store, &organization_id, Some(period), context.today)?
                    .len();
        }
    }

    let bills = BillRepository::search_many(
        &context.store,
        &organization_id,
        &BillFilter {
            period: Some(period),
            paid: options.paid,
            ..BillFilter::default()
        },
    )?;

    success(
        COMMAND,
        BillListData {
            organization_id,
            period,
            generated,
            bills,
        },
    )
}

#[derive(Debug, Default)]
pub struct BillCreateOptions<'a> {
    pub organization_id: String,
    pub description: String,
    pub company: Option<String>,
    pub category: Option<String>,
    pub amount: i64,
    pub day_of_month: u32,
    /// `YYYY-MM`; defaults to the current month.
    pub period: Option<String>,
    pub today: Option<NaiveDate>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn create_with_options(options: BillCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "bills create";
    let description = require_text(&options.description, "description", COMMAND)?;
    let day_of_month = validate_day_of_month(options.day_of_month, COMMAND)?;
    if options.amount < 0 {
        return Err(ClientError::invalid_argument_for_command(
            "`amount` must not be negative.",
            Some(COMMAND),
        ));
    }
    let requested = options
        .period
        .as_deref()
        .map(|value| parse_month_arg(value, "period", COMMAND))
        .transpose()?;

    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let period = requested.unwrap_or_else(|| MonthKey::of(context.today));
    let bill = Bill {
        bill_id: new_bill_id(),
        series_id: new_series_id(),
        organization_id: organization.organization_id,
        category: normalize_category(options.category.as_deref(), Some(&description)),
        description,
        company: options.company.unwrap_or_default().trim().to_string(),
        amount: options.amount,
        day_of_month,
        period,
        expiration_date: period.clamp_day(day_of_month),
        active: true,
        paid: false,
        source_transaction_id: None,
    };

    insert_new_bill(&context.store, &bill, COMMAND)?;
    success(COMMAND, BillData { bill })
}

#[derive(Debug, Default)]
pub struct BillFromTransactionOptions<'a> {
    pub organization_id: String,
    pub record_id: String,
    /// Defaults to the source record's day of month.
    pub day_of_month: Option<u32>,
    /// `YYYY-MM`; defaults to the current month.
    pub period: Option<String>,
    pub today: Option<NaiveDate>,
    pub home_override: Option<&'a Path>,
}

/// Promotes a (usually detected-recurring) transaction to a standing bill.
/// Each transaction can back at most one bill.
#[doc(hidden)]
pub fn from_transaction_with_options(
    options: BillFromTransactionOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "bills from-transaction";
    let requested = options
        .period
        .as_deref()
        .map(|value| parse_month_arg(value, "period", COMMAND))
        .transpose()?;
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let organization_id = organization.organization_id;
    let source = context.store.find(&organization_id, &options.record_id)?;

    let existing = BillRepository::search_many(
        &context.store,
        &organization_id,
        &BillFilter {
            source_transaction_id: Some(source.record_id.clone()),
            ..BillFilter::default()
        },
    )?;
    if let Some(bill) = existing.first() {
        return Err(ClientError::duplicate_bill_source(
            &source.record_id,
            &bill.bill_id,
        ));
    }

    let day_of_month = validate_day_of_month(
        options
            .day_of_month
            .unwrap_or_else(|| source.expiration_date.day()),
        COMMAND,
    )?;
    let period = requested.unwrap_or_else(|| MonthKey::of(context.today));
    let bill = Bill {
        bill_id: new_bill_id(),
        series_id: new_series_id(),
        organization_id,
        description: source.description.clone(),
        company: source.company.clone().unwrap_or_default(),
        category: source.category.clone(),
        amount: source.amount,
        day_of_month,
        period,
        expiration_date: period.clamp_day(day_of_month),
        active: true,
        paid: false,
        source_transaction_id: Some(source.record_id),
    };

    insert_new_bill(&context.store, &bill, COMMAND)?;
    success(COMMAND, BillData { bill })
}

#[derive(Debug, Default)]
pub struct BillSuggestOptions<'a> {
    pub organization_id: String,
    /// Defaults to the configured bill-inference window.
    pub window_months: Option<u32>,
    pub bank_id: Option<String>,
    pub today: Option<NaiveDate>,
    pub home_override: Option<&'a Path>,
}

/// Recurring outflows from the recent window, shaped as bill candidates.
#[doc(hidden)]
pub fn suggest_with_options(options: BillSuggestOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "bills suggest";
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let organization_id = organization.organization_id;
    let window_months = validate_month_count(
        options
            .window_months
            .unwrap_or(context.settings.bill_inference_window_months),
        COMMAND,
    )?;
    if let Some(bank_id) = options.bank_id.as_deref() {
        context.store.require_bank(&organization_id, bank_id)?;
    }

    let patterns = detect_in_window(
        &context.store,
        &organization_id,
        RecurringFlow::Outflow,
        options.bank_id.as_deref(),
        lookback_window(context.today, window_months),
    )?;
    let tracked = BillRepository::search_many(&context.store, &organization_id, &BillFilter::default())?;

    let suggestions = patterns
        .into_iter()
        .map(|pattern| {
            let record = pattern.representative;
            let company = record.company.unwrap_or_default();
            let already_tracked = tracked.iter().any(|bill| {
                bill.source_transaction_id.as_deref() == Some(record.record_id.as_str())
                    || (bill.description == record.description && bill.company == company)
            });
            BillSuggestion {
                source_transaction_id: record.record_id,
                description: record.description,
                company,
                category: record.category,
                amount: record.amount,
                day_of_month: pattern.majority_day,
                recurrence_count: pattern.recurrence_count,
                months: pattern.months,
                already_tracked,
            }
        })
        .collect::<Vec<_>>();

    success(
        COMMAND,
        BillSuggestData {
            organization_id,
            window_months,
            suggestions,
        },
    )
}

#[derive(Debug, Default)]
pub struct BillGenerateOptions<'a> {
    pub organization_id: String,
    /// `YYYY-MM`; defaults to next month.
    pub period: Option<String>,
    pub today: Option<NaiveDate>,
    pub home_override: Option<&'a Path>,
}

/// Entry point for schedulers; safe to run any number of times per period.
#[doc(hidden)]
pub fn generate_with_options(options: BillGenerateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "bills generate";
    let requested = options
        .period
        .as_deref()
        .map(|value| parse_month_arg(value, "period", COMMAND))
        .transpose()?;
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let period = requested.unwrap_or_else(|| default_target_period(context.today));
    let created = generate_monthly_bills(
        &context.store,
        &organization.organization_id,
        Some(period),
        context.today,
    )?;

    success(
        COMMAND,
        BillGenerateData {
            organization_id: organization.organization_id,
            period,
            created,
        },
    )
}

#[derive(Debug, Default)]
pub struct BillChangeOptions<'a> {
    pub organization_id: String,
    pub bill_id: String,
    pub update: BillUpdate,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn pay_with_options(
    organization_id: &str,
    bill_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (context, organization) = open_scoped_context(home_override, None, organization_id)?;
    let bill = BillRepository::update(
        &context.store,
        &organization.organization_id,
        bill_id,
        &BillUpdate {
            paid: Some(true),
            ..BillUpdate::default()
        },
    )?;
    tracing::info!(bill_id = %bill.bill_id, period = %bill.period, "bill paid");
    success("bills pay", BillData { bill })
}

#[doc(hidden)]
pub fn update_with_options(options: BillChangeOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "bills update";
    let mut update = options.update;
    if update.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pass at least one field to change.",
            Some(COMMAND),
        ));
    }
    if let Some(day) = update.day_of_month {
        validate_day_of_month(day, COMMAND)?;
    }
    if let Some(description) = update.description.as_deref() {
        update.description = Some(require_text(description, "description", COMMAND)?);
    }
    if update.amount.is_some_and(|amount| amount < 0) {
        return Err(ClientError::invalid_argument_for_command(
            "`amount` must not be negative.",
            Some(COMMAND),
        ));
    }

    let (context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    let organization_id = organization.organization_id;
    if let Some(category) = update.category.as_deref() {
        let current = context.store.find_bill(&organization_id, &options.bill_id)?;
        let description = update.description.as_deref().unwrap_or(&current.description);
        update.category = Some(normalize_category(Some(category), Some(description)));
    }

    let bill = BillRepository::update(&context.store, &organization_id, &options.bill_id, &update)?;
    tracing::info!(bill_id = %bill.bill_id, "bill updated");
    success(COMMAND, BillData { bill })
}

#[doc(hidden)]
pub fn delete_with_options(
    organization_id: &str,
    bill_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (context, organization) = open_scoped_context(home_override, None, organization_id)?;
    BillRepository::delete(&context.store, &organization.organization_id, bill_id)?;
    tracing::info!(bill_id, "bill deleted");
    success(
        "bills delete",
        DeletedData {
            id: bill_id.to_string(),
            deleted: 1,
        },
    )
}

fn insert_new_bill(store: &SqliteStore, bill: &Bill, command: &str) -> ClientResult<()> {
    if !store.insert_if_absent(bill)? {
        return Err(ClientError::invalid_argument_for_command(
            &format!(
                "A bill `{}` due on day {} already exists for {}.",
                bill.description, bill.day_of_month, bill.period
            ),
            Some(command),
        ));
    }
    tracing::info!(
        organization_id = %bill.organization_id,
        bill_id = %bill.bill_id,
        period = %bill.period,
        "bill created"
    );
    Ok(())
}
