use std::path::Path;

use chrono::NaiveDate;

use crate::ClientResult;
use crate::commands::common::{open_scoped_context, parse_flow_arg, validate_month_count};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{RecurringData, RecurringRow};
use crate::engine::recurrence::{RecurringFlow, RecurringPattern, detect_recurring, lookback_window};
use crate::ledger::Book;
use crate::ledger::period::format_iso_date;
use crate::store::{LedgerRepository, RecordFilter, SqliteStore};

const COMMAND: &str = "recurring";

#[derive(Debug, Default)]
pub struct RecurringRunOptions<'a> {
    pub organization_id: String,
    /// Defaults to the configured recurring window.
    pub window_months: Option<u32>,
    pub bank_id: Option<String>,
    /// `outflow` (default) or `inflow`.
    pub flow: Option<String>,
    pub today: Option<NaiveDate>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn run_with_options(options: RecurringRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let flow = match options.flow.as_deref() {
        Some(value) => parse_flow_arg(value, COMMAND)?,
        None => RecurringFlow::Outflow,
    };
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let window_months = validate_month_count(
        options
            .window_months
            .unwrap_or(context.settings.recurring_window_months),
        COMMAND,
    )?;
    if let Some(bank_id) = options.bank_id.as_deref() {
        context
            .store
            .require_bank(&organization.organization_id, bank_id)?;
    }

    let (from, to) = lookback_window(context.today, window_months);
    let patterns = detect_in_window(
        &context.store,
        &organization.organization_id,
        flow,
        options.bank_id.as_deref(),
        (from, to),
    )?;

    let rows = patterns
        .iter()
        .map(|pattern| RecurringRow {
            record_id: pattern.representative.record_id.clone(),
            description: pattern.representative.description.clone(),
            category: pattern.representative.category.clone(),
            company: pattern.representative.company.clone(),
            kind: pattern.representative.kind.as_str().to_string(),
            amount: pattern.representative.amount,
            last_seen_at: format_iso_date(&pattern.representative.expiration_date),
            majority_day: pattern.majority_day,
            recurrence_count: pattern.recurrence_count,
            occurrence_count: pattern.occurrence_count,
            months: pattern.months.clone(),
        })
        .collect::<Vec<RecurringRow>>();

    let data = RecurringData {
        organization_id: organization.organization_id,
        flow: flow.as_str().to_string(),
        window_months,
        from: format_iso_date(&from),
        to: format_iso_date(&to),
        bank_id: options.bank_id,
        rows,
    };

    success(COMMAND, data)
}

/// Settled records of `flow` inside `window`, run through the detector.
pub(crate) fn detect_in_window(
    store: &SqliteStore,
    organization_id: &str,
    flow: RecurringFlow,
    bank_id: Option<&str>,
    window: (NaiveDate, NaiveDate),
) -> ClientResult<Vec<RecurringPattern>> {
    let filter = RecordFilter {
        kinds: flow.kinds().to_vec(),
        book: Some(Book::Ledger),
        bank_id: bank_id.map(str::to_string),
        from: Some(window.0),
        to: Some(window.1),
        group_installment_id: None,
    };
    let records = LedgerRepository::search_many(store, organization_id, &filter)?;
    let patterns = detect_recurring(&records);
    tracing::debug!(
        organization_id,
        flow = flow.as_str(),
        scanned = records.len(),
        patterns = patterns.len(),
        "recurrence detection finished"
    );
    Ok(patterns)
}
