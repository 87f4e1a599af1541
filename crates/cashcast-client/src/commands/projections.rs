use std::path::Path;

use chrono::NaiveDate;

use crate::ClientResult;
use crate::cache::{ResponseCache, projections_prefix};
use crate::commands::common::{open_scoped_context, validate_month_count};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ProjectionMonthData, ProjectionSummaryData};
use crate::engine::projection::{month_details, summarize_period};
use crate::ledger::Book;
use crate::ledger::period::{MonthKey, format_iso_date, parse_month_arg};
use crate::store::{LedgerRepository, RecordFilter};

const SUMMARY_COMMAND: &str = "projection summary";
const MONTH_COMMAND: &str = "projection month";

#[derive(Debug, Default)]
pub struct ProjectionSummaryOptions<'a> {
    pub organization_id: String,
    /// `YYYY-MM`; defaults to next month.
    pub start: Option<String>,
    /// Defaults to the configured projection length.
    pub months: Option<u32>,
    pub today: Option<NaiveDate>,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn summary_with_options(options: ProjectionSummaryOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let requested = options
        .start
        .as_deref()
        .map(|value| parse_month_arg(value, "start", SUMMARY_COMMAND))
        .transpose()?;
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let organization_id = organization.organization_id;
    let start = requested.unwrap_or_else(|| MonthKey::of(context.today).next());
    let months = validate_month_count(
        options.months.unwrap_or(context.settings.projection_months),
        SUMMARY_COMMAND,
    )?;

    let cache_key = format!(
        "{}summary:{start}:{months}",
        projections_prefix(&organization_id)
    );
    if let Some(cached) = options.cache.and_then(|cache| cache.get(&cache_key)) {
        return success(SUMMARY_COMMAND, cached);
    }

    let end = start.add_months(i32::try_from(months).unwrap_or(1) - 1);
    let records = LedgerRepository::search_many(
        &context.store,
        &organization_id,
        &RecordFilter {
            book: Some(Book::Projection),
            from: Some(start.first_day()),
            to: Some(end.last_day()),
            ..RecordFilter::default()
        },
    )?;
    tracing::debug!(
        organization_id = %organization_id,
        start = %start,
        months,
        records = records.len(),
        "projection summary computed"
    );

    let envelope = success(
        SUMMARY_COMMAND,
        ProjectionSummaryData {
            organization_id,
            projection: summarize_period(&records, start, months),
        },
    )?;
    if let Some(cache) = options.cache {
        cache.put(&cache_key, envelope.data.clone());
    }
    Ok(envelope)
}

#[derive(Debug, Default)]
pub struct ProjectionMonthOptions<'a> {
    pub organization_id: String,
    /// `YYYY-MM`; defaults to the current month.
    pub month: Option<String>,
    pub today: Option<NaiveDate>,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn month_with_options(options: ProjectionMonthOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let requested = options
        .month
        .as_deref()
        .map(|value| parse_month_arg(value, "month", MONTH_COMMAND))
        .transpose()?;
    let (context, organization) = open_scoped_context(
        options.home_override,
        options.today,
        &options.organization_id,
    )?;
    let organization_id = organization.organization_id;
    let month = requested.unwrap_or_else(|| MonthKey::of(context.today));

    // Month detail hides records before the current month, so today is part
    // of the key.
    let cache_key = format!(
        "{}month:{month}:{}",
        projections_prefix(&organization_id),
        format_iso_date(&context.today)
    );
    if let Some(cached) = options.cache.and_then(|cache| cache.get(&cache_key)) {
        return success(MONTH_COMMAND, cached);
    }

    let records = LedgerRepository::search_many(
        &context.store,
        &organization_id,
        &RecordFilter {
            book: Some(Book::Projection),
            from: Some(month.first_day()),
            to: Some(month.last_day()),
            ..RecordFilter::default()
        },
    )?;
    let banks = context.store.list_banks(&organization_id)?;

    let envelope = success(
        MONTH_COMMAND,
        ProjectionMonthData {
            organization_id,
            detail: month_details(&records, &banks, month, context.today),
        },
    )?;
    if let Some(cache) = options.cache {
        cache.put(&cache_key, envelope.data.clone());
    }
    Ok(envelope)
}
