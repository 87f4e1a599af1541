use std::path::Path;

use chrono::NaiveDate;

use crate::cache::{ResponseCache, projections_prefix};
use crate::engine::recurrence::RecurringFlow;
use crate::ledger::{Book, LedgerKind, Organization};
use crate::settings::EngineSettings;
use crate::setup::load_setup;
use crate::store::SqliteStore;
use crate::{ClientError, ClientResult};

/// Everything one command invocation needs: an initialized ledger, its
/// settings, an open store and the date it treats as today.
pub(crate) struct CommandContext {
    pub(crate) settings: EngineSettings,
    pub(crate) store: SqliteStore,
    pub(crate) today: NaiveDate,
}

pub(crate) fn open_context(
    home_override: Option<&Path>,
    today_override: Option<NaiveDate>,
) -> ClientResult<CommandContext> {
    let setup = load_setup(home_override)?;
    let store = SqliteStore::open(&setup.db_path)?;
    Ok(CommandContext {
        settings: setup.settings,
        store,
        today: today_override.unwrap_or_else(local_today),
    })
}

/// Opens the ledger and checks that `organization_id` exists.
pub(crate) fn open_scoped_context(
    home_override: Option<&Path>,
    today_override: Option<NaiveDate>,
    organization_id: &str,
) -> ClientResult<(CommandContext, Organization)> {
    let context = open_context(home_override, today_override)?;
    let organization = context.store.require_organization(organization_id)?;
    Ok((context, organization))
}

pub(crate) fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Drops cached projection views after a write to `organization_id`.
pub(crate) fn invalidate_projections(cache: Option<&ResponseCache>, organization_id: &str) {
    if let Some(cache) = cache {
        let dropped = cache.invalidate_prefix(&projections_prefix(organization_id));
        tracing::debug!(organization_id, dropped, "projection cache invalidated");
    }
}

pub(crate) fn require_text(value: &str, field_name: &str, command: &str) -> ClientResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must not be empty."),
            Some(command),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_kind_arg(value: &str, command: &str) -> ClientResult<LedgerKind> {
    LedgerKind::parse(value).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("Unknown kind `{value}`. Use expense, gain or credit."),
            Some(command),
        )
    })
}

pub(crate) fn parse_book_arg(value: &str, command: &str) -> ClientResult<Book> {
    Book::parse(value).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("Unknown book `{value}`. Use ledger or projection."),
            Some(command),
        )
    })
}

pub(crate) fn parse_flow_arg(value: &str, command: &str) -> ClientResult<RecurringFlow> {
    RecurringFlow::parse(value).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("Unknown flow `{value}`. Use outflow or inflow."),
            Some(command),
        )
    })
}

pub(crate) fn validate_day_of_month(day: u32, command: &str) -> ClientResult<u32> {
    if !(1..=31).contains(&day) {
        return Err(ClientError::invalid_argument_for_command(
            "`day_of_month` must be between 1 and 31.",
            Some(command),
        ));
    }
    Ok(day)
}

pub(crate) fn validate_month_count(months: u32, command: &str) -> ClientResult<u32> {
    if !(1..=120).contains(&months) {
        return Err(ClientError::invalid_argument_for_command(
            "`months` must be between 1 and 120.",
            Some(command),
        ));
    }
    Ok(months)
}
