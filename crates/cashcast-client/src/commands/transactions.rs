use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;

use crate::cache::ResponseCache;
use crate::commands::common::{
    invalidate_projections, open_scoped_context, parse_book_arg, parse_kind_arg, require_text,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    DeletedData, DraftInput, GroupChangeData, TransactionCreateData, TransactionData,
    TransactionListData,
};
use crate::engine::category::normalize_category;
use crate::engine::plan_ingest;
use crate::input::resolve_source;
use crate::ledger::period::{format_iso_date, parse_date_arg};
use crate::ledger::{
    Bank, Book, LedgerKind, LedgerRecord, LedgerRecordUpdate, PaymentType, TransactionDraft,
};
use crate::store::{LedgerRepository, RecordFilter, SqliteStore};
use crate::{ClientError, ClientResult};

const CREATE_COMMAND: &str = "txn create";
const MAX_INSTALLMENTS: u32 = 120;

#[derive(Debug, Default)]
pub struct TransactionCreateOptions<'a> {
    pub organization_id: String,
    /// JSON file with an array of drafts; `-` or `None` reads stdin.
    pub path: Option<String>,
    pub stdin_override: Option<String>,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

/// Normalizes, groups and expands a batch of drafts, then persists the
/// result. Records that already exist are skipped, so resubmitting a batch
/// is a no-op.
#[doc(hidden)]
pub fn create_with_options(options: TransactionCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let source = resolve_source(
        options.path.as_deref(),
        options.stdin_override,
        CREATE_COMMAND,
    )?;
    let inputs = serde_json::from_str::<Vec<DraftInput>>(&source.content).map_err(|error| {
        ClientError::invalid_argument_with_recovery(
            &format!("Input is not a JSON array of transaction drafts: {error}"),
            vec![
                "Pass a JSON array such as `[{\"kind\": \"expense\", ...}]`.".to_string(),
                format!("Run `cashcast {CREATE_COMMAND} --help` for the draft fields."),
            ],
        )
    })?;

    let (mut context, organization) = open_scoped_context(
        options.home_override,
        None,
        &options.organization_id,
    )?;
    let organization_id = organization.organization_id;
    let banks = context.store.list_banks(&organization_id)?;

    let mut drafts = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
        drafts.push(draft_from_input(index, input, &organization_id, &banks)?);
    }
    let draft_count = drafts.len();

    let records = plan_batch(&context.store, &organization_id, drafts)?;
    let inserted = context.store.create_many(&records)?;
    invalidate_projections(options.cache, &organization_id);

    tracing::info!(
        organization_id = %organization_id,
        source = source.kind.as_str(),
        drafts = draft_count,
        planned = records.len(),
        inserted,
        "transactions created"
    );

    success(
        CREATE_COMMAND,
        TransactionCreateData {
            organization_id,
            source: source.kind.as_str().to_string(),
            drafts: draft_count,
            planned: records.len(),
            inserted,
            skipped: records.len() - inserted,
            records,
        },
    )
}

/// Plans each `(kind, book)` slice of the batch against the recurring series
/// already persisted in that slice.
fn plan_batch(
    store: &SqliteStore,
    organization_id: &str,
    drafts: Vec<TransactionDraft>,
) -> ClientResult<Vec<LedgerRecord>> {
    let mut slices: BTreeMap<(LedgerKind, Book), Vec<TransactionDraft>> = BTreeMap::new();
    for draft in drafts {
        slices.entry((draft.kind, draft.book)).or_default().push(draft);
    }

    let mut records = Vec::new();
    for ((kind, book), slice) in slices {
        let existing = if slice.iter().any(|draft| draft.type_payment.is_recurrent()) {
            LedgerRepository::search_many(
                store,
                organization_id,
                &RecordFilter {
                    kinds: vec![kind],
                    book: Some(book),
                    ..RecordFilter::default()
                },
            )?
        } else {
            Vec::new()
        };
        records.extend(plan_ingest(slice, &existing));
    }
    Ok(records)
}

fn draft_from_input(
    index: usize,
    input: DraftInput,
    organization_id: &str,
    banks: &[Bank],
) -> ClientResult<TransactionDraft> {
    let at = |message: &str| {
        ClientError::invalid_argument_for_command(
            &format!("drafts[{index}]: {message}"),
            Some(CREATE_COMMAND),
        )
    };

    let kind = LedgerKind::parse(&input.kind)
        .ok_or_else(|| at("`kind` must be expense, gain or credit."))?;
    let book = match input.book.as_deref() {
        Some(value) => Book::parse(value).ok_or_else(|| at("`book` must be ledger or projection."))?,
        None => Book::Ledger,
    };
    let description = input.description.trim().to_string();
    if description.is_empty() {
        return Err(at("`description` must not be empty."));
    }
    let amount = input
        .amount
        .ok_or_else(|| at("`amount` is required (integer minor units)."))?;
    if amount < 0 {
        return Err(at("`amount` must not be negative."));
    }
    let expiration_date = parse_date_arg(&input.expiration_date, "expiration_date", CREATE_COMMAND)
        .map_err(|_| at("`expiration_date` must use YYYY-MM-DD or YYYY/MM/DD."))?;
    let purchase_date = optional_date(input.purchase_date.as_deref())
        .map_err(|_| at("`purchase_date` must use YYYY-MM-DD or YYYY/MM/DD."))?;
    let balance_close_date = optional_date(input.balance_close_date.as_deref())
        .map_err(|_| at("`balance_close_date` must use YYYY-MM-DD or YYYY/MM/DD."))?;
    if input
        .installment_total_payment
        .is_some_and(|total| total > MAX_INSTALLMENTS)
    {
        return Err(at(&format!(
            "`installment_total_payment` must be at most {MAX_INSTALLMENTS}."
        )));
    }
    let bank_id = non_blank(input.bank_id);
    if let Some(bank_id) = bank_id.as_deref()
        && !banks.iter().any(|bank| bank.bank_id == bank_id)
    {
        return Err(ClientError::bank_not_found(bank_id));
    }

    Ok(TransactionDraft {
        organization_id: organization_id.to_string(),
        kind,
        book,
        description,
        company: non_blank(input.company),
        company_override: non_blank(input.company_override),
        category: input.category,
        amount,
        expiration_date,
        purchase_date,
        balance_close_date,
        type_payment: PaymentType::parse(input.type_payment.as_deref().unwrap_or("")),
        installment_total_payment: input.installment_total_payment,
        paid: input.paid,
        is_hidden: input.is_hidden,
        bank_id,
        bank_type_account_id: non_blank(input.bank_type_account_id),
        external_transaction_id: non_blank(input.external_transaction_id),
        group_installment_id: non_blank(input.group_installment_id),
    })
}

fn optional_date(value: Option<&str>) -> ClientResult<Option<NaiveDate>> {
    match value {
        Some(text) if !text.trim().is_empty() => {
            parse_date_arg(text, "date", CREATE_COMMAND).map(Some)
        }
        _ => Ok(None),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Debug, Default)]
pub struct TransactionListOptions<'a> {
    pub organization_id: String,
    pub kind: Option<String>,
    pub book: Option<String>,
    pub bank_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub group_installment_id: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn list_with_options(options: TransactionListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "txn list";
    let kinds = match options.kind.as_deref() {
        Some(value) => vec![parse_kind_arg(value, COMMAND)?],
        None => Vec::new(),
    };
    let book = options
        .book
        .as_deref()
        .map(|value| parse_book_arg(value, COMMAND))
        .transpose()?;
    let from = options
        .from
        .as_deref()
        .map(|value| parse_date_arg(value, "from", COMMAND))
        .transpose()?;
    let to = options
        .to
        .as_deref()
        .map(|value| parse_date_arg(value, "to", COMMAND))
        .transpose()?;
    if let (Some(start), Some(end)) = (from, to)
        && start > end
    {
        return Err(ClientError::invalid_argument_for_command(
            "`from` must be on or before `to`.",
            Some(COMMAND),
        ));
    }

    let (context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    let filter = RecordFilter {
        kinds,
        book,
        bank_id: options.bank_id,
        from,
        to,
        group_installment_id: options.group_installment_id,
    };
    let records =
        LedgerRepository::search_many(&context.store, &organization.organization_id, &filter)?;
    tracing::debug!(count = records.len(), "transactions listed");

    success(
        COMMAND,
        TransactionListData {
            organization_id: organization.organization_id,
            from: from.as_ref().map(format_iso_date),
            to: to.as_ref().map(format_iso_date),
            count: records.len(),
            records,
        },
    )
}

#[derive(Debug, Default)]
pub struct TransactionUpdateOptions<'a> {
    pub organization_id: String,
    pub record_id: String,
    pub update: LedgerRecordUpdate,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn update_with_options(options: TransactionUpdateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "txn update";
    if options.update.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pass at least one field to change.",
            Some(COMMAND),
        ));
    }

    let (context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    let organization_id = organization.organization_id;
    let current = context.store.find(&organization_id, &options.record_id)?;
    let update = prepare_update(
        &context.store,
        &organization_id,
        options.update,
        &current.description,
        COMMAND,
    )?;

    let record = context
        .store
        .update(&organization_id, &options.record_id, &update)?;
    invalidate_projections(options.cache, &organization_id);
    tracing::info!(organization_id = %organization_id, record_id = %record.record_id, "transaction updated");
    success(COMMAND, TransactionData { record })
}

#[derive(Debug, Default)]
pub struct TransactionDeleteOptions<'a> {
    pub organization_id: String,
    pub record_id: String,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn delete_with_options(options: TransactionDeleteOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let (context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    LedgerRepository::delete(
        &context.store,
        &organization.organization_id,
        &options.record_id,
    )?;
    invalidate_projections(options.cache, &organization.organization_id);
    tracing::info!(record_id = %options.record_id, "transaction deleted");
    success(
        "txn delete",
        DeletedData {
            id: options.record_id,
            deleted: 1,
        },
    )
}

#[derive(Debug, Default)]
pub struct GroupUpdateOptions<'a> {
    pub organization_id: String,
    pub group_installment_id: String,
    pub update: LedgerRecordUpdate,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

/// Applies one change to every record of a series. Dates are per-record, so
/// a group change may not move `expiration_date`.
#[doc(hidden)]
pub fn update_group_with_options(options: GroupUpdateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    const COMMAND: &str = "txn group rename";
    if options.update.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pass at least one field to change.",
            Some(COMMAND),
        ));
    }
    if options.update.expiration_date.is_some() {
        return Err(ClientError::invalid_argument_for_command(
            "A series keeps its per-record dates; update records one by one to move them.",
            Some(COMMAND),
        ));
    }
    let group_installment_id = require_text(
        &options.group_installment_id,
        "group_installment_id",
        COMMAND,
    )?;

    let (mut context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    let organization_id = organization.organization_id;
    let members = LedgerRepository::search_many(
        &context.store,
        &organization_id,
        &RecordFilter {
            group_installment_id: Some(group_installment_id.clone()),
            ..RecordFilter::default()
        },
    )?;
    let Some(first) = members.first() else {
        return Err(ClientError::group_not_found(&group_installment_id));
    };
    let update = prepare_update(
        &context.store,
        &organization_id,
        options.update,
        &first.description,
        COMMAND,
    )?;

    let affected = context
        .store
        .update_group(&organization_id, &group_installment_id, &update)?;
    invalidate_projections(options.cache, &organization_id);
    tracing::info!(
        organization_id = %organization_id,
        group_installment_id = %group_installment_id,
        affected,
        "transaction group updated"
    );
    success(
        COMMAND,
        GroupChangeData {
            group_installment_id,
            affected,
        },
    )
}

#[derive(Debug, Default)]
pub struct GroupDeleteOptions<'a> {
    pub organization_id: String,
    pub group_installment_id: String,
    pub cache: Option<&'a ResponseCache>,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn delete_group_with_options(options: GroupDeleteOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let (context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    let affected = context
        .store
        .delete_group(&organization.organization_id, &options.group_installment_id)?;
    invalidate_projections(options.cache, &organization.organization_id);
    tracing::info!(
        group_installment_id = %options.group_installment_id,
        affected,
        "transaction group deleted"
    );
    success(
        "txn group delete",
        GroupChangeData {
            group_installment_id: options.group_installment_id,
            affected,
        },
    )
}

/// Trims text fields, normalizes a new category against the description the
/// record will carry, and checks a new bank belongs to the organization.
fn prepare_update(
    store: &SqliteStore,
    organization_id: &str,
    mut update: LedgerRecordUpdate,
    current_description: &str,
    command: &str,
) -> ClientResult<LedgerRecordUpdate> {
    if let Some(description) = update.description.as_deref() {
        update.description = Some(require_text(description, "description", command)?);
    }
    if let Some(category) = update.category.as_deref() {
        let description = update.description.as_deref().unwrap_or(current_description);
        update.category = Some(normalize_category(Some(category), Some(description)));
    }
    if let Some(amount) = update.amount
        && amount < 0
    {
        return Err(ClientError::invalid_argument_for_command(
            "`amount` must not be negative.",
            Some(command),
        ));
    }
    if let Some(bank_id) = update.bank_id.as_deref() {
        store.require_bank(organization_id, bank_id)?;
    }
    Ok(update)
}
