mod bills_text;
mod error_text;
mod format;
mod json;
mod ledger_text;
mod mode;
mod projection_text;

use std::io;

use cashcast_client::{ClientError, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    let data = &success.data;
    match success.command.as_str() {
        "org create" => ledger_text::render_organization(data),
        "org list" => ledger_text::render_organization_list(data),
        "bank create" => ledger_text::render_bank(data),
        "bank list" => ledger_text::render_bank_list(data),
        "txn create" => ledger_text::render_transaction_create(data),
        "txn list" => ledger_text::render_transaction_list(data),
        "txn update" => ledger_text::render_transaction(data),
        "txn delete" | "bills delete" => ledger_text::render_deleted(&success.command, data),
        "txn group rename" | "txn group delete" => {
            ledger_text::render_group_change(&success.command, data)
        }
        "recurring" => projection_text::render_recurring(data),
        "bills list" => bills_text::render_bill_list(data),
        "bills create" | "bills from-transaction" | "bills pay" | "bills update" => {
            bills_text::render_bill(&success.command, data)
        }
        "bills suggest" => bills_text::render_suggestions(data),
        "bills generate" => bills_text::render_generated(data),
        "projection summary" => projection_text::render_summary(data),
        "projection month" => projection_text::render_month(data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
