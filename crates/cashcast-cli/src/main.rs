mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use cashcast_client::ClientError;
use clap::{Parser, error::ErrorKind};
use stdout_io::write_stdout_text;
use tracing_subscriber::EnvFilter;

const ROOT_HELP: &str = "Cashcast - recurring and installment projection engine

Usage:
  cashcast <command>

Start here:
  cashcast org create <name>
  cashcast txn create --help
  cashcast projection summary --org <id>
";

const TOP_LEVEL_HELP: &str = "Cashcast - recurring and installment projection engine

USAGE: cashcast [--home <dir>] <command>

Set up an organization:
  cashcast org create <name>                              Create an organization
  cashcast bank create --org <id> <name>                  Register a bank for it

Record movements:
  1. cashcast txn create --help                           Read the draft format
  2. cashcast txn create --org <id> drafts.json           Save drafts (installments fan out)
  3. cashcast txn list --org <id> --book projection       Review what was saved

Look ahead:
  cashcast projection summary --org <id>                  Monthly totals for the coming year
  cashcast projection month --org <id> 2025-08            Every entry due in one month
  cashcast recurring --org <id>                           Detect recurring transactions

Bills:
  cashcast bills suggest --org <id>                       Recurring expenses worth tracking
  cashcast bills from-transaction --org <id> <record>     Promote a transaction to a bill
  cashcast bills list --org <id>                          This month's bills (generated on demand)
  cashcast bills pay --org <id> <bill>                    Mark a bill as paid

Every command accepts --json for machine-readable output.
Data lives in $CASHCAST_HOME (default ~/.cashcast); set CASHCAST_LOG=debug for diagnostics.
";

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

/// Diagnostics go to stderr so stdout stays parseable in `--json` mode.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CASHCAST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    let mode = output::mode_for_command(&cli.command);
    tracing::debug!(args = ?&raw_args[1..], "dispatching command");

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if error.is_internal() {
                tracing::error!(code = %error.code, message = %error.message, "command failed");
            }
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let text = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            if write_stdout_text(&text).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        ErrorKind::DisplayVersion => {
            if write_stdout_text(&err.to_string()).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        kind => {
            let command_hint = if matches!(
                kind,
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error = parse_error_with_command_hint(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(ExitCode::from(1))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing usage block so the "What to do next" section is the
/// only guidance printed.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Subcommand path ("bills from-transaction", "txn group rename") for help
/// hints. Values of `--home` and other options are skipped along with flags.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let mut words = Vec::new();
    let mut skip_next = false;
    for value in raw_args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if value.starts_with('-') {
            skip_next = !value.contains('=') && option_takes_value(value);
            continue;
        }
        words.push(value.as_str());
    }

    let hint = match words.as_slice() {
        ["org", sub @ ("create" | "list"), ..] => format!("org {sub}"),
        ["bank", sub @ ("create" | "list"), ..] => format!("bank {sub}"),
        ["txn", "group", sub @ ("rename" | "delete"), ..] => format!("txn group {sub}"),
        ["txn", sub @ ("create" | "list" | "update" | "delete" | "group"), ..] => {
            format!("txn {sub}")
        }
        [
            "bills",
            sub @ ("list" | "create" | "from-transaction" | "suggest" | "generate" | "pay"
            | "update" | "delete"),
            ..,
        ] => format!("bills {sub}"),
        ["projection", sub @ ("summary" | "month"), ..] => format!("projection {sub}"),
        [top @ ("org" | "bank" | "txn" | "bills" | "projection" | "recurring"), ..] => {
            (*top).to_string()
        }
        _ => return None,
    };
    Some(hint)
}

fn option_takes_value(flag: &str) -> bool {
    !matches!(flag, "--json" | "--help" | "-h" | "--version" | "-V")
}

fn parse_error_with_command_hint(clean_message: &str, command_hint: Option<&str>) -> ClientError {
    if command_hint == Some("txn create") && clean_message.contains("unexpected argument") {
        return ClientError::invalid_argument_with_recovery(
            clean_message,
            vec![
                "Pass one JSON file path, or `-` to read drafts from stdin.".to_string(),
                "Run `cashcast txn create --help` for the draft format.".to_string(),
            ],
        );
    }

    ClientError::invalid_argument_for_command(clean_message, command_hint)
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_internal() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}
