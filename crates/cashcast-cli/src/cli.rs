use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

pub fn parse_iso_date(value: &str) -> Result<NaiveDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "date must use valid calendar values".to_string())
}

pub fn parse_day_of_month(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(day) if (1..=31).contains(&day) => Ok(day),
        _ => Err("day must be a whole number between 1 and 31".to_string()),
    }
}

/// Extended help shown after `cashcast txn create --help`.
pub const TXN_CREATE_AFTER_HELP: &str = "\
How ingest works:
  <path> is a JSON file holding one top-level array of drafts.
  Use `-` (or omit the path) to read the array from stdin.
  Example: cat drafts.json | cashcast txn create --org org_123 -

  Resubmitting the same drafts is safe: records that already exist
  are skipped and reported under `skipped`.

Draft fields:
  kind (required):               expense, gain or credit
  book:                          ledger (default) or projection
  description (required):        free text; also drives category hints
  amount (required):             integer minor units, never negative
  expiration_date (required):    YYYY-MM-DD or YYYY/MM/DD
  category:                      free text; English labels are translated
  type_payment:                  installment, recurrent or any one-off label
  installment_total_payment:     1..=120 months to expand into
  company, company_override:     merchant name; override skips truncation
  paid, is_hidden:               booleans (paid only sticks to the first month)
  bank_id:                       a bank of the same organization
  external_transaction_id:       bank-feed id; feed rows never expand

Example:
  [
    {
      \"kind\": \"expense\",
      \"book\": \"projection\",
      \"description\": \"TV nova\",
      \"amount\": 120000,
      \"expiration_date\": \"2025-01-10\",
      \"type_payment\": \"installment\",
      \"installment_total_payment\": 3
    }
  ]
";

#[derive(Debug, Parser)]
#[command(
    name = "cashcast",
    version,
    about = "recurring and installment projection engine",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Ledger home directory (defaults to $CASHCAST_HOME, then ~/.cashcast)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

/// Organization scope plus output selection, shared by most commands.
#[derive(Debug, Clone, Args)]
pub struct Scope {
    /// Organization id (e.g. org_01J...)
    #[arg(long = "org", value_name = "ORG_ID")]
    pub organization_id: String,
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage organizations (every record belongs to one)
    #[command(arg_required_else_help = true)]
    Org {
        #[command(subcommand)]
        command: OrgCommand,
    },
    /// Manage the banks of an organization
    #[command(arg_required_else_help = true)]
    Bank {
        #[command(subcommand)]
        command: BankCommand,
    },
    /// Ingest and maintain ledger and projection records
    #[command(arg_required_else_help = true)]
    Txn {
        #[command(subcommand)]
        command: TxnCommand,
    },
    /// Detect recurring transactions in the settled ledger
    Recurring {
        #[command(flatten)]
        scope: Scope,
        /// Lookback in months (defaults to settings, 12)
        #[arg(long, value_name = "MONTHS")]
        window: Option<u32>,
        /// Only scan records of this bank
        #[arg(long = "bank", value_name = "BANK_ID")]
        bank_id: Option<String>,
        /// outflow (expenses and credits) or inflow (gains)
        #[arg(long)]
        flow: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Track standing monthly bills
    #[command(arg_required_else_help = true)]
    Bills {
        #[command(subcommand)]
        command: BillsCommand,
    },
    /// Roll projection-book records into monthly totals
    #[command(arg_required_else_help = true)]
    Projection {
        #[command(subcommand)]
        command: ProjectionCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum OrgCommand {
    /// Create an organization
    Create {
        /// Display name
        name: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List organizations
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BankCommand {
    /// Register a bank for an organization
    Create {
        #[command(flatten)]
        scope: Scope,
        /// Display name
        name: String,
    },
    /// List the banks of an organization
    List {
        #[command(flatten)]
        scope: Scope,
    },
}

/// Field changes shared by single-record and group updates.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordChanges {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Integer minor units
    #[arg(long)]
    pub amount: Option<i64>,
    #[arg(long, value_name = "true|false")]
    pub paid: Option<bool>,
    #[arg(long, value_name = "true|false")]
    pub hidden: Option<bool>,
    #[arg(long = "bank", value_name = "BANK_ID")]
    pub bank_id: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TxnCommand {
    /// Ingest a JSON array of drafts, expanding installments and series
    #[command(after_long_help = TXN_CREATE_AFTER_HELP)]
    Create {
        #[command(flatten)]
        scope: Scope,
        /// Path to a JSON drafts file (use `-` for stdin)
        path: Option<String>,
    },
    /// List records, oldest first
    List {
        #[command(flatten)]
        scope: Scope,
        /// expense, gain or credit
        #[arg(long)]
        kind: Option<String>,
        /// ledger or projection
        #[arg(long)]
        book: Option<String>,
        #[arg(long = "bank", value_name = "BANK_ID")]
        bank_id: Option<String>,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Only records of this installment or recurring series
        #[arg(long = "group", value_name = "GROUP_ID")]
        group_installment_id: Option<String>,
    },
    /// Change one record
    Update {
        #[command(flatten)]
        scope: Scope,
        /// Record id (e.g. rec_01J...)
        record_id: String,
        #[command(flatten)]
        changes: RecordChanges,
        /// New due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
    },
    /// Delete one record
    Delete {
        #[command(flatten)]
        scope: Scope,
        /// Record id (e.g. rec_01J...)
        record_id: String,
    },
    /// Change or delete a whole installment or recurring series
    #[command(arg_required_else_help = true)]
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum GroupCommand {
    /// Apply one change to every record of a series
    Rename {
        #[command(flatten)]
        scope: Scope,
        /// Series id (e.g. grp_01J...)
        group_installment_id: String,
        #[command(flatten)]
        changes: RecordChanges,
    },
    /// Delete every record of a series
    Delete {
        #[command(flatten)]
        scope: Scope,
        /// Series id (e.g. grp_01J...)
        group_installment_id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BillsCommand {
    /// List the bills of a period, generating it first when empty
    List {
        #[command(flatten)]
        scope: Scope,
        /// Period (YYYY-MM); defaults to the current month
        #[arg(long)]
        period: Option<String>,
        /// Only paid (true) or unpaid (false) bills
        #[arg(long, value_name = "true|false")]
        paid: Option<bool>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Create a standing bill
    Create {
        #[command(flatten)]
        scope: Scope,
        description: String,
        /// Integer minor units
        #[arg(long)]
        amount: i64,
        /// Due day of month (1-31, clamped to short months)
        #[arg(long, value_parser = parse_day_of_month)]
        day: u32,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Period (YYYY-MM); defaults to the current month
        #[arg(long)]
        period: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Promote a transaction to a standing bill
    FromTransaction {
        #[command(flatten)]
        scope: Scope,
        /// Record id (e.g. rec_01J...)
        record_id: String,
        /// Due day of month; defaults to the record's day
        #[arg(long, value_parser = parse_day_of_month)]
        day: Option<u32>,
        /// Period (YYYY-MM); defaults to the current month
        #[arg(long)]
        period: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Suggest bills from recurring outflows
    Suggest {
        #[command(flatten)]
        scope: Scope,
        /// Lookback in months (defaults to settings, 5)
        #[arg(long, value_name = "MONTHS")]
        window: Option<u32>,
        #[arg(long = "bank", value_name = "BANK_ID")]
        bank_id: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Create the next period's occurrence of every active bill
    Generate {
        #[command(flatten)]
        scope: Scope,
        /// Period (YYYY-MM); defaults to next month
        #[arg(long)]
        period: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Mark a bill as paid
    Pay {
        #[command(flatten)]
        scope: Scope,
        /// Bill id (e.g. bill_01J...)
        bill_id: String,
    },
    /// Change one bill occurrence
    Update {
        #[command(flatten)]
        scope: Scope,
        /// Bill id (e.g. bill_01J...)
        bill_id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        amount: Option<i64>,
        #[arg(long, value_parser = parse_day_of_month)]
        day: Option<u32>,
        /// Inactive bills stop generating
        #[arg(long, value_name = "true|false")]
        active: Option<bool>,
        #[arg(long, value_name = "true|false")]
        paid: Option<bool>,
    },
    /// Delete one bill occurrence
    Delete {
        #[command(flatten)]
        scope: Scope,
        /// Bill id (e.g. bill_01J...)
        bill_id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectionCommand {
    /// Monthly totals over a span of months
    Summary {
        #[command(flatten)]
        scope: Scope,
        /// First month (YYYY-MM); defaults to next month
        #[arg(long)]
        start: Option<String>,
        /// Number of months (defaults to settings, 12)
        #[arg(long)]
        months: Option<u32>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
    /// Every projected record of one month
    Month {
        #[command(flatten)]
        scope: Scope,
        /// Month (YYYY-MM); defaults to the current month
        month: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_iso_date)]
        today: Option<NaiveDate>,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::{BillsCommand, Commands, TxnCommand, parse_from};

    #[test]
    fn parse_command_paths() {
        let cases: [Vec<&str>; 20] = [
            vec!["cashcast", "org", "create", "Casa"],
            vec!["cashcast", "org", "list", "--json"],
            vec!["cashcast", "bank", "create", "--org", "org_1", "Nubank"],
            vec!["cashcast", "bank", "list", "--org", "org_1", "--json"],
            vec!["cashcast", "txn", "create", "--org", "org_1", "drafts.json"],
            vec!["cashcast", "txn", "create", "--org", "org_1", "-", "--json"],
            vec![
                "cashcast", "txn", "list", "--org", "org_1", "--kind", "expense", "--from",
                "2025-01-01",
            ],
            vec![
                "cashcast", "txn", "update", "--org", "org_1", "rec_1", "--amount", "100",
                "--paid", "true",
            ],
            vec!["cashcast", "txn", "delete", "--org", "org_1", "rec_1"],
            vec![
                "cashcast", "txn", "group", "rename", "--org", "org_1", "grp_1",
                "--description", "TV",
            ],
            vec!["cashcast", "txn", "group", "delete", "--org", "org_1", "grp_1"],
            vec!["cashcast", "recurring", "--org", "org_1", "--flow", "inflow"],
            vec!["cashcast", "bills", "list", "--org", "org_1", "--paid", "false"],
            vec![
                "cashcast", "bills", "create", "--org", "org_1", "Internet", "--amount",
                "11990", "--day", "10",
            ],
            vec!["cashcast", "bills", "from-transaction", "--org", "org_1", "rec_1"],
            vec!["cashcast", "bills", "suggest", "--org", "org_1", "--window", "3"],
            vec!["cashcast", "bills", "generate", "--org", "org_1", "--period", "2025-07"],
            vec!["cashcast", "bills", "pay", "--org", "org_1", "bill_1"],
            vec![
                "cashcast", "projection", "summary", "--org", "org_1", "--months", "6",
            ],
            vec![
                "cashcast", "projection", "month", "--org", "org_1", "2025-08", "--today",
                "2025-06-15",
            ],
        ];

        for case in cases {
            let parsed = parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse: {case:?}");
        }
    }

    #[test]
    fn global_home_is_accepted_after_subcommands() {
        let parsed = parse_from(["cashcast", "org", "list", "--home", "/tmp/cashcast-home"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert_eq!(
                cli.home.as_deref(),
                Some(std::path::Path::new("/tmp/cashcast-home"))
            );
        }
    }

    #[test]
    fn txn_update_collects_changes() {
        let parsed = parse_from([
            "cashcast", "txn", "update", "--org", "org_1", "rec_1", "--hidden", "true",
            "--date", "2025-03-01", "--json",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert!(matches!(
                cli.command,
                Commands::Txn {
                    command: TxnCommand::Update { ref changes, date: Some(_), ref scope, .. }
                } if changes.hidden == Some(true) && scope.json
            ));
        }
    }

    #[test]
    fn org_scope_is_required() {
        let parsed = parse_from(["cashcast", "bills", "list"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn invalid_day_and_date_are_rejected() {
        let bad_day = parse_from([
            "cashcast", "bills", "create", "--org", "org_1", "Luz", "--amount", "1", "--day", "32",
        ]);
        assert!(bad_day.is_err());

        let bad_date = parse_from([
            "cashcast", "recurring", "--org", "org_1", "--today", "2025-02-30",
        ]);
        assert!(bad_date.is_err());
    }

    #[test]
    fn bills_pay_parses_bill_id() {
        let parsed = parse_from(["cashcast", "bills", "pay", "--org", "org_1", "bill_9"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert!(matches!(
                cli.command,
                Commands::Bills {
                    command: BillsCommand::Pay { ref bill_id, .. }
                } if bill_id == "bill_9"
            ));
        }
    }

    #[test]
    fn bare_group_shows_help() {
        let parsed = parse_from(["cashcast", "txn"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(
                err.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
        }
    }

    #[test]
    fn help_command_is_rejected() {
        let parsed = parse_from(["cashcast", "help"]);
        assert!(parsed.is_err());
    }
}
