use std::path::Path;

use cashcast_client::commands::{bills, organizations, projections, recurring, transactions};
use cashcast_client::ledger::{BillUpdate, LedgerRecordUpdate};
use cashcast_client::setup::{ensure_initialized, ensure_initialized_at};
use cashcast_client::{ClientResult, ResponseCache, SuccessEnvelope};

use crate::cli::{
    BankCommand, BillsCommand, Cli, Commands, GroupCommand, OrgCommand, ProjectionCommand,
    RecordChanges, TxnCommand,
};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    let home = cli.home.as_deref();
    match &cli.command {
        Commands::Org { command } => match command {
            OrgCommand::Create { name, .. } => {
                organizations::create_with_options(organizations::OrganizationCreateOptions {
                    name: name.clone(),
                    home_override: home,
                })
            }
            OrgCommand::List { .. } => organizations::list_with_options(home),
        },
        Commands::Bank { command } => match command {
            BankCommand::Create { scope, name } => {
                organizations::create_bank_with_options(organizations::BankCreateOptions {
                    organization_id: scope.organization_id.clone(),
                    name: name.clone(),
                    home_override: home,
                })
            }
            BankCommand::List { scope } => {
                organizations::list_banks_with_options(&scope.organization_id, home)
            }
        },
        Commands::Txn { command } => dispatch_txn(command, home),
        Commands::Recurring {
            scope,
            window,
            bank_id,
            flow,
            today,
        } => recurring::run_with_options(recurring::RecurringRunOptions {
            organization_id: scope.organization_id.clone(),
            window_months: *window,
            bank_id: bank_id.clone(),
            flow: flow.clone(),
            today: *today,
            home_override: home,
        }),
        Commands::Bills { command } => dispatch_bills(command, home),
        Commands::Projection { command } => {
            let cache = response_cache(home)?;
            match command {
                ProjectionCommand::Summary {
                    scope,
                    start,
                    months,
                    today,
                } => projections::summary_with_options(projections::ProjectionSummaryOptions {
                    organization_id: scope.organization_id.clone(),
                    start: start.clone(),
                    months: *months,
                    today: *today,
                    cache: Some(&cache),
                    home_override: home,
                }),
                ProjectionCommand::Month {
                    scope,
                    month,
                    today,
                } => projections::month_with_options(projections::ProjectionMonthOptions {
                    organization_id: scope.organization_id.clone(),
                    month: month.clone(),
                    today: *today,
                    cache: Some(&cache),
                    home_override: home,
                }),
            }
        }
    }
}

fn dispatch_txn(command: &TxnCommand, home: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    let cache = response_cache(home)?;
    match command {
        TxnCommand::Create { scope, path } => {
            transactions::create_with_options(transactions::TransactionCreateOptions {
                organization_id: scope.organization_id.clone(),
                path: path.clone(),
                stdin_override: None,
                cache: Some(&cache),
                home_override: home,
            })
        }
        TxnCommand::List {
            scope,
            kind,
            book,
            bank_id,
            from,
            to,
            group_installment_id,
        } => transactions::list_with_options(transactions::TransactionListOptions {
            organization_id: scope.organization_id.clone(),
            kind: kind.clone(),
            book: book.clone(),
            bank_id: bank_id.clone(),
            from: from.clone(),
            to: to.clone(),
            group_installment_id: group_installment_id.clone(),
            home_override: home,
        }),
        TxnCommand::Update {
            scope,
            record_id,
            changes,
            date,
        } => {
            let mut update = record_update(changes);
            update.expiration_date = *date;
            transactions::update_with_options(transactions::TransactionUpdateOptions {
                organization_id: scope.organization_id.clone(),
                record_id: record_id.clone(),
                update,
                cache: Some(&cache),
                home_override: home,
            })
        }
        TxnCommand::Delete { scope, record_id } => {
            transactions::delete_with_options(transactions::TransactionDeleteOptions {
                organization_id: scope.organization_id.clone(),
                record_id: record_id.clone(),
                cache: Some(&cache),
                home_override: home,
            })
        }
        TxnCommand::Group { command } => match command {
            GroupCommand::Rename {
                scope,
                group_installment_id,
                changes,
            } => transactions::update_group_with_options(transactions::GroupUpdateOptions {
                organization_id: scope.organization_id.clone(),
                group_installment_id: group_installment_id.clone(),
                update: record_update(changes),
                cache: Some(&cache),
                home_override: home,
            }),
            GroupCommand::Delete {
                scope,
                group_installment_id,
            } => transactions::delete_group_with_options(transactions::GroupDeleteOptions {
                organization_id: scope.organization_id.clone(),
                group_installment_id: group_installment_id.clone(),
                cache: Some(&cache),
                home_override: home,
            }),
        },
    }
}

fn dispatch_bills(command: &BillsCommand, home: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    match command {
        BillsCommand::List {
            scope,
            period,
            paid,
            today,
        } => bills::list_with_options(bills::BillListOptions {
            organization_id: scope.organization_id.clone(),
            period: period.clone(),
            paid: *paid,
            today: *today,
            home_override: home,
        }),
        BillsCommand::Create {
            scope,
            description,
            amount,
            day,
            company,
            category,
            period,
            today,
        } => bills::create_with_options(bills::BillCreateOptions {
            organization_id: scope.organization_id.clone(),
            description: description.clone(),
            company: company.clone(),
            category: category.clone(),
            amount: *amount,
            day_of_month: *day,
            period: period.clone(),
            today: *today,
            home_override: home,
        }),
        BillsCommand::FromTransaction {
            scope,
            record_id,
            day,
            period,
            today,
        } => bills::from_transaction_with_options(bills::BillFromTransactionOptions {
            organization_id: scope.organization_id.clone(),
            record_id: record_id.clone(),
            day_of_month: *day,
            period: period.clone(),
            today: *today,
            home_override: home,
        }),
        BillsCommand::Suggest {
            scope,
            window,
            bank_id,
            today,
        } => bills::suggest_with_options(bills::BillSuggestOptions {
            organization_id: scope.organization_id.clone(),
            window_months: *window,
            bank_id: bank_id.clone(),
            today: *today,
            home_override: home,
        }),
        BillsCommand::Generate {
            scope,
            period,
            today,
        } => bills::generate_with_options(bills::BillGenerateOptions {
            organization_id: scope.organization_id.clone(),
            period: period.clone(),
            today: *today,
            home_override: home,
        }),
        BillsCommand::Pay { scope, bill_id } => {
            bills::pay_with_options(&scope.organization_id, bill_id, home)
        }
        BillsCommand::Update {
            scope,
            bill_id,
            description,
            company,
            category,
            amount,
            day,
            active,
            paid,
        } => bills::update_with_options(bills::BillChangeOptions {
            organization_id: scope.organization_id.clone(),
            bill_id: bill_id.clone(),
            update: BillUpdate {
                description: description.clone(),
                company: company.clone(),
                category: category.clone(),
                amount: *amount,
                day_of_month: *day,
                active: *active,
                paid: *paid,
            },
            home_override: home,
        }),
        BillsCommand::Delete { scope, bill_id } => {
            bills::delete_with_options(&scope.organization_id, bill_id, home)
        }
    }
}

fn record_update(changes: &RecordChanges) -> LedgerRecordUpdate {
    LedgerRecordUpdate {
        description: changes.description.clone(),
        company: changes.company.clone(),
        category: changes.category.clone(),
        amount: changes.amount,
        expiration_date: None,
        paid: changes.paid,
        is_hidden: changes.hidden,
        bank_id: changes.bank_id.clone(),
    }
}

/// Process-local cache sized by the ledger's settings.
fn response_cache(home: Option<&Path>) -> ClientResult<ResponseCache> {
    let setup = match home {
        Some(path) => ensure_initialized_at(path)?,
        None => ensure_initialized()?,
    };
    Ok(ResponseCache::from_settings(&setup.settings))
}
