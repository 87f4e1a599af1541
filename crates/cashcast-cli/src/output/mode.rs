use crate::cli::{
    BankCommand, BillsCommand, Commands, GroupCommand, OrgCommand, ProjectionCommand, TxnCommand,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Org { command } => match command {
            OrgCommand::Create { json, .. } | OrgCommand::List { json } => *json,
        },
        Commands::Bank { command } => match command {
            BankCommand::Create { scope, .. } | BankCommand::List { scope } => scope.json,
        },
        Commands::Txn { command } => match command {
            TxnCommand::Create { scope, .. }
            | TxnCommand::List { scope, .. }
            | TxnCommand::Update { scope, .. }
            | TxnCommand::Delete { scope, .. }
            | TxnCommand::Group {
                command: GroupCommand::Rename { scope, .. } | GroupCommand::Delete { scope, .. },
            } => scope.json,
        },
        Commands::Recurring { scope, .. } => scope.json,
        Commands::Bills { command } => match command {
            BillsCommand::List { scope, .. }
            | BillsCommand::Create { scope, .. }
            | BillsCommand::FromTransaction { scope, .. }
            | BillsCommand::Suggest { scope, .. }
            | BillsCommand::Generate { scope, .. }
            | BillsCommand::Pay { scope, .. }
            | BillsCommand::Update { scope, .. }
            | BillsCommand::Delete { scope, .. } => scope.json,
        },
        Commands::Projection { command } => match command {
            ProjectionCommand::Summary { scope, .. } | ProjectionCommand::Month { scope, .. } => {
                scope.json
            }
        },
    };
    OutputMode::from_flag(json)
}
