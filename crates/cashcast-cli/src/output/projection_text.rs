use std::io;

use serde_json::Value;

use super::format::{self, Column, amount_field, key_value_rows, text_field};
use super::ledger_text::{array_field, object_field};

pub fn render_summary(data: &Value) -> io::Result<String> {
    let totals = object_field(data, "summary", "projection summary")?;
    let monthly = array_field(data, "monthly_data", "projection summary")?;

    let mut lines = vec![
        format!(
            "Projection {} to {} ({} months)",
            text_field(data, "start_month"),
            text_field(data, "end_month"),
            text_field(data, "months")
        ),
        String::new(),
        "Totals:".to_string(),
    ];
    lines.extend(totals_rows(totals));

    lines.push(String::new());
    if monthly.is_empty() {
        lines.push("No projected movements in this period.".to_string());
        return Ok(lines.join("\n"));
    }

    lines.push("By month:".to_string());
    let rows = monthly
        .iter()
        .map(|row| {
            vec![
                text_field(row, "month"),
                amount_field(row, "gains"),
                amount_field(row, "expenses"),
                amount_field(row, "credits"),
                amount_field(row, "balance"),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table_or_blocks(
        &[
            Column::left("Month"),
            Column::right("Gains"),
            Column::right("Expenses"),
            Column::right("Credits"),
            Column::right("Balance"),
        ],
        &rows,
        format::terminal_width(),
        "Month",
    ));
    Ok(lines.join("\n"))
}

pub fn render_month(data: &Value) -> io::Result<String> {
    let totals = object_field(data, "totals", "projection month")?;
    let month = text_field(data, "month");

    let mut lines = vec![format!("Projection for {month}"), String::new(), "Totals:".to_string()];
    lines.extend(totals_rows(totals));

    for (key, title) in [
        ("gains", "Gains"),
        ("expenses", "Expenses"),
        ("credits", "Credits"),
    ] {
        let entries = array_field(data, key, "projection month")?;
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{title}:"));
        lines.extend(entry_table(entries));
    }

    let hidden = data.get("hidden_count").and_then(Value::as_u64).unwrap_or(0);
    if hidden > 0 {
        lines.push(String::new());
        lines.push(format!(
            "{hidden} hidden record(s) listed above are left out of the totals."
        ));
    }
    Ok(lines.join("\n"))
}

pub fn render_recurring(data: &Value) -> io::Result<String> {
    let rows = array_field(data, "rows", "recurring")?;
    let from = text_field(data, "from");
    let to = text_field(data, "to");
    if rows.is_empty() {
        return Ok([
            format!("No recurring transactions between {from} and {to}."),
            String::new(),
            "A description recurs once it shows up in more than one month on the".to_string(),
            "same day of the month in most of them.".to_string(),
        ]
        .join("\n"));
    }

    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                text_field(row, "description"),
                text_field(row, "category"),
                amount_field(row, "amount"),
                text_field(row, "majority_day"),
                text_field(row, "recurrence_count"),
                text_field(row, "last_seen_at"),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![
        format!(
            "Recurring {} ({}) from {from} to {to}",
            text_field(data, "flow"),
            rows.len()
        ),
        String::new(),
    ];
    lines.extend(format::render_table_or_blocks(
        &[
            Column::left("Description"),
            Column::left("Category"),
            Column::right("Amount"),
            Column::right("Day"),
            Column::right("Months"),
            Column::left("Last Seen"),
        ],
        &table_rows,
        format::terminal_width(),
        "Pattern",
    ));
    Ok(lines.join("\n"))
}

fn totals_rows(totals: &Value) -> Vec<String> {
    key_value_rows(
        &[
            ("Gains:", amount_field(totals, "total_gains")),
            ("Expenses:", amount_field(totals, "total_expenses")),
            ("Credits:", amount_field(totals, "total_credits")),
            ("Balance:", amount_field(totals, "total_balance")),
        ],
        2,
    )
}

fn entry_table(entries: &[Value]) -> Vec<String> {
    let rows = entries
        .iter()
        .map(|row| {
            let description = if row.get("is_hidden").and_then(Value::as_bool) == Some(true) {
                format!("{} (hidden)", text_field(row, "description"))
            } else {
                text_field(row, "description")
            };
            let bank = row
                .get("bank")
                .map(|bank| text_field(bank, "name"))
                .unwrap_or_else(|| "-".to_string());
            vec![
                text_field(row, "expiration_date"),
                description,
                text_field(row, "category"),
                amount_field(row, "amount"),
                bank,
                text_field(row, "paid"),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    format::render_table_or_blocks(
        &[
            Column::left("Date"),
            Column::left("Description"),
            Column::left("Category"),
            Column::right("Amount"),
            Column::left("Bank"),
            Column::left("Paid"),
        ],
        &rows,
        format::terminal_width(),
        "Entry",
    )
}
