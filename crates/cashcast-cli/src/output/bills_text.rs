use std::io;

use serde_json::Value;

use super::format::{self, Column, amount_field, key_value_rows, text_field};
use super::ledger_text::{array_field, object_field};

const BILL_COLUMNS: [Column<'static>; 7] = [
    Column::left("Due"),
    Column::left("Description"),
    Column::left("Company"),
    Column::left("Category"),
    Column::right("Amount"),
    Column::left("Active"),
    Column::left("Paid"),
];

pub fn render_bill_list(data: &Value) -> io::Result<String> {
    let bills = array_field(data, "bills", "bills list")?;
    let period = text_field(data, "period");
    if bills.is_empty() {
        return Ok([
            format!("No bills for {period}."),
            String::new(),
            "Create one with `cashcast bills create` or promote a transaction with".to_string(),
            "`cashcast bills from-transaction`.".to_string(),
        ]
        .join("\n"));
    }

    let mut lines = vec![format!("Bills for {period} ({})", bills.len())];
    let generated = data.get("generated").and_then(Value::as_u64).unwrap_or(0);
    if generated > 0 {
        lines.push(format!("  {generated} bill(s) generated from earlier months."));
    }
    lines.push(String::new());
    lines.extend(bill_table(bills));

    let outstanding = bills
        .iter()
        .filter(|bill| bill.get("paid").and_then(Value::as_bool) == Some(false))
        .filter_map(|bill| bill.get("amount").and_then(Value::as_i64))
        .sum::<i64>();
    lines.push(String::new());
    lines.extend(key_value_rows(
        &[("Outstanding:", format::format_amount(outstanding))],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_bill(command: &str, data: &Value) -> io::Result<String> {
    let bill = object_field(data, "bill", command)?;
    let headline = match command {
        "bills pay" => "Bill marked as paid.",
        "bills update" => "Bill updated.",
        _ => "Bill created.",
    };
    let mut lines = vec![headline.to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Id:", text_field(bill, "bill_id")),
            ("Series:", text_field(bill, "series_id")),
            ("Period:", text_field(bill, "period")),
            ("Due:", text_field(bill, "expiration_date")),
            ("Description:", text_field(bill, "description")),
            ("Company:", text_field(bill, "company")),
            ("Category:", text_field(bill, "category")),
            ("Amount:", amount_field(bill, "amount")),
            ("Active:", text_field(bill, "active")),
            ("Paid:", text_field(bill, "paid")),
            ("Source:", text_field(bill, "source_transaction_id")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_suggestions(data: &Value) -> io::Result<String> {
    let suggestions = array_field(data, "suggestions", "bills suggest")?;
    if suggestions.is_empty() {
        return Ok("No recurring expenses look like bills yet.".to_string());
    }

    let rows = suggestions
        .iter()
        .map(|row| {
            vec![
                text_field(row, "description"),
                text_field(row, "company"),
                amount_field(row, "amount"),
                text_field(row, "day_of_month"),
                text_field(row, "recurrence_count"),
                text_field(row, "already_tracked"),
                text_field(row, "source_transaction_id"),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![
        format!("Bill suggestions ({})", suggestions.len()),
        String::new(),
    ];
    lines.extend(format::render_table_or_blocks(
        &[
            Column::left("Description"),
            Column::left("Company"),
            Column::right("Amount"),
            Column::right("Day"),
            Column::right("Months"),
            Column::left("Tracked"),
            Column::left("Source"),
        ],
        &rows,
        format::terminal_width(),
        "Suggestion",
    ));
    lines.push(String::new());
    lines.push(
        "Promote one with `cashcast bills from-transaction --org <id> <source>`.".to_string(),
    );
    Ok(lines.join("\n"))
}

pub fn render_generated(data: &Value) -> io::Result<String> {
    let created = array_field(data, "created", "bills generate")?;
    let period = text_field(data, "period");
    if created.is_empty() {
        return Ok(format!("Bills for {period} are already up to date."));
    }

    let mut lines = vec![
        format!("Generated {} bill(s) for {period}.", created.len()),
        String::new(),
    ];
    lines.extend(bill_table(created));
    Ok(lines.join("\n"))
}

fn bill_table(bills: &[Value]) -> Vec<String> {
    let rows = bills
        .iter()
        .map(|row| {
            vec![
                text_field(row, "expiration_date"),
                text_field(row, "description"),
                text_field(row, "company"),
                text_field(row, "category"),
                amount_field(row, "amount"),
                text_field(row, "active"),
                text_field(row, "paid"),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    format::render_table_or_blocks(&BILL_COLUMNS, &rows, format::terminal_width(), "Bill")
}
