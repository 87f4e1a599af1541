use std::io;

use serde_json::Value;

use super::format::{self, Column, amount_field, key_value_rows, text_field};

const RECORD_COLUMNS: [Column<'static>; 7] = [
    Column::left("Date"),
    Column::left("Description"),
    Column::left("Category"),
    Column::right("Amount"),
    Column::left("Kind"),
    Column::left("Installment"),
    Column::left("Paid"),
];

pub fn render_organization(data: &Value) -> io::Result<String> {
    let organization = object_field(data, "organization", "org create")?;
    let mut lines = vec!["Organization created.".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Id:", text_field(organization, "organization_id")),
            ("Name:", text_field(organization, "name")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_organization_list(data: &Value) -> io::Result<String> {
    let organizations = array_field(data, "organizations", "org list")?;
    if organizations.is_empty() {
        return Ok([
            "No organizations yet.",
            "",
            "Create one with `cashcast org create <name>`.",
        ]
        .join("\n"));
    }

    let rows = organizations
        .iter()
        .map(|row| {
            vec![
                text_field(row, "organization_id"),
                text_field(row, "name"),
                text_field(row, "created_at"),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    let mut lines = vec![format!("Organizations ({})", organizations.len()), String::new()];
    lines.extend(format::render_table_or_blocks(
        &[
            Column::left("Id"),
            Column::left("Name"),
            Column::left("Created"),
        ],
        &rows,
        format::terminal_width(),
        "Organization",
    ));
    Ok(lines.join("\n"))
}

pub fn render_bank(data: &Value) -> io::Result<String> {
    let bank = object_field(data, "bank", "bank create")?;
    let mut lines = vec!["Bank created.".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Id:", text_field(bank, "bank_id")),
            ("Name:", text_field(bank, "name")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_bank_list(data: &Value) -> io::Result<String> {
    let banks = array_field(data, "banks", "bank list")?;
    if banks.is_empty() {
        return Ok("No banks registered for this organization.".to_string());
    }

    let rows = banks
        .iter()
        .map(|row| vec![text_field(row, "bank_id"), text_field(row, "name")])
        .collect::<Vec<Vec<String>>>();
    let mut lines = vec![format!("Banks ({})", banks.len()), String::new()];
    lines.extend(format::render_table_or_blocks(
        &[Column::left("Id"), Column::left("Name")],
        &rows,
        format::terminal_width(),
        "Bank",
    ));
    Ok(lines.join("\n"))
}

pub fn render_transaction_create(data: &Value) -> io::Result<String> {
    let records = array_field(data, "records", "txn create")?;
    let mut lines = vec!["Transactions saved.".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Source:", text_field(data, "source")),
            ("Drafts:", text_field(data, "drafts")),
            ("Planned records:", text_field(data, "planned")),
            ("Inserted:", text_field(data, "inserted")),
            ("Skipped duplicates:", text_field(data, "skipped")),
        ],
        2,
    ));
    if !records.is_empty() {
        lines.push(String::new());
        lines.push("Records:".to_string());
        lines.extend(record_table(records));
    }
    Ok(lines.join("\n"))
}

pub fn render_transaction_list(data: &Value) -> io::Result<String> {
    let records = array_field(data, "records", "txn list")?;
    if records.is_empty() {
        return Ok("No transactions match these filters.".to_string());
    }

    let mut lines = vec![
        format!(
            "Transactions ({}){}",
            records.len(),
            range_suffix(data.get("from"), data.get("to"))
        ),
        String::new(),
    ];
    lines.extend(record_table(records));
    Ok(lines.join("\n"))
}

pub fn render_transaction(data: &Value) -> io::Result<String> {
    let record = object_field(data, "record", "txn update")?;
    let mut lines = vec!["Transaction updated.".to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Id:", text_field(record, "record_id")),
            ("Date:", text_field(record, "expiration_date")),
            ("Description:", text_field(record, "description")),
            ("Company:", text_field(record, "company")),
            ("Category:", text_field(record, "category")),
            ("Amount:", amount_field(record, "amount")),
            ("Paid:", text_field(record, "paid")),
            ("Hidden:", text_field(record, "is_hidden")),
            ("Group:", text_field(record, "group_installment_id")),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_deleted(command: &str, data: &Value) -> io::Result<String> {
    let noun = if command.starts_with("bills") {
        "Bill"
    } else {
        "Transaction"
    };
    Ok(format!("{noun} {} deleted.", text_field(data, "id")))
}

pub fn render_group_change(command: &str, data: &Value) -> io::Result<String> {
    let verb = if command.ends_with("delete") {
        "deleted"
    } else {
        "updated"
    };
    let affected = data.get("affected").and_then(Value::as_u64).unwrap_or(0);
    Ok(format!(
        "Group {}: {affected} record(s) {verb}.",
        text_field(data, "group_installment_id")
    ))
}

fn record_table(records: &[Value]) -> Vec<String> {
    let rows = records
        .iter()
        .map(|row| {
            vec![
                text_field(row, "expiration_date"),
                text_field(row, "description"),
                text_field(row, "category"),
                amount_field(row, "amount"),
                text_field(row, "kind"),
                installment_label(row),
                text_field(row, "paid"),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    format::render_table_or_blocks(&RECORD_COLUMNS, &rows, format::terminal_width(), "Record")
}

fn installment_label(row: &Value) -> String {
    let current = row.get("installment_current").and_then(Value::as_u64);
    let total = row.get("installment_total_payment").and_then(Value::as_u64);
    match (current, total) {
        (Some(current), Some(total)) => format!("{current}/{total}"),
        _ => text_field(row, "type_payment"),
    }
}

fn range_suffix(from: Option<&Value>, to: Option<&Value>) -> String {
    let from = from.and_then(Value::as_str);
    let to = to.and_then(Value::as_str);
    match (from, to) {
        (None, None) => String::new(),
        (from, to) => format!(
            " from {} to {}",
            from.unwrap_or("the start"),
            to.unwrap_or("today")
        ),
    }
}

pub(super) fn array_field<'a>(data: &'a Value, key: &str, command: &str) -> io::Result<&'a Vec<Value>> {
    data.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other(format!("{command} output requires {key}")))
}

pub(super) fn object_field<'a>(data: &'a Value, key: &str, command: &str) -> io::Result<&'a Value> {
    data.get(key)
        .filter(|value| value.is_object())
        .ok_or_else(|| io::Error::other(format!("{command} output requires {key}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_group_change, render_transaction_create, render_transaction_list};

    #[test]
    fn create_summary_lists_installments() {
        let data = json!({
            "organization_id": "org_1",
            "source": "stdin",
            "drafts": 1,
            "planned": 3,
            "inserted": 3,
            "skipped": 0,
            "records": [
                {
                    "expiration_date": "2025-01-10",
                    "description": "TV nova",
                    "category": "Casa",
                    "amount": 40000,
                    "kind": "expense",
                    "type_payment": "installment",
                    "installment_current": 1,
                    "installment_total_payment": 3,
                    "paid": true
                }
            ]
        });

        let rendered = render_transaction_create(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Transactions saved."));
            assert!(text.contains("Planned records:"));
            assert!(text.contains("TV nova"));
            assert!(text.contains("400.00"));
            assert!(text.contains("1/3"));
        }
    }

    #[test]
    fn empty_list_renders_hint() {
        let rendered = render_transaction_list(&json!({"records": [], "count": 0}));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "No transactions match these filters.");
        }
    }

    #[test]
    fn missing_records_is_an_output_error() {
        assert!(render_transaction_list(&json!({"count": 0})).is_err());
    }

    #[test]
    fn group_change_reports_affected_rows() {
        let rendered = render_group_change(
            "txn group delete",
            &json!({"group_installment_id": "grp_1", "affected": 3}),
        );
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "Group grp_1: 3 record(s) deleted.");
        }
    }
}
