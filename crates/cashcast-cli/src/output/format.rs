use std::cmp;

use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
}

impl<'a> Column<'a> {
    pub const fn left(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Left,
        }
    }

    pub const fn right(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Right,
        }
    }
}

const INDENT: usize = 2;
const COLUMN_GAP: usize = 2;

pub fn terminal_width() -> usize {
    let from_env = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    cmp::max(from_env, 40)
}

/// Minor units as a signed decimal with two places (`-1234.56`).
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let absolute = minor_units.unsigned_abs();
    format!("{sign}{}.{:02}", absolute / 100, absolute % 100)
}

pub fn amount_field(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_i64)
        .map(format_amount)
        .unwrap_or_else(|| "-".to_string())
}

pub fn text_field(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => (if *flag { "yes" } else { "no" }).to_string(),
        _ => "-".to_string(),
    }
}

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

/// Aligned table when every column fits `max_width`, otherwise one labelled
/// block per row.
pub fn render_table_or_blocks(
    columns: &[Column<'_>],
    rows: &[Vec<String>],
    max_width: usize,
    block_label: &str,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let widths = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .fold(column.name.len(), cmp::max)
        })
        .collect::<Vec<usize>>();
    let needed = INDENT + widths.iter().sum::<usize>() + COLUMN_GAP * (columns.len() - 1);
    if needed > max_width {
        return render_blocks(columns, rows, block_label);
    }

    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<String>>();
    let mut output = vec![format_row(columns, &header, &widths)];
    output.extend(rows.iter().map(|row| format_row(columns, row, &widths)));
    output
}

fn format_row(columns: &[Column<'_>], cells: &[String], widths: &[usize]) -> String {
    let pieces = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let width = widths.get(index).copied().unwrap_or(0);
            let value = cells.get(index).map(String::as_str).unwrap_or("");
            match column.align {
                Align::Left => format!("{value:<width$}"),
                Align::Right => format!("{value:>width$}"),
            }
        })
        .collect::<Vec<String>>();

    format!("{}{}", " ".repeat(INDENT), pieces.join(&" ".repeat(COLUMN_GAP)))
        .trim_end()
        .to_string()
}

fn render_blocks(columns: &[Column<'_>], rows: &[Vec<String>], block_label: &str) -> Vec<String> {
    let labels = columns
        .iter()
        .map(|column| format!("{}:", column.name))
        .collect::<Vec<String>>();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut output = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        if row_index > 0 {
            output.push(String::new());
        }
        output.push(format!("  {block_label} {}:", row_index + 1));
        for (column_index, label) in labels.iter().enumerate() {
            let value = row.get(column_index).map(String::as_str).unwrap_or("");
            output.push(format!("    {label:<label_width$}  {value}"));
        }
    }
    output
}
