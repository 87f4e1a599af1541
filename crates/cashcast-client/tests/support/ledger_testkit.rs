#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};

use cashcast_client::ClientResult;
use cashcast_client::commands::organizations::{
    BankCreateOptions, OrganizationCreateOptions, create_bank_with_options, create_with_options,
};
use cashcast_client::commands::transactions::{
    TransactionCreateOptions, TransactionListOptions,
    create_with_options as create_transactions_with_options, list_with_options,
};
use cashcast_client::contracts::envelope::SuccessEnvelope;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tempfile::{Builder, TempDir};

pub fn temp_home_in_tmp(prefix: &str) -> io::Result<(TempDir, PathBuf)> {
    let temp = Builder::new().prefix(prefix).tempdir_in("/tmp")?;
    let home = temp.path().join("ledger-home");
    std::fs::create_dir_all(&home)?;
    Ok((temp, home))
}

pub fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

pub fn envelope_data(result: ClientResult<SuccessEnvelope>) -> Option<Value> {
    assert!(result.is_ok(), "command failed: {result:?}");
    result.ok().map(|envelope| envelope.data)
}

pub fn error_code<T: std::fmt::Debug>(result: ClientResult<T>) -> String {
    assert!(result.is_err(), "expected failure, got {result:?}");
    match result {
        Err(error) => error.code,
        Ok(_) => String::new(),
    }
}

pub fn create_organization(home: &Path, name: &str) -> String {
    let data = envelope_data(create_with_options(OrganizationCreateOptions {
        name: name.to_string(),
        home_override: Some(home),
    }));
    data.and_then(|value| {
        value["organization"]["organization_id"]
            .as_str()
            .map(str::to_string)
    })
    .unwrap_or_default()
}

pub fn create_bank(home: &Path, organization_id: &str, name: &str) -> String {
    let data = envelope_data(create_bank_with_options(BankCreateOptions {
        organization_id: organization_id.to_string(),
        name: name.to_string(),
        home_override: Some(home),
    }));
    data.and_then(|value| value["bank"]["bank_id"].as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn draft(kind: &str, book: &str, description: &str, amount: i64, date: &str) -> Value {
    json!({
        "kind": kind,
        "book": book,
        "description": description,
        "amount": amount,
        "expiration_date": date,
    })
}

pub fn with_fields(mut draft: Value, fields: Value) -> Value {
    if let (Some(target), Some(extra)) = (draft.as_object_mut(), fields.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    draft
}

pub fn submit_drafts(
    home: &Path,
    organization_id: &str,
    drafts: &[Value],
) -> ClientResult<SuccessEnvelope> {
    create_transactions_with_options(TransactionCreateOptions {
        organization_id: organization_id.to_string(),
        path: None,
        stdin_override: Some(Value::Array(drafts.to_vec()).to_string()),
        cache: None,
        home_override: Some(home),
    })
}

pub fn ingest(home: &Path, organization_id: &str, drafts: &[Value]) -> Value {
    envelope_data(submit_drafts(home, organization_id, drafts)).unwrap_or(Value::Null)
}

pub fn list_records(home: &Path, organization_id: &str, book: Option<&str>) -> Vec<Value> {
    let data = envelope_data(list_with_options(TransactionListOptions {
        organization_id: organization_id.to_string(),
        book: book.map(str::to_string),
        home_override: Some(home),
        ..TransactionListOptions::default()
    }));
    data.and_then(|value| value["records"].as_array().cloned())
        .unwrap_or_default()
}
