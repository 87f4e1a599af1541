mod support;

use std::path::Path;

use cashcast_client::commands::bills::{
    BillChangeOptions, BillCreateOptions, BillFromTransactionOptions, BillGenerateOptions,
    BillListOptions, BillSuggestOptions, create_with_options, delete_with_options,
    from_transaction_with_options, generate_with_options, list_with_options, pay_with_options,
    suggest_with_options, update_with_options,
};
use cashcast_client::ledger::BillUpdate;
use serde_json::Value;
use support::ledger_testkit::{
    create_organization, day, draft, envelope_data, error_code, ingest, list_records,
    temp_home_in_tmp,
};

const TODAY: &str = "2025-06-15";

fn create_bill(home: &Path, org: &str, description: &str, day_of_month: u32) -> Value {
    envelope_data(create_with_options(BillCreateOptions {
        organization_id: org.to_string(),
        description: description.to_string(),
        company: Some("Vivo".to_string()),
        category: Some("Utilities".to_string()),
        amount: 11_990,
        day_of_month,
        period: None,
        today: Some(day(TODAY)),
        home_override: Some(home),
    }))
    .map(|data| data["bill"].clone())
    .unwrap_or(Value::Null)
}

fn generate(home: &Path, org: &str, period: Option<&str>) -> Value {
    envelope_data(generate_with_options(BillGenerateOptions {
        organization_id: org.to_string(),
        period: period.map(str::to_string),
        today: Some(day(TODAY)),
        home_override: Some(home),
    }))
    .unwrap_or(Value::Null)
}

fn list_bills(home: &Path, org: &str, period: &str, paid: Option<bool>) -> Value {
    envelope_data(list_with_options(BillListOptions {
        organization_id: org.to_string(),
        period: Some(period.to_string()),
        paid,
        today: Some(day(TODAY)),
        home_override: Some(home),
    }))
    .unwrap_or(Value::Null)
}

fn count(value: &Value, field: &str) -> usize {
    value[field].as_array().map(Vec::len).unwrap_or_default()
}

#[test]
fn created_bill_lands_in_the_current_period() {
    let temp = temp_home_in_tmp("cashcast-bills-create-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");

        let bill = create_bill(&home, &org, "Internet", 10);
        assert_eq!(bill["period"], "2025-06");
        assert_eq!(bill["expiration_date"], "2025-06-10");
        assert_eq!(bill["company"], "Vivo");
        assert_eq!(bill["active"], true);
        assert_eq!(bill["paid"], false);

        let duplicate = create_with_options(BillCreateOptions {
            organization_id: org.clone(),
            description: "Internet".to_string(),
            company: Some("Vivo".to_string()),
            amount: 11_990,
            day_of_month: 10,
            today: Some(day(TODAY)),
            home_override: Some(&home),
            ..BillCreateOptions::default()
        });
        assert_eq!(error_code(duplicate), "invalid_argument");

        let short_month = envelope_data(create_with_options(BillCreateOptions {
            organization_id: org.clone(),
            description: "Aluguel".to_string(),
            amount: 180_000,
            day_of_month: 31,
            period: Some("2025-02".to_string()),
            today: Some(day(TODAY)),
            home_override: Some(&home),
            ..BillCreateOptions::default()
        }));
        assert_eq!(
            short_month.map(|data| data["bill"]["expiration_date"].clone()),
            Some(Value::from("2025-02-28"))
        );

        let bad_day = create_with_options(BillCreateOptions {
            organization_id: org,
            description: "Luz".to_string(),
            amount: 9_000,
            day_of_month: 0,
            home_override: Some(&home),
            ..BillCreateOptions::default()
        });
        assert_eq!(error_code(bad_day), "invalid_argument");
    }
}

#[test]
fn generation_is_idempotent_per_period() {
    let temp = temp_home_in_tmp("cashcast-bills-generate-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        create_bill(&home, &org, "Internet", 10);
        create_bill(&home, &org, "Telefone", 20);

        let first = generate(&home, &org, None);
        assert_eq!(first["period"], "2025-07");
        assert_eq!(count(&first, "created"), 2);
        assert_eq!(first["created"][0]["expiration_date"], "2025-07-10");
        assert_eq!(first["created"][0]["paid"], false);

        let second = generate(&home, &org, None);
        assert_eq!(count(&second, "created"), 0);

        let listed = list_bills(&home, &org, "2025-07", None);
        assert_eq!(listed["generated"], 0);
        assert_eq!(count(&listed, "bills"), 2);
    }
}

#[test]
fn listing_an_empty_period_generates_it_first() {
    let temp = temp_home_in_tmp("cashcast-bills-lazy-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        create_bill(&home, &org, "Internet", 10);

        let paid_only = list_bills(&home, &org, "2025-08", Some(true));
        assert_eq!(paid_only["generated"], 0);
        assert_eq!(count(&paid_only, "bills"), 0);

        let listed = list_bills(&home, &org, "2025-08", None);
        assert_eq!(listed["period"], "2025-08");
        assert_eq!(listed["generated"], 1);
        assert_eq!(count(&listed, "bills"), 1);
        assert_eq!(listed["bills"][0]["description"], "Internet");

        let relisted = list_bills(&home, &org, "2025-08", Some(false));
        assert_eq!(relisted["generated"], 0);
        assert_eq!(count(&relisted, "bills"), 1);
    }
}

#[test]
fn inactive_series_stop_generating_and_paid_filter_applies() {
    let temp = temp_home_in_tmp("cashcast-bills-inactive-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        let internet = create_bill(&home, &org, "Internet", 10);
        let phone = create_bill(&home, &org, "Telefone", 20);
        let internet_id = internet["bill_id"].as_str().unwrap_or_default().to_string();
        let phone_id = phone["bill_id"].as_str().unwrap_or_default().to_string();

        let paused = envelope_data(update_with_options(BillChangeOptions {
            organization_id: org.clone(),
            bill_id: phone_id,
            update: BillUpdate {
                active: Some(false),
                ..BillUpdate::default()
            },
            home_override: Some(&home),
        }));
        assert_eq!(
            paused.map(|data| data["bill"]["active"].clone()),
            Some(Value::Bool(false))
        );

        let paid = envelope_data(pay_with_options(&org, &internet_id, Some(&home)));
        assert_eq!(
            paid.map(|data| data["bill"]["paid"].clone()),
            Some(Value::Bool(true))
        );

        let june_paid = list_bills(&home, &org, "2025-06", Some(true));
        assert_eq!(count(&june_paid, "bills"), 1);
        assert_eq!(june_paid["bills"][0]["bill_id"], internet_id.as_str());

        let july = generate(&home, &org, Some("2025-07"));
        assert_eq!(count(&july, "created"), 1);
        assert_eq!(july["created"][0]["description"], "Internet");
        assert_eq!(july["created"][0]["paid"], false);
    }
}

#[test]
fn bill_update_validates_and_delete_reports_missing() {
    let temp = temp_home_in_tmp("cashcast-bills-update-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        let bill = create_bill(&home, &org, "Internet", 10);
        let bill_id = bill["bill_id"].as_str().unwrap_or_default().to_string();

        let empty = update_with_options(BillChangeOptions {
            organization_id: org.clone(),
            bill_id: bill_id.clone(),
            update: BillUpdate::default(),
            home_override: Some(&home),
        });
        assert_eq!(error_code(empty), "invalid_argument");

        let bad_day = update_with_options(BillChangeOptions {
            organization_id: org.clone(),
            bill_id: bill_id.clone(),
            update: BillUpdate {
                day_of_month: Some(32),
                ..BillUpdate::default()
            },
            home_override: Some(&home),
        });
        assert_eq!(error_code(bad_day), "invalid_argument");

        let moved = envelope_data(update_with_options(BillChangeOptions {
            organization_id: org.clone(),
            bill_id: bill_id.clone(),
            update: BillUpdate {
                day_of_month: Some(25),
                amount: Some(12_990),
                ..BillUpdate::default()
            },
            home_override: Some(&home),
        }));
        assert!(moved.is_some());
        if let Some(data) = moved {
            assert_eq!(data["bill"]["expiration_date"], "2025-06-25");
            assert_eq!(data["bill"]["amount"], 12_990);
        }

        let deleted = delete_with_options(&org, &bill_id, Some(&home));
        assert!(deleted.is_ok());
        let again = delete_with_options(&org, &bill_id, Some(&home));
        assert_eq!(error_code(again), "bill_not_found");
    }
}

fn change_bill(home: &Path, org: &str, bill_id: &str, update: BillUpdate) -> Value {
    envelope_data(update_with_options(BillChangeOptions {
        organization_id: org.to_string(),
        bill_id: bill_id.to_string(),
        update,
        home_override: Some(home),
    }))
    .map(|data| data["bill"].clone())
    .unwrap_or(Value::Null)
}

#[test]
fn moving_the_due_day_keeps_one_series() {
    let temp = temp_home_in_tmp("cashcast-bills-moved-day-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        let june = create_bill(&home, &org, "Internet", 10);

        let july = generate(&home, &org, Some("2025-07"));
        assert_eq!(count(&july, "created"), 1);
        assert_eq!(july["created"][0]["series_id"], june["series_id"]);
        let july_id = july["created"][0]["bill_id"].as_str().unwrap_or_default().to_string();

        let moved = change_bill(
            &home,
            &org,
            &july_id,
            BillUpdate {
                day_of_month: Some(15),
                ..BillUpdate::default()
            },
        );
        assert_eq!(moved["expiration_date"], "2025-07-15");

        let august = generate(&home, &org, Some("2025-08"));
        assert_eq!(count(&august, "created"), 1);
        assert_eq!(august["created"][0]["expiration_date"], "2025-08-15");
        assert_eq!(august["created"][0]["series_id"], june["series_id"]);

        let june_listed = list_bills(&home, &org, "2025-06", None);
        assert_eq!(june_listed["bills"][0]["expiration_date"], "2025-06-10");
    }
}

#[test]
fn deactivating_an_earlier_occurrence_stops_the_series() {
    let temp = temp_home_in_tmp("cashcast-bills-deactivate-earlier-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        let june = create_bill(&home, &org, "Academia", 5);
        let june_id = june["bill_id"].as_str().unwrap_or_default().to_string();

        let july = generate(&home, &org, Some("2025-07"));
        assert_eq!(count(&july, "created"), 1);

        let paused = change_bill(
            &home,
            &org,
            &june_id,
            BillUpdate {
                active: Some(false),
                paid: Some(true),
                ..BillUpdate::default()
            },
        );
        assert_eq!(paused["active"], false);

        let july_listed = list_bills(&home, &org, "2025-07", None);
        assert_eq!(count(&july_listed, "bills"), 1);
        assert_eq!(july_listed["bills"][0]["active"], false);
        assert_eq!(july_listed["bills"][0]["paid"], false);

        let august = generate(&home, &org, Some("2025-08"));
        assert_eq!(count(&august, "created"), 0);
    }
}

#[test]
fn transaction_backs_at_most_one_bill() {
    let temp = temp_home_in_tmp("cashcast-bills-source-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        ingest(
            &home,
            &org,
            &[draft("expense", "ledger", "Academia", 9_000, "2025-05-12")],
        );
        let records = list_records(&home, &org, None);
        let record_id = records[0]["record_id"].as_str().unwrap_or_default().to_string();

        let promote = || {
            from_transaction_with_options(BillFromTransactionOptions {
                organization_id: org.clone(),
                record_id: record_id.clone(),
                today: Some(day(TODAY)),
                home_override: Some(&home),
                ..BillFromTransactionOptions::default()
            })
        };

        let first = envelope_data(promote());
        assert!(first.is_some());
        if let Some(data) = first {
            assert_eq!(data["bill"]["day_of_month"], 12);
            assert_eq!(data["bill"]["period"], "2025-06");
            assert_eq!(data["bill"]["amount"], 9_000);
            assert_eq!(data["bill"]["source_transaction_id"], record_id.as_str());
        }

        let second = promote();
        assert!(second.is_err());
        if let Err(error) = second {
            assert_eq!(error.code, "duplicate_bill_source");
            assert!(error.data.is_some());
        }

        let missing = from_transaction_with_options(BillFromTransactionOptions {
            organization_id: org.clone(),
            record_id: "rec_missing".to_string(),
            home_override: Some(&home),
            ..BillFromTransactionOptions::default()
        });
        assert_eq!(error_code(missing), "record_not_found");
    }
}

#[test]
fn suggestions_flag_series_already_tracked() {
    let temp = temp_home_in_tmp("cashcast-bills-suggest-");
    assert!(temp.is_ok());
    if let Ok((_guard, home)) = temp {
        let org = create_organization(&home, "Casa");
        ingest(
            &home,
            &org,
            &[
                draft("expense", "ledger", "Aluguel", 180_000, "2025-02-05"),
                draft("expense", "ledger", "Aluguel", 180_000, "2025-03-05"),
                draft("expense", "ledger", "Aluguel", 180_000, "2025-04-05"),
                draft("credit", "ledger", "Netflix", 5_590, "2025-04-07"),
                draft("credit", "ledger", "Netflix", 5_590, "2025-05-07"),
                // Before the five-month lookback.
                draft("expense", "ledger", "Seguro", 30_000, "2024-11-10"),
                draft("expense", "ledger", "Seguro", 30_000, "2024-12-10"),
            ],
        );

        let suggest = || {
            envelope_data(suggest_with_options(BillSuggestOptions {
                organization_id: org.clone(),
                today: Some(day(TODAY)),
                home_override: Some(&home),
                ..BillSuggestOptions::default()
            }))
            .unwrap_or(Value::Null)
        };

        let before = suggest();
        assert_eq!(before["window_months"], 5);
        assert_eq!(count(&before, "suggestions"), 2);
        let rent = &before["suggestions"][0];
        assert_eq!(rent["description"], "Aluguel");
        assert_eq!(rent["day_of_month"], 5);
        assert_eq!(rent["recurrence_count"], 3);
        assert_eq!(rent["already_tracked"], false);

        let source = rent["source_transaction_id"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let promoted = from_transaction_with_options(BillFromTransactionOptions {
            organization_id: org.clone(),
            record_id: source,
            today: Some(day(TODAY)),
            home_override: Some(&home),
            ..BillFromTransactionOptions::default()
        });
        assert!(promoted.is_ok());

        let after = suggest();
        assert_eq!(after["suggestions"][0]["already_tracked"], true);
        assert_eq!(after["suggestions"][1]["description"], "Netflix");
        assert_eq!(after["suggestions"][1]["already_tracked"], false);
    }
}
