// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use splitclip::commands::{fx, reports};
use splitclip::models::Expense;
use splitclip::session::Session;
use splitclip::{cli, db};
use uuid::Uuid;

fn setup() -> Session {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO settings(key,value) VALUES('base_currency','USD')",
        [],
    )
    .unwrap();
    Session::open(conn).unwrap()
}

#[test]
fn fx_triangulation_and_reciprocal() {
    let s = setup();
    let conn = &s.conn;
    // USD->INR and USD->EUR available
    conn.execute(
        "INSERT INTO fx_rates(date,base,quote,rate) VALUES (?1,?2,?3,?4)",
        params!["2025-08-01", "USD", "INR", "83"],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO fx_rates(date,base,quote,rate) VALUES (?1,?2,?3,?4)",
        params!["2025-08-01", "USD", "EUR", "0.90"],
    )
    .unwrap();

    // EUR 90 -> INR ? via USD hub
    let amt = Decimal::new(9000, 2);
    let res = splitclip::utils::fx_convert(
        conn,
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
        amt,
        "EUR",
        "INR",
    )
    .unwrap();
    // 90 EUR -> USD = 90 / 0.90 = 100 USD; -> INR = 100 * 83 = 8300
    assert_eq!(format!("{:.2}", res.round_dp(2)), "8300.00");

    // Reciprocal: INR -> USD using only USD->INR
    let amt_inr = Decimal::new(16600, 2);
    let res2 = splitclip::utils::fx_convert(
        conn,
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
        amt_inr,
        "INR",
        "USD",
    )
    .unwrap();
    assert_eq!(format!("{:.2}", res2.round_dp(2)), "2.00");
}

#[test]
fn totals_convert_each_expense_at_its_date() {
    let mut s = setup();
    let cli = cli::build_cli();
    for (date, rate) in [("2025-07-01", "0.80"), ("2025-08-01", "0.90")] {
        let m = cli.clone().get_matches_from([
            "splitclip", "fx", "add", "--date", date, "--base", "usd", "--quote", "eur",
            "--rate", rate,
        ]);
        if let Some(("fx", fx_m)) = m.subcommand() {
            fx::handle(&s, fx_m).unwrap();
        } else {
            panic!("fx command not parsed");
        }
    }

    s.mutate(|l| {
        let ali = l.add_member("Ali");
        for (d, amount, ccy) in [(7, 8, "EUR"), (8, 9, "EUR"), (8, 5, "USD")] {
            let mut splits = std::collections::BTreeMap::new();
            splits.insert(ali, Decimal::new(amount, 0));
            l.add_expense(Expense {
                id: Uuid::new_v4(),
                amount: Decimal::new(amount, 0),
                currency: ccy.into(),
                category: "Food".into(),
                description: String::new(),
                date: NaiveDate::from_ymd_opt(2025, d, 15).unwrap(),
                paid_by: ali,
                splits,
                payer_earned: None,
                trip_id: None,
            });
        }
    });

    let m = cli.get_matches_from(["splitclip", "report", "totals"]);
    let Some(("report", rep)) = m.subcommand() else {
        panic!("report command not parsed");
    };
    let Some(("totals", totals_m)) = rep.subcommand() else {
        panic!("totals not parsed");
    };
    let report = reports::total_rows(&s, totals_m).unwrap();
    assert_eq!(report.target, "USD");
    let rows = &report.rows;
    // 8 EUR / 0.80 = 10 USD, 9 EUR / 0.90 = 10 USD
    assert_eq!(rows[0].currency, "EUR");
    assert_eq!(rows[0].expenses, 2);
    assert_eq!(rows[0].total, "17.00");
    assert_eq!(rows[0].converted, "20.00");
    assert_eq!(rows[1].converted, "5.00");
    assert_eq!(report.grand_total, "25.00");
}

#[test]
fn totals_use_target_precision_and_sum_before_rounding() {
    let mut s = setup();
    for (quote, rate) in [("JPY", "150"), ("EUR", "0.5")] {
        s.conn
            .execute(
                "INSERT INTO fx_rates(date,base,quote,rate) VALUES (?1,?2,?3,?4)",
                params!["2025-08-01", "USD", quote, rate],
            )
            .unwrap();
    }
    s.mutate(|l| {
        let ali = l.add_member("Ali");
        // 1.003 USD -> 150.45 JPY, 1.0015 EUR -> 2.003 USD -> 300.45 JPY
        for (amount, ccy) in [(Decimal::new(1003, 3), "USD"), (Decimal::new(10015, 4), "EUR")] {
            let mut splits = std::collections::BTreeMap::new();
            splits.insert(ali, amount);
            l.add_expense(Expense {
                id: Uuid::new_v4(),
                amount,
                currency: ccy.into(),
                category: "Food".into(),
                description: String::new(),
                date: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
                paid_by: ali,
                splits,
                payer_earned: None,
                trip_id: None,
            });
        }
    });

    let m = cli::build_cli().get_matches_from(["splitclip", "report", "totals", "--currency", "jpy"]);
    let Some(("report", rep)) = m.subcommand() else {
        panic!("report command not parsed");
    };
    let Some(("totals", totals_m)) = rep.subcommand() else {
        panic!("totals not parsed");
    };
    let report = reports::total_rows(&s, totals_m).unwrap();
    assert_eq!(report.target, "JPY");
    assert_eq!(report.rows[0].converted, "150");
    assert_eq!(report.rows[1].converted, "300");
    // 450.90 rounds to 451, not 150 + 300
    assert_eq!(report.grand_total, "451");
}

#[test]
fn fx_add_rejects_non_positive_rate() {
    let s = setup();
    let m = cli::build_cli().get_matches_from([
        "splitclip", "fx", "add", "--date", "2025-01-01", "--base", "USD", "--quote", "EUR",
        "--rate", "0",
    ]);
    let Some(("fx", fx_m)) = m.subcommand() else {
        panic!("fx command not parsed");
    };
    let err = fx::handle(&s, fx_m).unwrap_err();
    assert!(err.to_string().contains("Rate must be positive"));
}
