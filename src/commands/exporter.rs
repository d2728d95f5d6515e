// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use anyhow::{Result, anyhow};
use serde_json::json;

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(ledger, sub),
        _ => Ok(()),
    }
}

/// One row per (expense, member share); the payer column repeats. An
/// expense without shares gets a single row with empty member columns.
fn export_expenses(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut expenses: Vec<_> = ledger.expenses.iter().collect();
    expenses.sort_by_key(|e| e.date);

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id", "date", "paid_by", "amount", "currency", "category", "description",
                "member", "share", "trip",
            ])?;
            for e in &expenses {
                let trip = e
                    .trip_id
                    .and_then(|t| ledger.trip(&t))
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                let mut shares: Vec<(String, String)> = e
                    .splits
                    .iter()
                    .map(|(m, share)| (ledger.member_name(m), share.to_string()))
                    .collect();
                // unsplit expenses still get a row
                if shares.is_empty() {
                    shares.push((String::new(), String::new()));
                }
                for (member, share) in shares {
                    wtr.write_record([
                        e.id.to_string(),
                        e.date.to_string(),
                        ledger.member_name(&e.paid_by),
                        e.amount.to_string(),
                        e.currency.clone(),
                        e.category.clone(),
                        e.description.clone(),
                        member,
                        share,
                        trip.clone(),
                    ])?;
                }
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = expenses
                .iter()
                .map(|e| {
                    let splits: serde_json::Map<String, serde_json::Value> = e
                        .splits
                        .iter()
                        .map(|(m, s)| (ledger.member_name(m), json!(s.to_string())))
                        .collect();
                    json!({
                        "id": e.id.to_string(),
                        "date": e.date.to_string(),
                        "paid_by": ledger.member_name(&e.paid_by),
                        "amount": e.amount.to_string(),
                        "currency": e.currency,
                        "category": e.category,
                        "description": e.description,
                        "payer_earned": e.payer_earned.map(|d| d.to_string()),
                        "splits": splits,
                        "trip": e.trip_id.and_then(|t| ledger.trip(&t)).map(|t| t.name.clone()),
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
        }
    }
    println!("Exported expenses to {}", out);
    Ok(())
}
