// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::currency;
use crate::session::Session;
use crate::utils::{fx_convert, get_base_currency, maybe_print_json, pretty_table, scope_arg};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("totals", sub)) => totals(session, sub)?,
        Some(("categories", sub)) => categories(session, sub)?,
        _ => {}
    }
    Ok(())
}

fn target_currency(session: &Session, sub: &clap::ArgMatches) -> Result<String> {
    match sub.get_one::<String>("currency") {
        Some(c) => Ok(c.trim().to_uppercase()),
        None => get_base_currency(&session.conn),
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct TotalRow {
    pub currency: String,
    pub expenses: usize,
    pub total: String,
    pub converted: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Totals {
    pub target: String,
    pub rows: Vec<TotalRow>,
    pub grand_total: String,
}

fn fixed(amount: Decimal, code: &str) -> String {
    let decimals = currency::info(code).decimals;
    format!("{:.*}", decimals as usize, amount.round_dp(decimals))
}

/// Spend per currency, each also converted into the target currency at the
/// rate in force on the expense date. The grand total is summed before
/// rounding.
pub fn total_rows(session: &Session, sub: &clap::ArgMatches) -> Result<Totals> {
    let l = &session.ledger;
    let scope = scope_arg(l, sub)?;
    let target = target_currency(session, sub)?;
    let mut rows = Vec::new();
    let mut grand = Decimal::ZERO;
    for ccy in l.currencies_in_scope(scope) {
        let mut total = Decimal::ZERO;
        let mut converted = Decimal::ZERO;
        let mut n = 0;
        for e in l.expenses_in(&ccy, scope) {
            total += e.amount;
            converted += fx_convert(&session.conn, e.date, e.amount, &e.currency, &target)?;
            n += 1;
        }
        grand += converted;
        rows.push(TotalRow {
            currency: ccy.clone(),
            expenses: n,
            total: fixed(total, &ccy),
            converted: fixed(converted, &target),
        });
    }
    Ok(Totals {
        grand_total: fixed(grand, &target),
        target,
        rows,
    })
}

fn totals(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let report = total_rows(session, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report.rows)? {
        let mut data: Vec<Vec<String>> = report
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.currency.clone(),
                    r.expenses.to_string(),
                    r.total.clone(),
                    r.converted.clone(),
                ]
            })
            .collect();
        data.push(vec![
            "TOTAL".into(),
            String::new(),
            String::new(),
            report.grand_total.clone(),
        ]);
        let hdr = format!("In {}", report.target);
        println!(
            "{}",
            pretty_table(&["CCY", "Expenses", "Total", &hdr], data)
        );
    }
    Ok(())
}

fn categories(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let l = &session.ledger;
    let scope = scope_arg(l, sub)?;
    let target = target_currency(session, sub)?;
    let mut agg: HashMap<String, Decimal> = HashMap::new();
    for e in l
        .expenses
        .iter()
        .filter(|e| scope.is_none() || e.trip_id == scope)
    {
        let conv = fx_convert(&session.conn, e.date, e.amount, &e.currency, &target)?;
        let cat = if e.category.is_empty() {
            "(uncategorized)".to_string()
        } else {
            e.category.clone()
        };
        *agg.entry(cat).or_insert(Decimal::ZERO) += conv;
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let data: Vec<Vec<String>> = items
        .into_iter()
        .map(|(cat, amt)| vec![cat, fixed(amt, &target)])
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let hdr = format!("Spent ({})", target);
        println!("{}", pretty_table(&["Category", &hdr], data));
    }
    Ok(())
}
