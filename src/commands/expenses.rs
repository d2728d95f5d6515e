// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::currency;
use crate::models::{Expense, MemberId};
use crate::session::Session;
use crate::utils::{
    expense_id, maybe_print_json, member_id, parse_date, parse_decimal, parse_member_list,
    parse_split, pretty_table, scope_arg, trip_id,
};
use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(session, sub)?,
        Some(("list", sub)) => list(session, sub)?,
        Some(("rm", sub)) => {
            let raw = sub.get_one::<String>("id").unwrap();
            let id = expense_id(&session.ledger, raw)?;
            session.mutate(|l| l.remove_expense(&id));
            println!("Removed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let ledger = &session.ledger;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let payer = member_id(ledger, sub.get_one::<String>("payer").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Amount must be positive"));
    }
    let ccy = currency::info(sub.get_one::<String>("currency").unwrap());
    let category = sub.get_one::<String>("category").unwrap().trim().to_string();
    let description = sub
        .get_one::<String>("description")
        .unwrap()
        .trim()
        .to_string();
    let earned = sub
        .get_one::<String>("earned")
        .map(|s| parse_decimal(s))
        .transpose()?;

    let trip = if sub.get_flag("no_trip") {
        None
    } else {
        match sub.get_one::<String>("trip") {
            Some(name) => Some(trip_id(ledger, name)?),
            None => ledger.selected_trip,
        }
    };

    let splits = if let Some(s) = sub.get_one::<String>("split") {
        parse_split(ledger, s)?
    } else {
        let members: Vec<MemberId> = match sub.get_one::<String>("equal") {
            Some(s) => parse_member_list(ledger, s)?,
            None => default_participants(session, trip),
        };
        Expense::equal_split(amount, &members, ccy.decimals)
    };
    if splits.is_empty() {
        return Err(anyhow!("An expense needs at least one member to split with"));
    }

    let expense = Expense {
        id: Uuid::new_v4(),
        amount,
        currency: ccy.code.clone(),
        category,
        description,
        date,
        paid_by: payer,
        splits,
        payer_earned: earned,
        trip_id: trip,
    };
    let payer_name = session.ledger.member_name(&payer);
    let id = session.mutate(|l| l.add_expense(expense));
    println!(
        "Recorded {} paid by {} on {} ({})",
        currency::format_amount(amount, &ccy.code),
        payer_name,
        date,
        id
    );
    Ok(())
}

/// Everyone on the trip when it lists members, otherwise every member.
fn default_participants(session: &Session, trip: Option<Uuid>) -> Vec<MemberId> {
    let l = &session.ledger;
    if let Some(t) = trip.and_then(|t| l.trip(&t)) {
        if !t.member_ids.is_empty() {
            return t.member_ids.clone();
        }
    }
    l.members.iter().map(|m| m.id).collect()
}

fn list(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(session, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.paid_by.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.split_with.join(", "),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Paid by", "Amount", "CCY", "Category", "Description", "Split", "ID"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct ExpenseRow {
    pub id: String,
    pub date: String,
    pub paid_by: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub split_with: Vec<String>,
    pub trip: String,
}

pub fn query_rows(session: &Session, sub: &clap::ArgMatches) -> Result<Vec<ExpenseRow>> {
    let l = &session.ledger;
    let scope = scope_arg(l, sub)?;
    let ccy = sub.get_one::<String>("currency").map(|s| s.trim().to_uppercase());

    let mut items: Vec<&Expense> = l
        .expenses
        .iter()
        .filter(|e| scope.is_none() || e.trip_id == scope)
        .filter(|e| ccy.as_ref().is_none_or(|c| e.currency.eq_ignore_ascii_case(c)))
        .collect();
    // newest first; insertion order breaks ties
    items.reverse();
    items.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        items.truncate(*limit);
    }

    Ok(items
        .into_iter()
        .map(|e| ExpenseRow {
            id: e.id.to_string(),
            date: e.date.to_string(),
            paid_by: l.member_name(&e.paid_by),
            amount: e.amount.to_string(),
            currency: e.currency.clone(),
            category: e.category.clone(),
            description: e.description.clone(),
            split_with: l
                .members
                .iter()
                .filter(|m| e.splits.contains_key(&m.id))
                .map(|m| format!("{}={}", m.name, e.share_of(&m.id)))
                .collect(),
            trip: e
                .trip_id
                .and_then(|t| l.trip(&t))
                .map(|t| t.name.clone())
                .unwrap_or_default(),
        })
        .collect())
}
