// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::currency::format_amount;
use crate::error::SplitError;
use crate::ledger::Ledger;
use crate::models::{PaymentDetails, TripId};
use crate::session::Session;
use crate::settlement::EPSILON;
use crate::utils::{
    expense_id, maybe_print_json, member_id, parse_decimal, parse_expense_ids, parse_uuid,
    pretty_table, scope_arg,
};
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balances", sub)) => balances(session, sub)?,
        Some(("plan", sub)) => plan(session, sub)?,
        Some(("owed", sub)) => owed(session, sub)?,
        Some(("breakdown", sub)) => breakdown(session, sub)?,
        Some(("mark", sub)) => {
            let (d, c) = pair(&session.ledger, sub)?;
            session.mutate(|l| l.mark_fully_paid(d, c));
            println!(
                "Marked {} -> {} as fully paid",
                session.ledger.member_name(&d),
                session.ledger.member_name(&c)
            );
        }
        Some(("unmark", sub)) => {
            let (d, c) = pair(&session.ledger, sub)?;
            if session.mutate(|l| l.clear_settled_pair(&d, &c)) {
                println!("Cleared fully-paid mark");
            } else {
                println!("Nothing was marked for that pair");
            }
        }
        Some(("pay", sub)) => pay(session, sub)?,
        Some(("payments", sub)) => payments(session, sub)?,
        Some(("unpay", sub)) => {
            let raw = sub.get_one::<String>("id").unwrap();
            let id = parse_uuid(raw)?;
            if !session.mutate(|l| l.remove_payment(&id)) {
                return Err(SplitError::PaymentNotFound(raw.trim().to_string()).into());
            }
            println!("Removed payment {}", id);
        }
        Some(("paid", sub)) => {
            let (d, c) = pair(&session.ledger, sub)?;
            let e = expense_id(&session.ledger, sub.get_one::<String>("expense").unwrap())?;
            let paid = !sub.get_flag("undo");
            session.mutate(|l| l.set_expense_paid(d, c, e, paid));
            println!(
                "Expense {} {} as paid",
                e,
                if paid { "marked" } else { "unmarked" }
            );
        }
        _ => {}
    }
    Ok(())
}

fn pair(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<(uuid::Uuid, uuid::Uuid)> {
    let d = member_id(ledger, sub.get_one::<String>("from").unwrap())?;
    let c = member_id(ledger, sub.get_one::<String>("to").unwrap())?;
    if d == c {
        return Err(anyhow!("Debtor and creditor must differ"));
    }
    Ok((d, c))
}

fn currencies(ledger: &Ledger, sub: &clap::ArgMatches, scope: Option<TripId>) -> Vec<String> {
    match sub.get_one::<String>("currency") {
        Some(c) => vec![c.trim().to_uppercase()],
        None => ledger.currencies_in_scope(scope),
    }
}

#[derive(Serialize)]
pub struct BalanceRow {
    pub member: String,
    pub currency: String,
    pub net: String,
}

pub fn balance_rows(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<Vec<BalanceRow>> {
    let scope = scope_arg(ledger, sub)?;
    let mut rows = Vec::new();
    for ccy in currencies(ledger, sub, scope) {
        for b in ledger.balances(&ccy, scope) {
            rows.push(BalanceRow {
                member: ledger.member_name(&b.member),
                currency: ccy.clone(),
                net: b.net.to_string(),
            });
        }
    }
    Ok(rows)
}

fn balances(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let rows = balance_rows(&session.ledger, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .iter()
            .map(|r| {
                let net = parse_decimal(&r.net).unwrap_or_default();
                let state = if net.abs() <= EPSILON {
                    "settled"
                } else if net.is_sign_positive() {
                    "is owed"
                } else {
                    "owes"
                };
                vec![
                    r.member.clone(),
                    format_amount(net, &r.currency),
                    state.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Member", "Net", ""], data));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransferRow {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub currency: String,
}

pub fn plan_rows(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<Vec<TransferRow>> {
    let scope = scope_arg(ledger, sub)?;
    let mut rows = Vec::new();
    for ccy in currencies(ledger, sub, scope) {
        for t in ledger.settlement_transfers(&ccy, scope) {
            rows.push(TransferRow {
                from: ledger.member_name(&t.from),
                to: ledger.member_name(&t.to),
                amount: t.amount.to_string(),
                currency: ccy.clone(),
            });
        }
    }
    Ok(rows)
}

fn plan(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let rows = plan_rows(&session.ledger, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        if rows.is_empty() {
            println!("Everyone is settled up");
            return Ok(());
        }
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.from.clone(),
                    r.to.clone(),
                    format_amount(parse_decimal(&r.amount).unwrap_or_default(), &r.currency),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["From", "To", "Amount"], data));
    }
    Ok(())
}

fn owed(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let l = &session.ledger;
    let (d, c) = pair(l, sub)?;
    let ccy = sub.get_one::<String>("currency").unwrap().trim().to_uppercase();
    let scope = scope_arg(l, sub)?;
    let active = l.amount_owed_active_only(&d, &c, &ccy, scope);
    let paid = l.total_paid_from_to(&d, &c);
    let unallocated = l.unallocated_payment_total(&d, &c);
    println!(
        "{} owes {} {} (payments recorded: {}, unallocated: {})",
        l.member_name(&d),
        l.member_name(&c),
        format_amount(active, &ccy),
        format_amount(paid, &ccy),
        format_amount(unallocated, &ccy)
    );
    Ok(())
}

fn breakdown(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let l = &session.ledger;
    let (d, c) = pair(l, sub)?;
    let ccy = sub.get_one::<String>("currency").unwrap().trim().to_uppercase();
    let scope = scope_arg(l, sub)?;
    let rows = l.contributing_expenses(&d, &c, &ccy, scope);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.date.to_string(),
                    r.description.clone(),
                    format_amount(r.share, &ccy),
                    format_amount(r.paid_toward, &ccy),
                    contribution_state(r.settled, r.marked_paid).to_string(),
                    r.expense_id.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Description", "Share", "Paid", "State", "ID"], data)
        );
    }
    Ok(())
}

fn contribution_state(settled: bool, marked_paid: bool) -> &'static str {
    if settled {
        "settled"
    } else if marked_paid {
        "paid"
    } else {
        "open"
    }
}

fn pay(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let (d, c) = pair(&session.ledger, sub)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let opt = |k: &str| -> Result<_> {
        sub.get_one::<String>(k).map(|s| parse_decimal(s)).transpose()
    };
    let details = PaymentDetails {
        amount_received: opt("received")?,
        change_given_back: opt("change")?,
        amount_forgiven: opt("forgiven")?,
        allocated_expense_ids: match sub.get_one::<String>("expenses") {
            Some(s) => parse_expense_ids(&session.ledger, s)?,
            None => Vec::new(),
        },
    };
    let p = session.mutate(|l| l.record_payment(d, c, amount, details));
    println!(
        "Recorded payment {} from {} to {} ({})",
        p.amount,
        session.ledger.member_name(&d),
        session.ledger.member_name(&c),
        p.id
    );
    Ok(())
}

#[derive(Serialize)]
pub struct PaymentRow {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub received: String,
    pub change: String,
    pub forgiven: String,
    pub expenses: usize,
    pub recorded_at: String,
}

fn payments(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let l = &session.ledger;
    let from = sub
        .get_one::<String>("from")
        .map(|s| member_id(l, s))
        .transpose()?;
    let to = sub
        .get_one::<String>("to")
        .map(|s| member_id(l, s))
        .transpose()?;
    let show = |d: Option<rust_decimal::Decimal>| d.map(|v| v.to_string()).unwrap_or_default();
    let rows: Vec<PaymentRow> = l
        .payments
        .iter()
        .filter(|p| from.is_none_or(|f| p.debtor == f))
        .filter(|p| to.is_none_or(|t| p.creditor == t))
        .map(|p| PaymentRow {
            id: p.id.to_string(),
            from: l.member_name(&p.debtor),
            to: l.member_name(&p.creditor),
            amount: p.amount.to_string(),
            received: show(p.amount_received),
            change: show(p.change_given_back),
            forgiven: show(p.amount_forgiven),
            expenses: p.allocated_expense_ids.len(),
            recorded_at: p.recorded_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.recorded_at.clone(),
                    r.from.clone(),
                    r.to.clone(),
                    r.amount.clone(),
                    r.received.clone(),
                    r.change.clone(),
                    r.forgiven.clone(),
                    r.expenses.to_string(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["When", "From", "To", "Amount", "Received", "Change", "Forgiven", "Expenses", "ID"],
                data
            )
        );
    }
    Ok(())
}
