// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::SplitError;
use crate::ledger::Ledger;
use crate::models::{ExpenseId, MemberId, TripId};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

const UA: &str = concat!(
    "splitclip/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/splitclip)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).with_context(|| format!("Invalid id '{}'", s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn member_id(ledger: &Ledger, name: &str) -> Result<MemberId> {
    ledger
        .member_by_name(name)
        .map(|m| m.id)
        .ok_or_else(|| SplitError::MemberNotFound(name.trim().to_string()).into())
}

pub fn trip_id(ledger: &Ledger, name: &str) -> Result<TripId> {
    ledger
        .trip_by_name(name)
        .map(|t| t.id)
        .ok_or_else(|| SplitError::TripNotFound(name.trim().to_string()).into())
}

/// `--trip NAME` if given, else the selected trip, else every expense.
pub fn scope_arg(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<Option<TripId>> {
    if sub.get_flag("all") {
        return Ok(None);
    }
    match sub.get_one::<String>("trip") {
        Some(name) => Ok(Some(trip_id(ledger, name)?)),
        None => Ok(ledger.selected_trip),
    }
}

/// Comma separated member names.
pub fn parse_member_list(ledger: &Ledger, s: &str) -> Result<Vec<MemberId>> {
    let mut out = Vec::new();
    for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let id = member_id(ledger, name)?;
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// `Ali=100,Bob=50.5`
pub fn parse_split(ledger: &Ledger, s: &str) -> Result<BTreeMap<MemberId, Decimal>> {
    let mut out = BTreeMap::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, amt) = part
            .split_once('=')
            .ok_or_else(|| SplitError::InvalidSplit(part.to_string()))?;
        let id = member_id(ledger, name)?;
        let amt = parse_decimal(amt)
            .with_context(|| format!("Invalid share for '{}'", name.trim()))?;
        *out.entry(id).or_insert(Decimal::ZERO) += amt;
    }
    Ok(out)
}

pub fn expense_id(ledger: &Ledger, raw: &str) -> Result<ExpenseId> {
    let id = parse_uuid(raw)?;
    if ledger.expense(&id).is_none() {
        return Err(SplitError::ExpenseNotFound(raw.trim().to_string()).into());
    }
    Ok(id)
}

pub fn parse_expense_ids(ledger: &Ledger, s: &str) -> Result<Vec<ExpenseId>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| expense_id(ledger, p))
        .collect()
}

// Base currency settings
pub fn get_base_currency(conn: &Connection) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='base_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('base_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy],
    )?;
    Ok(())
}

/// Convert an amount from 'from_ccy' to 'to_ccy' using the closest on-or-before rate.
/// We store base->quote rates. If pair not found directly, we attempt via the base currency hub.
pub fn fx_convert(
    conn: &Connection,
    date: NaiveDate,
    amount: Decimal,
    from_ccy: &str,
    to_ccy: &str,
) -> Result<Decimal> {
    if from_ccy == to_ccy {
        return Ok(amount);
    }
    let hub = get_base_currency(conn)?;

    if to_ccy == hub {
        if let Some(r) = find_rate(conn, date, &hub, from_ccy)? {
            if r.is_zero() {
                return Ok(amount);
            }
            return Ok(amount / r);
        }
    } else if from_ccy == hub {
        if let Some(r) = find_rate(conn, date, &hub, to_ccy)? {
            return Ok(amount * r);
        }
    } else {
        let base_amt = fx_convert(conn, date, amount, from_ccy, &hub)?;
        return fx_convert(conn, date, base_amt, &hub, to_ccy);
    }

    // Try reciprocal last
    if let Some(r) = find_rate(conn, date, to_ccy, from_ccy)? {
        if r.is_zero() {
            return Ok(amount);
        }
        return Ok(amount / r);
    }

    Ok(amount)
}

pub fn find_rate(
    conn: &Connection,
    date: NaiveDate,
    base: &str,
    quote: &str,
) -> Result<Option<Decimal>> {
    let mut stmt = conn.prepare_cached(
        "SELECT rate FROM fx_rates WHERE base=?1 AND quote=?2 AND date<=?3 ORDER BY date DESC LIMIT 1",
    )?;
    let r: Option<String> = stmt
        .query_row(params![base, quote, date.to_string()], |r| r.get(0))
        .optional()?;
    if let Some(s) = r {
        let d = s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid rate '{}' for {}/{}", s, base, quote))?;
        Ok(Some(d))
    } else {
        Ok(None)
    }
}
