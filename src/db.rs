// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::SplitError;
use crate::ledger::Ledger;
use crate::models::{Expense, Member, PaidExpenseMark, PairKey, SettlementPayment, Trip};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Splitclip", "splitclip"));

/// Overrides the database location when set.
pub const DB_ENV: &str = "SPLITCLIP_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("splitclip.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS members(
        pos INTEGER NOT NULL,
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        joined_at TEXT
    );

    CREATE TABLE IF NOT EXISTS trips(
        pos INTEGER NOT NULL,
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS trip_members(
        trip_id TEXT NOT NULL,
        pos INTEGER NOT NULL,
        member_id TEXT NOT NULL,
        PRIMARY KEY(trip_id, member_id),
        FOREIGN KEY(trip_id) REFERENCES trips(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS expenses(
        pos INTEGER NOT NULL,
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        paid_by TEXT NOT NULL,
        payer_earned TEXT,
        trip_id TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

    CREATE TABLE IF NOT EXISTS expense_splits(
        expense_id TEXT NOT NULL,
        member_id TEXT NOT NULL,
        amount TEXT NOT NULL,
        PRIMARY KEY(expense_id, member_id),
        FOREIGN KEY(expense_id) REFERENCES expenses(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS payments(
        pos INTEGER NOT NULL,
        id TEXT PRIMARY KEY,
        debtor TEXT NOT NULL,
        creditor TEXT NOT NULL,
        amount TEXT NOT NULL,
        amount_received TEXT,
        change_given_back TEXT,
        amount_forgiven TEXT,
        recorded_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS payment_allocations(
        payment_id TEXT NOT NULL,
        pos INTEGER NOT NULL,
        expense_id TEXT NOT NULL,
        FOREIGN KEY(payment_id) REFERENCES payments(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS paid_marks(
        debtor TEXT NOT NULL,
        creditor TEXT NOT NULL,
        expense_id TEXT NOT NULL,
        PRIMARY KEY(debtor, creditor, expense_id)
    );

    CREATE TABLE IF NOT EXISTS settled_pairs(
        debtor TEXT NOT NULL,
        creditor TEXT NOT NULL,
        expense_id TEXT NOT NULL,
        PRIMARY KEY(debtor, creditor, expense_id)
    );

    CREATE TABLE IF NOT EXISTS settled_members(
        member_id TEXT PRIMARY KEY
    );

    -- FX rates: store base->quote rate (1 base = rate quote) per day
    CREATE TABLE IF NOT EXISTS fx_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        base TEXT NOT NULL,
        quote TEXT NOT NULL,
        rate TEXT NOT NULL,
        UNIQUE(date, base, quote)
    );
    "#,
    )?;
    Ok(())
}

fn uuid_col(table: &'static str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        SplitError::CorruptRow {
            table,
            detail: format!("bad id '{}': {}", s, e),
        }
        .into()
    })
}

fn dec_col(table: &'static str, s: &str) -> Result<Decimal> {
    s.parse::<Decimal>().map_err(|e| {
        SplitError::CorruptRow {
            table,
            detail: format!("bad amount '{}': {}", s, e),
        }
        .into()
    })
}

fn opt_dec_col(table: &'static str, s: Option<String>) -> Result<Option<Decimal>> {
    s.map(|v| dec_col(table, &v)).transpose()
}

fn ts_col(table: &'static str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            SplitError::CorruptRow {
                table,
                detail: format!("bad timestamp '{}': {}", s, e),
            }
            .into()
        })
}

fn opt_dec_text(d: Option<Decimal>) -> Option<String> {
    d.map(|v| v.to_string())
}

/// Rebuilds the ledger from the stored snapshot.
pub fn load_ledger(conn: &Connection) -> Result<Ledger> {
    let mut ledger = Ledger::new();

    let mut stmt = conn.prepare("SELECT id, name, joined_at FROM members ORDER BY pos")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
        ))
    })?;
    for row in rows {
        let (id, name, joined) = row?;
        ledger.members.push(Member {
            id: uuid_col("members", &id)?,
            name,
            joined_at: joined.map(|j| ts_col("members", &j)).transpose()?,
        });
    }

    let mut stmt = conn.prepare("SELECT id, name, created_at FROM trips ORDER BY pos")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut stmt_tm =
        conn.prepare("SELECT member_id FROM trip_members WHERE trip_id=?1 ORDER BY pos")?;
    for row in rows {
        let (id, name, created) = row?;
        let mut member_ids = Vec::new();
        let ms = stmt_tm.query_map(params![id], |r| r.get::<_, String>(0))?;
        for m in ms {
            member_ids.push(uuid_col("trip_members", &m?)?);
        }
        ledger.trips.push(Trip {
            id: uuid_col("trips", &id)?,
            name,
            member_ids,
            created_at: ts_col("trips", &created)?,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT id, date, amount, currency, category, description, paid_by, payer_earned, trip_id
         FROM expenses ORDER BY pos",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, Option<String>>(7)?,
            r.get::<_, Option<String>>(8)?,
        ))
    })?;
    let mut stmt_s =
        conn.prepare("SELECT member_id, amount FROM expense_splits WHERE expense_id=?1")?;
    for row in rows {
        let (id, date, amount, currency, category, description, paid_by, earned, trip) = row?;
        let mut splits = BTreeMap::new();
        let ss = stmt_s.query_map(params![id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        for s in ss {
            let (m, a) = s?;
            splits.insert(
                uuid_col("expense_splits", &m)?,
                dec_col("expense_splits", &a)?,
            );
        }
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
            SplitError::CorruptRow {
                table: "expenses",
                detail: format!("bad date '{}': {}", date, e),
            }
        })?;
        ledger.expenses.push(Expense {
            id: uuid_col("expenses", &id)?,
            amount: dec_col("expenses", &amount)?,
            currency,
            category,
            description,
            date,
            paid_by: uuid_col("expenses", &paid_by)?,
            splits,
            payer_earned: opt_dec_col("expenses", earned)?,
            trip_id: trip.map(|t| uuid_col("expenses", &t)).transpose()?,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT id, debtor, creditor, amount, amount_received, change_given_back, amount_forgiven, recorded_at
         FROM payments ORDER BY pos",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, Option<String>>(6)?,
            r.get::<_, String>(7)?,
        ))
    })?;
    let mut stmt_a = conn
        .prepare("SELECT expense_id FROM payment_allocations WHERE payment_id=?1 ORDER BY pos")?;
    for row in rows {
        let (id, debtor, creditor, amount, received, change, forgiven, recorded) = row?;
        let mut allocated = Vec::new();
        let aa = stmt_a.query_map(params![id], |r| r.get::<_, String>(0))?;
        for a in aa {
            allocated.push(uuid_col("payment_allocations", &a?)?);
        }
        ledger.payments.push(SettlementPayment {
            id: uuid_col("payments", &id)?,
            debtor: uuid_col("payments", &debtor)?,
            creditor: uuid_col("payments", &creditor)?,
            amount: dec_col("payments", &amount)?,
            amount_received: opt_dec_col("payments", received)?,
            change_given_back: opt_dec_col("payments", change)?,
            amount_forgiven: opt_dec_col("payments", forgiven)?,
            allocated_expense_ids: allocated,
            recorded_at: ts_col("payments", &recorded)?,
        });
    }

    let mut stmt = conn.prepare("SELECT debtor, creditor, expense_id FROM paid_marks")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (d, c, e) = row?;
        ledger.paid_marks.insert(PaidExpenseMark {
            debtor: uuid_col("paid_marks", &d)?,
            creditor: uuid_col("paid_marks", &c)?,
            expense_id: uuid_col("paid_marks", &e)?,
        });
    }

    let mut stmt = conn.prepare("SELECT debtor, creditor, expense_id FROM settled_pairs")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (d, c, e) = row?;
        let key = PairKey::new(
            uuid_col("settled_pairs", &d)?,
            uuid_col("settled_pairs", &c)?,
        );
        ledger
            .settled_by_pair
            .entry(key)
            .or_default()
            .insert(uuid_col("settled_pairs", &e)?);
    }

    let mut stmt = conn.prepare("SELECT member_id FROM settled_members")?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    for row in rows {
        ledger
            .settled_members
            .insert(uuid_col("settled_members", &row?)?);
    }

    let selected: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='selected_trip'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    ledger.selected_trip = selected
        .map(|s| uuid_col("settings", &s))
        .transpose()?
        .filter(|t| ledger.trip(t).is_some());

    debug!(
        members = ledger.members.len(),
        expenses = ledger.expenses.len(),
        payments = ledger.payments.len(),
        "ledger loaded"
    );
    Ok(ledger)
}

/// Replaces the stored snapshot with `ledger` in one transaction.
pub fn save_ledger(conn: &mut Connection, ledger: &Ledger) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "DELETE FROM payment_allocations;
         DELETE FROM payments;
         DELETE FROM expense_splits;
         DELETE FROM expenses;
         DELETE FROM trip_members;
         DELETE FROM trips;
         DELETE FROM members;
         DELETE FROM paid_marks;
         DELETE FROM settled_pairs;
         DELETE FROM settled_members;
         DELETE FROM settings WHERE key='selected_trip';",
    )?;
    write_snapshot(&tx, ledger)?;
    tx.commit()?;
    debug!(expenses = ledger.expenses.len(), "ledger saved");
    Ok(())
}

fn write_snapshot(tx: &Transaction<'_>, ledger: &Ledger) -> Result<()> {
    for (pos, m) in ledger.members.iter().enumerate() {
        tx.execute(
            "INSERT INTO members(pos, id, name, joined_at) VALUES (?1,?2,?3,?4)",
            params![
                pos as i64,
                m.id.to_string(),
                m.name,
                m.joined_at.map(|j| j.to_rfc3339())
            ],
        )?;
    }
    for (pos, t) in ledger.trips.iter().enumerate() {
        tx.execute(
            "INSERT INTO trips(pos, id, name, created_at) VALUES (?1,?2,?3,?4)",
            params![pos as i64, t.id.to_string(), t.name, t.created_at.to_rfc3339()],
        )?;
        for (mpos, m) in t.member_ids.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO trip_members(trip_id, pos, member_id) VALUES (?1,?2,?3)",
                params![t.id.to_string(), mpos as i64, m.to_string()],
            )?;
        }
    }
    for (pos, e) in ledger.expenses.iter().enumerate() {
        tx.execute(
            "INSERT INTO expenses(pos, id, date, amount, currency, category, description, paid_by, payer_earned, trip_id)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                pos as i64,
                e.id.to_string(),
                e.date.to_string(),
                e.amount.to_string(),
                e.currency,
                e.category,
                e.description,
                e.paid_by.to_string(),
                opt_dec_text(e.payer_earned),
                e.trip_id.map(|t| t.to_string())
            ],
        )?;
        for (m, a) in &e.splits {
            tx.execute(
                "INSERT INTO expense_splits(expense_id, member_id, amount) VALUES (?1,?2,?3)",
                params![e.id.to_string(), m.to_string(), a.to_string()],
            )?;
        }
    }
    for (pos, p) in ledger.payments.iter().enumerate() {
        tx.execute(
            "INSERT INTO payments(pos, id, debtor, creditor, amount, amount_received, change_given_back, amount_forgiven, recorded_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                pos as i64,
                p.id.to_string(),
                p.debtor.to_string(),
                p.creditor.to_string(),
                p.amount.to_string(),
                opt_dec_text(p.amount_received),
                opt_dec_text(p.change_given_back),
                opt_dec_text(p.amount_forgiven),
                p.recorded_at.to_rfc3339()
            ],
        )?;
        for (apos, e) in p.allocated_expense_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO payment_allocations(payment_id, pos, expense_id) VALUES (?1,?2,?3)",
                params![p.id.to_string(), apos as i64, e.to_string()],
            )?;
        }
    }
    for k in &ledger.paid_marks {
        tx.execute(
            "INSERT INTO paid_marks(debtor, creditor, expense_id) VALUES (?1,?2,?3)",
            params![
                k.debtor.to_string(),
                k.creditor.to_string(),
                k.expense_id.to_string()
            ],
        )?;
    }
    for (k, ids) in &ledger.settled_by_pair {
        for e in ids {
            tx.execute(
                "INSERT INTO settled_pairs(debtor, creditor, expense_id) VALUES (?1,?2,?3)",
                params![k.debtor.to_string(), k.creditor.to_string(), e.to_string()],
            )?;
        }
    }
    for m in &ledger.settled_members {
        tx.execute(
            "INSERT INTO settled_members(member_id) VALUES (?1)",
            params![m.to_string()],
        )?;
    }
    if let Some(t) = ledger.selected_trip {
        tx.execute(
            "INSERT INTO settings(key, value) VALUES('selected_trip', ?1)",
            params![t.to_string()],
        )?;
    }
    Ok(())
}
