// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::session::Session;
use crate::utils::{maybe_print_json, member_id, pretty_table, trip_id};
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if name.is_empty() {
                return Err(anyhow!("Member name must not be empty"));
            }
            if session.ledger.member_by_name(&name).is_some() {
                return Err(anyhow!("Member '{}' already exists", name));
            }
            let trip = match sub.get_one::<String>("trip") {
                Some(t) => Some(trip_id(&session.ledger, t)?),
                None => None,
            };
            session.mutate(|l| {
                let id = l.add_member(&name);
                if let Some(t) = trip {
                    l.add_trip_member(&t, id);
                }
            });
            println!("Added member '{}'", name);
        }
        Some(("list", sub)) => {
            let rows = list_rows(session);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .iter()
                    .map(|r| vec![r.name.clone(), r.joined.clone(), r.id.clone()])
                    .collect();
                println!("{}", pretty_table(&["Name", "Joined", "ID"], data));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = member_id(&session.ledger, name)?;
            let before = session.ledger.expenses.len();
            session.mutate(|l| l.remove_member(&id));
            let dropped = before - session.ledger.expenses.len();
            println!("Removed member '{}' ({} expenses dropped)", name.trim(), dropped);
        }
        Some(("rename", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let to = sub.get_one::<String>("to").unwrap().trim().to_string();
            if to.is_empty() {
                return Err(anyhow!("Member name must not be empty"));
            }
            let id = member_id(&session.ledger, name)?;
            session.mutate(|l| l.rename_member(&id, &to));
            println!("Renamed '{}' to '{}'", name.trim(), to);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct MemberRow {
    pub id: String,
    pub name: String,
    pub joined: String,
}

pub fn list_rows(session: &Session) -> Vec<MemberRow> {
    session
        .ledger
        .members
        .iter()
        .map(|m| MemberRow {
            id: m.id.to_string(),
            name: m.name.clone(),
            joined: m
                .joined_at
                .map(|j| j.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        })
        .collect()
}
