// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::session::Session;
use crate::utils::{maybe_print_json, member_id, parse_member_list, pretty_table, trip_id};
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            if name.is_empty() {
                return Err(anyhow!("Trip name must not be empty"));
            }
            if session.ledger.trip_by_name(&name).is_some() {
                return Err(anyhow!("Trip '{}' already exists", name));
            }
            let members = match sub.get_one::<String>("members") {
                Some(s) => parse_member_list(&session.ledger, s)?,
                None => Vec::new(),
            };
            let n = members.len();
            session.mutate(|l| l.add_trip(&name, members));
            println!("Added trip '{}' with {} members", name, n);
        }
        Some(("list", sub)) => {
            let rows = list_rows(session);
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .iter()
                    .map(|r| {
                        vec![
                            if r.selected { "*".into() } else { String::new() },
                            r.name.clone(),
                            r.members.join(", "),
                            r.expenses.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["", "Trip", "Members", "Expenses"], data)
                );
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = trip_id(&session.ledger, name)?;
            session.mutate(|l| l.remove_trip(&id));
            println!("Removed trip '{}'", name.trim());
        }
        Some(("join", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let member = sub.get_one::<String>("member").unwrap();
            let t = trip_id(&session.ledger, name)?;
            let mid = member_id(&session.ledger, member)?;
            if session.mutate(|l| l.add_trip_member(&t, mid)) {
                println!("'{}' joined '{}'", member.trim(), name.trim());
            } else {
                println!("'{}' is already on '{}'", member.trim(), name.trim());
            }
        }
        Some(("select", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let t = trip_id(&session.ledger, name)?;
            session.mutate(|l| l.select_trip(Some(t)));
            println!("Selected trip '{}'", name.trim());
        }
        Some(("clear", _)) => {
            session.mutate(|l| l.select_trip(None));
            println!("Cleared selected trip");
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TripRow {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub expenses: usize,
    pub selected: bool,
}

pub fn list_rows(session: &Session) -> Vec<TripRow> {
    let l = &session.ledger;
    l.trips
        .iter()
        .map(|t| TripRow {
            id: t.id.to_string(),
            name: t.name.clone(),
            members: t.member_ids.iter().map(|m| l.member_name(m)).collect(),
            expenses: l.expenses.iter().filter(|e| e.trip_id == Some(t.id)).count(),
            selected: l.selected_trip == Some(t.id),
        })
        .collect()
}
