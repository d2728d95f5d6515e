// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db;
use crate::ledger::Ledger;
use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

/// The live ledger plus the connection it is persisted through.
///
/// Every mutation goes through [`Session::mutate`], which saves the whole
/// snapshot afterwards. A failed save is logged and the in-memory ledger
/// stays authoritative.
pub struct Session {
    pub conn: Connection,
    pub ledger: Ledger,
}

impl Session {
    pub fn open(conn: Connection) -> Result<Self> {
        let ledger = db::load_ledger(&conn)?;
        Ok(Self { conn, ledger })
    }

    pub fn mutate<T>(&mut self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        let out = f(&mut self.ledger);
        if let Err(err) = db::save_ledger(&mut self.conn, &self.ledger) {
            warn!(error = %err, "failed to persist ledger; keeping in-memory state");
        }
        out
    }
}
