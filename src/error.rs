// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures at the edges of the ledger: resolving user input and reading
/// persisted rows. The engine itself never fails.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Member '{0}' not found")]
    MemberNotFound(String),
    #[error("Trip '{0}' not found")]
    TripNotFound(String),
    #[error("Expense '{0}' not found")]
    ExpenseNotFound(String),
    #[error("Payment '{0}' not found")]
    PaymentNotFound(String),
    #[error("Invalid split '{0}', expected name=amount")]
    InvalidSplit(String),
    #[error("Corrupt row in {table}: {detail}")]
    CorruptRow { table: &'static str, detail: String },
}
