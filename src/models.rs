// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type MemberId = Uuid;
pub type ExpenseId = Uuid;
pub type TripId = Uuid;
pub type PaymentId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            joined_at: Some(Utc::now()),
        }
    }
}

/// A grouping of expenses (a trip, an event). An empty `member_ids` list
/// means participants are derived from the trip's expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub member_ids: Vec<MemberId>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(name: impl Into<String>, member_ids: Vec<MemberId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            member_ids,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub paid_by: MemberId,
    /// Owed share per member, in `currency` units.
    pub splits: BTreeMap<MemberId, Decimal>,
    /// Part of the amount the payer keeps (rebate, cashback).
    pub payer_earned: Option<Decimal>,
    pub trip_id: Option<TripId>,
}

impl Expense {
    /// Spreads `amount` evenly over `members`, rounded to `decimals` places.
    /// The rounding remainder lands on the first member so the shares always
    /// sum to `amount` exactly.
    pub fn equal_split(
        amount: Decimal,
        members: &[MemberId],
        decimals: u32,
    ) -> BTreeMap<MemberId, Decimal> {
        let mut splits = BTreeMap::new();
        if members.is_empty() {
            return splits;
        }
        let share = (amount / Decimal::from(members.len() as u64)).round_dp(decimals);
        let remainder = amount - share * Decimal::from(members.len() as u64);
        for (i, m) in members.iter().enumerate() {
            let s = if i == 0 { share + remainder } else { share };
            *splits.entry(*m).or_insert(Decimal::ZERO) += s;
        }
        splits
    }

    /// What the payer actually fronted once `payer_earned` is deducted.
    pub fn paid_out(&self) -> Decimal {
        self.amount - self.payer_earned.unwrap_or(Decimal::ZERO)
    }

    pub fn share_of(&self, member: &MemberId) -> Decimal {
        self.splits.get(member).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn split_total(&self) -> Decimal {
        self.splits.values().copied().sum()
    }

    pub fn involves(&self, member: &MemberId) -> bool {
        self.paid_by == *member || self.splits.contains_key(member)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementPayment {
    pub id: PaymentId,
    pub debtor: MemberId,
    pub creditor: MemberId,
    /// Amount applied to the debt.
    pub amount: Decimal,
    pub amount_received: Option<Decimal>,
    pub change_given_back: Option<Decimal>,
    pub amount_forgiven: Option<Decimal>,
    /// Empty means unallocated: applies to the pair's total.
    pub allocated_expense_ids: Vec<ExpenseId>,
    pub recorded_at: DateTime<Utc>,
}

/// Optional parts of a payment beyond the applied amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentDetails {
    pub amount_received: Option<Decimal>,
    pub change_given_back: Option<Decimal>,
    pub amount_forgiven: Option<Decimal>,
    pub allocated_expense_ids: Vec<ExpenseId>,
}

/// Directed (debtor, creditor) pair used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub debtor: MemberId,
    pub creditor: MemberId,
}

impl PairKey {
    pub fn new(debtor: MemberId, creditor: MemberId) -> Self {
        Self { debtor, creditor }
    }
}

/// "debtor has paid creditor for this expense".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaidExpenseMark {
    pub debtor: MemberId,
    pub creditor: MemberId,
    pub expense_id: ExpenseId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberBalance {
    pub member: MemberId,
    pub net: Decimal,
}

/// One expense's contribution to a debtor -> creditor debt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairContribution {
    pub expense_id: ExpenseId,
    pub date: NaiveDate,
    pub description: String,
    pub share: Decimal,
    pub paid_toward: Decimal,
    pub settled: bool,
    pub marked_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitDiscrepancy {
    pub expense_id: ExpenseId,
    pub amount: Decimal,
    pub split_total: Decimal,
}
