// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Net balances, minimal settling transfers and the pairwise "who owes whom"
//! views over a [`Ledger`].
//!
//! Two views of debt are exposed and they can disagree:
//! - [`Ledger::settlement_transfers`] nets everyone's balance and finds the
//!   fewest payments that clear it;
//! - [`Ledger::amount_owed_active_only`] looks only at expenses one member
//!   fronted for another, minus those already folded into a
//!   [`Ledger::mark_fully_paid`].

use crate::ledger::Ledger;
use crate::models::{
    ExpenseId, MemberBalance, MemberId, PairContribution, PairKey, SplitDiscrepancy, Transfer,
    TripId,
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Balances within this many currency units of zero count as settled.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

impl Ledger {
    /// Paid (net of payer earnings) minus owed share. Positive means the
    /// member is owed money.
    pub fn net_balance(&self, member: &MemberId, currency: &str, scope: Option<TripId>) -> Decimal {
        let mut paid = Decimal::ZERO;
        let mut share = Decimal::ZERO;
        for e in self.expenses_in(currency, scope) {
            if e.paid_by == *member {
                paid += e.paid_out();
            }
            share += e.share_of(member);
        }
        paid - share
    }

    /// Participants of a computation: the trip's explicit member list when it
    /// has one, else everyone appearing in the matching expenses.
    pub fn participants(&self, currency: &str, scope: Option<TripId>) -> Vec<MemberId> {
        if let Some(trip) = scope.and_then(|t| self.trip(&t)) {
            if !trip.member_ids.is_empty() {
                return trip.member_ids.clone();
            }
        }
        self.ordered_participants(self.expenses_in(currency, scope))
    }

    pub fn balances(&self, currency: &str, scope: Option<TripId>) -> Vec<MemberBalance> {
        self.participants(currency, scope)
            .into_iter()
            .map(|member| MemberBalance {
                member,
                net: self.net_balance(&member, currency, scope),
            })
            .collect()
    }

    /// Fewest transfers that bring every participant's balance to zero.
    ///
    /// Largest debtor pays largest creditor until one side runs out. Equal
    /// amounts keep participant order, so output is reproducible.
    pub fn settlement_transfers(&self, currency: &str, scope: Option<TripId>) -> Vec<Transfer> {
        let balances = self.balances(currency, scope);
        let transfers = settle_balances(&balances);
        debug!(
            currency,
            participants = balances.len(),
            transfers = transfers.len(),
            "settlement plan computed"
        );
        transfers
    }

    /// Sum of the debtor's shares in expenses the creditor paid, skipping
    /// expenses already covered by a mark-fully-paid.
    pub fn amount_owed_active_only(
        &self,
        debtor: &MemberId,
        creditor: &MemberId,
        currency: &str,
        scope: Option<TripId>,
    ) -> Decimal {
        let settled = self.settled_by_pair.get(&PairKey::new(*debtor, *creditor));
        self.expenses_in(currency, scope)
            .filter(|e| e.paid_by == *creditor)
            .filter(|e| settled.is_none_or(|s| !s.contains(&e.id)))
            .map(|e| e.share_of(debtor))
            .filter(|s| !s.is_zero())
            .sum()
    }

    /// Per-expense breakdown of debtor -> creditor debt, settled rows included.
    pub fn contributing_expenses(
        &self,
        debtor: &MemberId,
        creditor: &MemberId,
        currency: &str,
        scope: Option<TripId>,
    ) -> Vec<PairContribution> {
        let settled = self.settled_by_pair.get(&PairKey::new(*debtor, *creditor));
        self.expenses_in(currency, scope)
            .filter(|e| e.paid_by == *creditor && !e.share_of(debtor).is_zero())
            .map(|e| PairContribution {
                expense_id: e.id,
                date: e.date,
                description: e.description.clone(),
                share: e.share_of(debtor),
                paid_toward: self.amount_paid_toward_expense(debtor, creditor, &e.id),
                settled: settled.is_some_and(|s| s.contains(&e.id)),
                marked_paid: self.is_expense_paid(debtor, creditor, &e.id),
            })
            .collect()
    }

    /// Folds every expense currently behind debtor -> creditor debt (any
    /// currency, any trip) into the pair's settled set. Net balances are left
    /// alone; only the active-owed view changes. A pair with nothing behind
    /// it is left unmarked.
    pub fn mark_fully_paid(&mut self, debtor: MemberId, creditor: MemberId) {
        let ids: Vec<ExpenseId> = self
            .expenses
            .iter()
            .filter(|e| e.paid_by == creditor && !e.share_of(&debtor).is_zero())
            .map(|e| e.id)
            .collect();
        let n = ids.len();
        if n == 0 {
            debug!(debtor = %debtor, creditor = %creditor, "nothing to mark fully paid");
            return;
        }
        self.settled_by_pair
            .entry(PairKey::new(debtor, creditor))
            .or_default()
            .extend(ids);
        self.settled_members.insert(debtor);
        info!(debtor = %debtor, creditor = %creditor, expenses = n, "pair marked fully paid");
    }

    pub fn clear_settled_pair(&mut self, debtor: &MemberId, creditor: &MemberId) -> bool {
        let removed = self
            .settled_by_pair
            .remove(&PairKey::new(*debtor, *creditor))
            .is_some();
        if !self.settled_by_pair.keys().any(|k| k.debtor == *debtor) {
            self.settled_members.remove(debtor);
        }
        removed
    }

    pub fn settled_expenses(&self, debtor: &MemberId, creditor: &MemberId) -> BTreeSet<ExpenseId> {
        self.settled_by_pair
            .get(&PairKey::new(*debtor, *creditor))
            .cloned()
            .unwrap_or_default()
    }

    /// An allocated payment counts `amount / allocations` toward each
    /// expense it was tagged against.
    pub fn amount_paid_toward_expense(
        &self,
        debtor: &MemberId,
        creditor: &MemberId,
        expense_id: &ExpenseId,
    ) -> Decimal {
        self.payments_between(debtor, creditor)
            .filter(|p| p.allocated_expense_ids.contains(expense_id))
            .map(|p| p.amount / Decimal::from(p.allocated_expense_ids.len() as u64))
            .sum()
    }

    pub fn unallocated_payment_total(&self, debtor: &MemberId, creditor: &MemberId) -> Decimal {
        self.payments_between(debtor, creditor)
            .filter(|p| p.allocated_expense_ids.is_empty())
            .map(|p| p.amount)
            .sum()
    }

    /// Applied amounts only; cash received and change are not counted.
    pub fn total_paid_from_to(&self, debtor: &MemberId, creditor: &MemberId) -> Decimal {
        self.payments_between(debtor, creditor)
            .map(|p| p.amount)
            .sum()
    }

    pub fn split_discrepancies(&self) -> Vec<SplitDiscrepancy> {
        self.expenses
            .iter()
            .filter(|e| (e.split_total() - e.amount).abs() > EPSILON)
            .map(|e| SplitDiscrepancy {
                expense_id: e.id,
                amount: e.amount,
                split_total: e.split_total(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Party {
    id: MemberId,
    remaining: Decimal,
}

/// Greedy largest-debtor / largest-creditor matching over net balances.
/// Produces at most `debtors + creditors - 1` transfers.
pub fn settle_balances(balances: &[MemberBalance]) -> Vec<Transfer> {
    let mut debtors: Vec<Party> = Vec::new();
    let mut creditors: Vec<Party> = Vec::new();
    for b in balances {
        if b.net < -EPSILON {
            debtors.push(Party {
                id: b.member,
                remaining: -b.net,
            });
        } else if b.net > EPSILON {
            creditors.push(Party {
                id: b.member,
                remaining: b.net,
            });
        }
    }
    // sort_by is stable: equal amounts keep participant order
    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].remaining.min(creditors[j].remaining);
        if amount > EPSILON {
            out.push(Transfer {
                from: debtors[i].id,
                to: creditors[j].id,
                amount,
            });
        }
        debtors[i].remaining -= amount;
        creditors[j].remaining -= amount;
        if debtors[i].remaining < EPSILON {
            i += 1;
        }
        if creditors[j].remaining < EPSILON {
            j += 1;
        }
    }
    out
}
