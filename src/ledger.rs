// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! In-memory ledger: members, trips, expenses, payments and the settlement
//! bookkeeping that hangs off them. Balance and transfer computations live in
//! [`crate::settlement`].

use crate::models::{
    Expense, ExpenseId, Member, MemberId, PaidExpenseMark, PairKey, PaymentDetails, PaymentId,
    SettlementPayment, Trip, TripId,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub members: Vec<Member>,
    pub trips: Vec<Trip>,
    pub expenses: Vec<Expense>,
    pub payments: Vec<SettlementPayment>,
    pub paid_marks: BTreeSet<PaidExpenseMark>,
    pub settled_by_pair: BTreeMap<PairKey, BTreeSet<ExpenseId>>,
    pub settled_members: BTreeSet<MemberId>,
    pub selected_trip: Option<TripId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- members ----

    pub fn add_member(&mut self, name: &str) -> MemberId {
        let m = Member::new(name);
        let id = m.id;
        debug!(member = %id, name, "member added");
        self.members.push(m);
        id
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == *id)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        let name = name.trim();
        self.members
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn member_name(&self, id: &MemberId) -> String {
        self.member(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn rename_member(&mut self, id: &MemberId, name: &str) -> bool {
        match self.members.iter_mut().find(|m| m.id == *id) {
            Some(m) => {
                m.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes a member and every reference to them. Expenses they paid move
    /// to the first remaining split participant; expenses left without any
    /// split participant are dropped.
    pub fn remove_member(&mut self, id: &MemberId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != *id);
        if self.members.len() == before {
            return false;
        }

        for trip in &mut self.trips {
            trip.member_ids.retain(|m| m != id);
        }

        let order: Vec<MemberId> = self.members.iter().map(|m| m.id).collect();
        let mut dropped = Vec::new();
        for e in &mut self.expenses {
            if e.splits.remove(id).is_some() && e.splits.is_empty() {
                dropped.push(e.id);
                continue;
            }
            if e.paid_by == *id {
                let next = order
                    .iter()
                    .find(|m| e.splits.contains_key(*m))
                    .or_else(|| e.splits.keys().next())
                    .copied();
                if let Some(next) = next {
                    e.paid_by = next;
                }
            }
        }
        self.expenses.retain(|e| !dropped.contains(&e.id));

        self.payments
            .retain(|p| p.debtor != *id && p.creditor != *id);
        self.paid_marks
            .retain(|k| k.debtor != *id && k.creditor != *id);
        self.settled_by_pair
            .retain(|k, _| k.debtor != *id && k.creditor != *id);
        self.settled_members.remove(id);

        for e in &dropped {
            self.purge_expense_refs(e);
        }
        info!(member = %id, dropped_expenses = dropped.len(), "member removed");
        true
    }

    // ---- trips ----

    pub fn add_trip(&mut self, name: &str, member_ids: Vec<MemberId>) -> TripId {
        let t = Trip::new(name, member_ids);
        let id = t.id;
        debug!(trip = %id, name, "trip added");
        self.trips.push(t);
        id
    }

    pub fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.trips.iter().find(|t| t.id == *id)
    }

    pub fn trip_by_name(&self, name: &str) -> Option<&Trip> {
        let name = name.trim();
        self.trips.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn add_trip_member(&mut self, trip: &TripId, member: MemberId) -> bool {
        match self.trips.iter_mut().find(|t| t.id == *trip) {
            Some(t) if !t.member_ids.contains(&member) => {
                t.member_ids.push(member);
                true
            }
            _ => false,
        }
    }

    /// Drops the trip; its expenses stay in the ledger without a trip.
    pub fn remove_trip(&mut self, id: &TripId) -> bool {
        let before = self.trips.len();
        self.trips.retain(|t| t.id != *id);
        if self.trips.len() == before {
            return false;
        }
        for e in &mut self.expenses {
            if e.trip_id == Some(*id) {
                e.trip_id = None;
            }
        }
        if self.selected_trip == Some(*id) {
            self.selected_trip = None;
        }
        true
    }

    pub fn select_trip(&mut self, id: Option<TripId>) {
        self.selected_trip = id.filter(|t| self.trip(t).is_some());
    }

    // ---- expenses ----

    pub fn add_expense(&mut self, expense: Expense) -> ExpenseId {
        let id = expense.id;
        debug!(
            expense = %id,
            amount = %expense.amount,
            currency = %expense.currency,
            "expense added"
        );
        self.expenses.push(expense);
        id
    }

    pub fn expense(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == *id)
    }

    pub fn remove_expense(&mut self, id: &ExpenseId) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != *id);
        if self.expenses.len() == before {
            return false;
        }
        self.purge_expense_refs(id);
        true
    }

    /// Expenses matching `currency` inside `scope` (`None` = every expense).
    pub fn expenses_in<'a>(
        &'a self,
        currency: &'a str,
        scope: Option<TripId>,
    ) -> impl Iterator<Item = &'a Expense> + 'a {
        self.expenses
            .iter()
            .filter(move |e| e.currency.eq_ignore_ascii_case(currency))
            .filter(move |e| scope.is_none() || e.trip_id == scope)
    }

    /// Distinct currencies used in `scope`, in first-seen order.
    pub fn currencies_in_scope(&self, scope: Option<TripId>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for e in &self.expenses {
            if scope.is_some() && e.trip_id != scope {
                continue;
            }
            if !out.iter().any(|c| c.eq_ignore_ascii_case(&e.currency)) {
                out.push(e.currency.clone());
            }
        }
        out
    }

    fn purge_expense_refs(&mut self, id: &ExpenseId) {
        for p in &mut self.payments {
            p.allocated_expense_ids.retain(|e| e != id);
        }
        self.paid_marks.retain(|k| k.expense_id != *id);
        for set in self.settled_by_pair.values_mut() {
            set.remove(id);
        }
        self.settled_by_pair.retain(|_, set| !set.is_empty());
    }

    // ---- payments & marks ----

    /// Appends a payment. The amount is not checked against what is owed.
    pub fn record_payment(
        &mut self,
        debtor: MemberId,
        creditor: MemberId,
        amount: Decimal,
        details: PaymentDetails,
    ) -> SettlementPayment {
        let p = SettlementPayment {
            id: Uuid::new_v4(),
            debtor,
            creditor,
            amount,
            amount_received: details.amount_received,
            change_given_back: details.change_given_back,
            amount_forgiven: details.amount_forgiven,
            allocated_expense_ids: details.allocated_expense_ids,
            recorded_at: Utc::now(),
        };
        info!(payment = %p.id, debtor = %debtor, creditor = %creditor, amount = %amount, "payment recorded");
        self.payments.push(p.clone());
        p
    }

    pub fn remove_payment(&mut self, id: &PaymentId) -> bool {
        let before = self.payments.len();
        self.payments.retain(|p| p.id != *id);
        self.payments.len() != before
    }

    pub fn payments_between(
        &self,
        debtor: &MemberId,
        creditor: &MemberId,
    ) -> impl Iterator<Item = &SettlementPayment> {
        let (d, c) = (*debtor, *creditor);
        self.payments
            .iter()
            .filter(move |p| p.debtor == d && p.creditor == c)
    }

    pub fn set_expense_paid(
        &mut self,
        debtor: MemberId,
        creditor: MemberId,
        expense_id: ExpenseId,
        paid: bool,
    ) {
        let key = PaidExpenseMark {
            debtor,
            creditor,
            expense_id,
        };
        if paid {
            self.paid_marks.insert(key);
        } else {
            self.paid_marks.remove(&key);
        }
    }

    pub fn is_expense_paid(
        &self,
        debtor: &MemberId,
        creditor: &MemberId,
        expense_id: &ExpenseId,
    ) -> bool {
        self.paid_marks.contains(&PaidExpenseMark {
            debtor: *debtor,
            creditor: *creditor,
            expense_id: *expense_id,
        })
    }

    /// Members in ledger order, then ids the member list does not know about
    /// in order of first appearance in `expenses`.
    pub(crate) fn ordered_participants<'a>(
        &self,
        expenses: impl Iterator<Item = &'a Expense>,
    ) -> Vec<MemberId> {
        let mut seen: BTreeSet<MemberId> = BTreeSet::new();
        let mut unknown: Vec<MemberId> = Vec::new();
        for e in expenses {
            for id in std::iter::once(&e.paid_by).chain(e.splits.keys()) {
                if seen.insert(*id) && self.member(id).is_none() {
                    unknown.push(*id);
                }
            }
        }
        let mut out: Vec<MemberId> = self
            .members
            .iter()
            .map(|m| m.id)
            .filter(|id| seen.contains(id))
            .collect();
        out.extend(unknown);
        out
    }
}
