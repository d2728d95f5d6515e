// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use splitclip::ledger::Ledger;
use splitclip::models::{Expense, ExpenseId, MemberId, PaymentDetails};
use std::collections::BTreeMap;
use uuid::Uuid;

fn add(l: &mut Ledger, payer: MemberId, shares: &[(MemberId, i64)]) -> ExpenseId {
    let splits: BTreeMap<MemberId, Decimal> = shares
        .iter()
        .map(|(m, a)| (*m, Decimal::new(*a, 0)))
        .collect();
    l.add_expense(Expense {
        id: Uuid::new_v4(),
        amount: splits.values().copied().sum(),
        currency: "USD".into(),
        category: "Lodging".into(),
        description: String::new(),
        date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        paid_by: payer,
        splits,
        payer_earned: None,
        trip_id: None,
    })
}

#[test]
fn removing_a_member_purges_every_reference() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let carol = l.add_member("Carol");
    let trip = l.add_trip("Porto", vec![ali, bob, carol]);

    let shared = add(&mut l, ali, &[(ali, 10), (bob, 10), (carol, 10)]);
    let only_carol = add(&mut l, ali, &[(carol, 40)]);
    let bob_only = add(&mut l, ali, &[(bob, 8)]);

    l.record_payment(carol, ali, Decimal::new(10, 0), PaymentDetails::default());
    l.record_payment(
        bob,
        ali,
        Decimal::new(18, 0),
        PaymentDetails {
            allocated_expense_ids: vec![bob_only, only_carol],
            ..Default::default()
        },
    );
    l.set_expense_paid(carol, ali, shared, true);
    l.set_expense_paid(bob, ali, only_carol, true);
    l.mark_fully_paid(carol, ali);

    assert!(l.remove_member(&carol));

    assert!(l.member(&carol).is_none());
    assert!(l.expense(&only_carol).is_none());
    assert!(l.expenses.iter().all(|e| !e.splits.contains_key(&carol)));
    assert_eq!(l.expense(&shared).unwrap().splits.len(), 2);
    assert!(l.payments.iter().all(|p| p.debtor != carol && p.creditor != carol));
    assert!(l.paid_marks.iter().all(|k| k.debtor != carol && k.expense_id != only_carol));
    assert!(l.settled_by_pair.keys().all(|k| k.debtor != carol));
    assert!(!l.settled_members.contains(&carol));
    assert_eq!(l.trip(&trip).unwrap().member_ids, vec![ali, bob]);

    // the dropped expense no longer counts in bob's allocation
    let p = &l.payments[0];
    assert_eq!(p.allocated_expense_ids, vec![bob_only]);
    assert_eq!(
        l.amount_paid_toward_expense(&bob, &ali, &bob_only),
        Decimal::new(18, 0)
    );
}

#[test]
fn payership_moves_to_first_remaining_participant() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let carol = l.add_member("Carol");
    let e = add(&mut l, ali, &[(carol, 10), (bob, 10), (ali, 10)]);

    l.remove_member(&ali);
    let moved = l.expense(&e).unwrap();
    assert_eq!(moved.paid_by, bob);
    assert!(!moved.splits.contains_key(&ali));
}

#[test]
fn payer_removed_with_no_split_left_drops_expense() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let kept = add(&mut l, bob, &[(bob, 5)]);
    let gone = add(&mut l, ali, &[(ali, 5)]);

    l.remove_member(&ali);
    assert!(l.expense(&gone).is_none());
    assert!(l.expense(&kept).is_some());
}

#[test]
fn removing_unknown_member_is_a_no_op() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    add(&mut l, ali, &[(ali, 5)]);
    let before = l.clone();
    assert!(!l.remove_member(&Uuid::new_v4()));
    assert_eq!(l, before);
}

#[test]
fn unrelated_removal_keeps_unsplit_expenses() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let carol = l.add_member("Carol");
    let unsplit = l.add_expense(Expense {
        id: Uuid::new_v4(),
        amount: Decimal::new(50, 0),
        currency: "USD".into(),
        category: "Fuel".into(),
        description: String::new(),
        date: NaiveDate::from_ymd_opt(2025, 6, 11).unwrap(),
        paid_by: ali,
        splits: BTreeMap::new(),
        payer_earned: None,
        trip_id: None,
    });
    assert_eq!(l.net_balance(&ali, "USD", None), Decimal::new(50, 0));

    assert!(l.remove_member(&carol));
    assert!(l.expense(&unsplit).is_some());
    assert_eq!(l.net_balance(&ali, "USD", None), Decimal::new(50, 0));
}
