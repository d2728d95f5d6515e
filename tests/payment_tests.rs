// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use splitclip::ledger::Ledger;
use splitclip::models::{Expense, ExpenseId, MemberId, PaymentDetails};
use uuid::Uuid;

fn add(l: &mut Ledger, payer: MemberId, debtor: MemberId, share: i64) -> ExpenseId {
    let mut splits = std::collections::BTreeMap::new();
    splits.insert(payer, Decimal::new(share, 0));
    splits.insert(debtor, Decimal::new(share, 0));
    l.add_expense(Expense {
        id: Uuid::new_v4(),
        amount: Decimal::new(share * 2, 0),
        currency: "USD".into(),
        category: "Travel".into(),
        description: String::new(),
        date: NaiveDate::from_ymd_opt(2025, 8, 3).unwrap(),
        paid_by: payer,
        splits,
        payer_earned: None,
        trip_id: None,
    })
}

#[test]
fn overpayment_is_stored_verbatim() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    add(&mut l, ali, bob, 100);

    let p = l.record_payment(
        bob,
        ali,
        Decimal::new(100, 0),
        PaymentDetails {
            amount_received: Some(Decimal::new(150, 0)),
            change_given_back: Some(Decimal::new(50, 0)),
            ..Default::default()
        },
    );
    let stored = &l.payments[0];
    assert_eq!(stored, &p);
    assert_eq!(stored.amount_received, Some(Decimal::new(150, 0)));
    assert_eq!(stored.change_given_back, Some(Decimal::new(50, 0)));
    assert_eq!(stored.amount_forgiven, None);
    assert_eq!(l.total_paid_from_to(&bob, &ali), Decimal::new(100, 0));
    assert!(l.total_paid_from_to(&ali, &bob).is_zero());
}

#[test]
fn payments_are_not_capped_by_debt() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    l.record_payment(bob, ali, Decimal::new(999, 0), PaymentDetails::default());
    assert_eq!(l.payments.len(), 1);
    assert_eq!(l.unallocated_payment_total(&bob, &ali), Decimal::new(999, 0));
}

#[test]
fn allocated_payment_is_spread_across_expenses() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let e1 = add(&mut l, ali, bob, 40);
    let e2 = add(&mut l, ali, bob, 20);

    l.record_payment(
        bob,
        ali,
        Decimal::new(60, 0),
        PaymentDetails {
            allocated_expense_ids: vec![e1, e2],
            ..Default::default()
        },
    );
    l.record_payment(bob, ali, Decimal::new(25, 0), PaymentDetails::default());

    assert_eq!(l.amount_paid_toward_expense(&bob, &ali, &e1), Decimal::new(30, 0));
    assert_eq!(l.amount_paid_toward_expense(&bob, &ali, &e2), Decimal::new(30, 0));
    assert_eq!(l.unallocated_payment_total(&bob, &ali), Decimal::new(25, 0));
    assert_eq!(l.total_paid_from_to(&bob, &ali), Decimal::new(85, 0));

    // dropping an expense re-spreads the payment over what is left
    assert!(l.remove_expense(&e2));
    assert_eq!(l.amount_paid_toward_expense(&bob, &ali, &e1), Decimal::new(60, 0));
}

#[test]
fn remove_payment_by_id() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let p = l.record_payment(bob, ali, Decimal::new(5, 0), PaymentDetails::default());
    assert!(l.remove_payment(&p.id));
    assert!(!l.remove_payment(&p.id));
    assert!(l.total_paid_from_to(&bob, &ali).is_zero());
}

#[test]
fn paid_marks_toggle_per_expense() {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let e = add(&mut l, ali, bob, 12);

    assert!(!l.is_expense_paid(&bob, &ali, &e));
    l.set_expense_paid(bob, ali, e, true);
    assert!(l.is_expense_paid(&bob, &ali, &e));
    assert!(!l.is_expense_paid(&ali, &bob, &e));

    let rows = l.contributing_expenses(&bob, &ali, "USD", None);
    assert!(rows[0].marked_paid);

    l.set_expense_paid(bob, ali, e, false);
    assert!(l.paid_marks.is_empty());
}
