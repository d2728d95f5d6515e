// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use splitclip::ledger::Ledger;
use splitclip::models::{Expense, MemberId, Transfer};
use std::collections::BTreeMap;
use uuid::Uuid;

fn usd(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn expense(payer: MemberId, ccy: &str, splits: &[(MemberId, i64)]) -> Expense {
    let splits: BTreeMap<MemberId, Decimal> =
        splits.iter().map(|(m, a)| (*m, usd(*a))).collect();
    Expense {
        id: Uuid::new_v4(),
        amount: splits.values().copied().sum(),
        currency: ccy.to_string(),
        category: "Food".into(),
        description: "dinner".into(),
        date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        paid_by: payer,
        splits,
        payer_earned: None,
        trip_id: None,
    }
}

fn three() -> (Ledger, MemberId, MemberId, MemberId) {
    let mut l = Ledger::new();
    let ali = l.add_member("Ali");
    let bob = l.add_member("Bob");
    let carol = l.add_member("Carol");
    (l, ali, bob, carol)
}

#[test]
fn three_way_dinner_settles_to_payer() {
    let (mut l, ali, bob, carol) = three();
    l.add_expense(expense(ali, "USD", &[(ali, 100), (bob, 100), (carol, 100)]));

    assert_eq!(l.net_balance(&ali, "USD", None), usd(200));
    assert_eq!(l.net_balance(&bob, "USD", None), usd(-100));
    assert_eq!(l.net_balance(&carol, "USD", None), usd(-100));

    let t = l.settlement_transfers("USD", None);
    assert_eq!(
        t,
        vec![
            Transfer {
                from: bob,
                to: ali,
                amount: usd(100)
            },
            Transfer {
                from: carol,
                to: ali,
                amount: usd(100)
            },
        ]
    );
}

#[test]
fn currencies_are_kept_apart() {
    let (mut l, ali, bob, _) = three();
    l.add_expense(expense(ali, "USD", &[(ali, 50), (bob, 50)]));
    l.add_expense(expense(bob, "EUR", &[(ali, 40), (bob, 40)]));

    assert_eq!(l.net_balance(&ali, "USD", None), usd(50));
    assert_eq!(l.net_balance(&ali, "EUR", None), usd(-40));
    assert_eq!(l.net_balance(&ali, "usd", None), usd(50));
    assert_eq!(l.currencies_in_scope(None), vec!["USD", "EUR"]);
}

#[test]
fn payer_earned_reduces_what_was_paid() {
    let (mut l, ali, bob, _) = three();
    let mut e = expense(ali, "USD", &[(ali, 50), (bob, 50)]);
    e.payer_earned = Some(usd(10));
    l.add_expense(e);

    assert_eq!(l.net_balance(&ali, "USD", None), usd(40));
    assert_eq!(l.net_balance(&bob, "USD", None), usd(-50));
}

#[test]
fn unknown_member_has_zero_balance() {
    let (mut l, ali, bob, _) = three();
    l.add_expense(expense(ali, "USD", &[(bob, 20)]));
    assert!(l.net_balance(&Uuid::new_v4(), "USD", None).is_zero());
    assert!(l.net_balance(&ali, "GBP", None).is_zero());
}

#[test]
fn trip_scope_filters_expenses_and_uses_explicit_members() {
    let (mut l, ali, bob, carol) = three();
    let dan = l.add_member("Dan");
    let trip = l.add_trip("Lisbon", vec![ali, bob, dan]);

    let mut on_trip = expense(ali, "USD", &[(ali, 30), (bob, 30)]);
    on_trip.trip_id = Some(trip);
    l.add_expense(on_trip);
    l.add_expense(expense(carol, "USD", &[(ali, 70), (carol, 70)]));

    assert_eq!(l.participants("USD", Some(trip)), vec![ali, bob, dan]);
    assert_eq!(l.net_balance(&ali, "USD", Some(trip)), usd(30));
    assert_eq!(l.net_balance(&ali, "USD", None), usd(-40));

    let balances = l.balances("USD", Some(trip));
    assert_eq!(balances.len(), 3);
    assert!(balances[2].net.is_zero());

    let plan = l.settlement_transfers("USD", Some(trip));
    assert_eq!(plan.len(), 1);
    assert_eq!((plan[0].from, plan[0].to, plan[0].amount), (bob, ali, usd(30)));
}

#[test]
fn trip_without_members_derives_participants() {
    let (mut l, ali, bob, carol) = three();
    let trip = l.add_trip("Weekend", Vec::new());
    let mut e = expense(bob, "USD", &[(bob, 10), (ali, 10)]);
    e.trip_id = Some(trip);
    l.add_expense(e);
    l.add_expense(expense(carol, "USD", &[(carol, 5), (ali, 5)]));

    assert_eq!(l.participants("USD", Some(trip)), vec![ali, bob]);
    assert_eq!(l.participants("USD", None), vec![ali, bob, carol]);
}

#[test]
fn pairwise_view_can_differ_from_minimal_plan() {
    let (mut l, a, b, c) = three();
    // A owes B 30, B owes C 30
    l.add_expense(expense(b, "USD", &[(a, 30)]));
    l.add_expense(expense(c, "USD", &[(b, 30)]));

    let plan = l.settlement_transfers("USD", None);
    assert_eq!(plan.len(), 1);
    assert_eq!((plan[0].from, plan[0].to), (a, c));

    assert_eq!(l.amount_owed_active_only(&a, &b, "USD", None), usd(30));
    assert!(l.amount_owed_active_only(&a, &c, "USD", None).is_zero());
}

#[test]
fn mark_fully_paid_hides_history_but_not_new_debt() {
    let (mut l, ali, bob, carol) = three();
    l.add_expense(expense(ali, "USD", &[(ali, 100), (bob, 100), (carol, 100)]));
    l.add_expense(expense(ali, "EUR", &[(bob, 15)]));

    assert_eq!(l.amount_owed_active_only(&bob, &ali, "USD", None), usd(100));
    l.mark_fully_paid(bob, ali);
    assert!(l.amount_owed_active_only(&bob, &ali, "USD", None).is_zero());
    assert!(l.amount_owed_active_only(&bob, &ali, "EUR", None).is_zero());
    assert_eq!(l.net_balance(&bob, "USD", None), usd(-100));
    assert!(l.settled_members.contains(&bob));
    assert_eq!(l.settled_expenses(&bob, &ali).len(), 2);

    // carol's debt is untouched
    assert_eq!(l.amount_owed_active_only(&carol, &ali, "USD", None), usd(100));

    l.add_expense(expense(ali, "USD", &[(ali, 30), (bob, 30)]));
    assert_eq!(l.amount_owed_active_only(&bob, &ali, "USD", None), usd(30));

    let rows = l.contributing_expenses(&bob, &ali, "USD", None);
    assert_eq!(rows.len(), 2);
    assert!(rows[0].settled);
    assert!(!rows[1].settled);

    assert!(l.clear_settled_pair(&bob, &ali));
    assert_eq!(l.amount_owed_active_only(&bob, &ali, "USD", None), usd(130));
    assert!(!l.settled_members.contains(&bob));
}

#[test]
fn split_discrepancies_are_reported_not_rejected() {
    let (mut l, ali, bob, _) = three();
    let mut e = expense(ali, "USD", &[(ali, 10), (bob, 10)]);
    e.amount = usd(25);
    let id = l.add_expense(e);
    l.add_expense(expense(ali, "USD", &[(bob, 5)]));

    let d = l.split_discrepancies();
    assert_eq!(d.len(), 1);
    assert_eq!(d[0].expense_id, id);
    assert_eq!(d[0].split_total, usd(20));
}

#[test]
fn equal_split_puts_remainder_on_first_member() {
    let (_, ali, bob, carol) = three();
    let s = Expense::equal_split(Decimal::new(10000, 2), &[ali, bob, carol], 2);
    assert_eq!(s[&ali], Decimal::new(3334, 2));
    assert_eq!(s[&bob], Decimal::new(3333, 2));
    assert_eq!(s.values().copied().sum::<Decimal>(), usd(100));

    let yen = Expense::equal_split(usd(1000), &[ali, bob, carol], 0);
    assert_eq!(yen[&ali], usd(334));
    assert_eq!(yen[&carol], usd(333));
}
