// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::session::Session;
use crate::utils::{find_rate, get_base_currency, pretty_table};
use anyhow::Result;
use std::collections::BTreeSet;

/// Issues the ledger tolerates but a user probably wants to know about.
pub fn diagnose(session: &Session) -> Result<Vec<Vec<String>>> {
    let l = &session.ledger;
    let mut rows = Vec::new();

    // 1) Splits that do not add up to the expense amount
    for d in l.split_discrepancies() {
        rows.push(vec![
            "split_mismatch".into(),
            format!("{} amount {} splits {}", d.expense_id, d.amount, d.split_total),
        ]);
    }

    // 2) References to members no longer in the ledger
    for e in &l.expenses {
        if l.member(&e.paid_by).is_none() || e.splits.keys().any(|m| l.member(m).is_none()) {
            rows.push(vec!["unknown_member".into(), e.id.to_string()]);
        }
    }

    // 3) Payments larger than everything the pair ever shared
    let pairs: BTreeSet<_> = l.payments.iter().map(|p| (p.debtor, p.creditor)).collect();
    for (debtor, creditor) in pairs {
        let owed: rust_decimal::Decimal = l
            .expenses
            .iter()
            .filter(|e| e.paid_by == creditor)
            .map(|e| e.share_of(&debtor))
            .sum();
        if l.total_paid_from_to(&debtor, &creditor) > owed {
            rows.push(vec![
                "overpaid_pair".into(),
                format!("{} -> {}", l.member_name(&debtor), l.member_name(&creditor)),
            ]);
        }
    }

    // 4) FX coverage gaps: expenses with currency != base lacking a rate on or before date
    let base = get_base_currency(&session.conn)?;
    let mut seen = BTreeSet::new();
    for e in &l.expenses {
        if e.currency == base || !seen.insert((e.date, e.currency.as_str())) {
            continue;
        }
        let direct = find_rate(&session.conn, e.date, &base, &e.currency)?;
        let reverse = find_rate(&session.conn, e.date, &e.currency, &base)?;
        if direct.is_none() && reverse.is_none() {
            rows.push(vec![
                "missing_fx".into(),
                format!("{} {}", e.date, e.currency),
            ]);
        }
    }
    Ok(rows)
}

pub fn handle(session: &Session) -> Result<()> {
    let rows = diagnose(session)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
