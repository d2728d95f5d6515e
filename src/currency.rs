// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: String,
    pub symbol: String,
    pub decimals: u32,
}

const KNOWN: &[(&str, &str, u32)] = &[
    ("USD", "$", 2),
    ("EUR", "€", 2),
    ("GBP", "£", 2),
    ("INR", "₹", 2),
    ("JPY", "¥", 0),
    ("KRW", "₩", 0),
    ("CNY", "¥", 2),
    ("CHF", "CHF", 2),
    ("CAD", "C$", 2),
    ("AUD", "A$", 2),
    ("SGD", "S$", 2),
    ("AED", "AED", 2),
    ("SAR", "SAR", 2),
    ("KWD", "KD", 3),
    ("BHD", "BD", 3),
    ("TRY", "₺", 2),
    ("MXN", "MX$", 2),
    ("BRL", "R$", 2),
];

/// Metadata for `code`; unknown codes get two decimals and the code as
/// symbol.
pub fn info(code: &str) -> CurrencyInfo {
    let upper = code.trim().to_uppercase();
    match KNOWN.iter().find(|(c, _, _)| *c == upper) {
        Some((c, s, d)) => CurrencyInfo {
            code: c.to_string(),
            symbol: s.to_string(),
            decimals: *d,
        },
        None => CurrencyInfo {
            symbol: upper.clone(),
            code: upper,
            decimals: 2,
        },
    }
}

pub fn format_amount(amount: Decimal, code: &str) -> String {
    let ci = info(code);
    format!(
        "{}{:.*}",
        ci.symbol,
        ci.decimals as usize,
        amount.round_dp(ci.decimals)
    )
}
