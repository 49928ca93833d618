//! Monetary total extraction.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::LineRule;
use super::patterns::{SUBTOTAL, TAX, TOTAL};
use crate::models::invoice::MonetaryTotals;

/// Finds the first labeled amount on any line.
pub struct AmountRule {
    pattern: &'static Regex,
}

impl AmountRule {
    pub fn subtotal() -> Self {
        Self { pattern: &SUBTOTAL }
    }

    pub fn tax() -> Self {
        Self { pattern: &TAX }
    }

    pub fn total() -> Self {
        Self { pattern: &TOTAL }
    }
}

impl LineRule for AmountRule {
    type Output = Decimal;

    fn find(&self, lines: &[String]) -> Option<(Decimal, usize)> {
        lines.iter().enumerate().find_map(|(idx, line)| {
            self.pattern
                .captures_iter(line)
                .find_map(|caps| parse_amount(&caps[1]))
                .map(|amount| (amount, idx))
        })
    }
}

/// Extract subtotal, tax and total independently.
pub fn extract_totals(lines: &[String]) -> MonetaryTotals {
    MonetaryTotals {
        subtotal: AmountRule::subtotal().value(lines),
        tax: AmountRule::tax().value(lines),
        total: AmountRule::total().value(lines),
    }
}

/// Parse an amount with comma thousands separators as an exact decimal.
/// Negative or malformed input yields `None`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

/// Parse a table cell: strip everything except digits, dots and minus signs.
pub fn parse_cell_amount(s: &str) -> Option<Decimal> {
    let cleaned = super::patterns::NON_DECIMAL_CHARS.replace_all(s, "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}
