//! Numeric token scanning and quantity/rate/value role assignment.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::amounts::parse_amount;
use super::patterns::{NUMBER, PERCENT_SUFFIX};

/// A number found on an item line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericToken {
    pub value: Decimal,
    /// Immediately followed by `%`.
    pub percent: bool,
}

/// Scan `text` for numeric runs in order of appearance.
pub fn scan_numbers(text: &str) -> Vec<NumericToken> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| {
            let value = parse_amount(m.as_str())?;
            let percent = PERCENT_SUFFIX.is_match(&text[m.end()..]);
            Some(NumericToken { value, percent })
        })
        .collect()
}

/// Roles assigned to an item's numbers. Unset roles stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberRoles {
    pub qty: Option<u32>,
    pub rate: Option<Decimal>,
    pub value: Option<Decimal>,
}

/// Assigns plain numbers to quantity, rate and value.
#[derive(Debug, Clone)]
pub struct NumberDisambiguator {
    quantity_ceiling: Decimal,
}

impl NumberDisambiguator {
    pub fn new() -> Self {
        Self::with_ceiling(1000)
    }

    /// Quantity candidates must be strictly below `ceiling`.
    pub fn with_ceiling(ceiling: u32) -> Self {
        Self {
            quantity_ceiling: Decimal::from(ceiling),
        }
    }

    fn is_quantity_candidate(&self, n: Decimal) -> bool {
        n.fract().is_zero() && n > Decimal::ZERO && n < self.quantity_ceiling
    }

    /// Assign roles to `numbers`, which must be in order of appearance.
    pub fn assign(&self, numbers: &[Decimal]) -> NumberRoles {
        match numbers {
            [] => NumberRoles::default(),
            [value] => NumberRoles {
                value: Some(*value),
                ..Default::default()
            },
            [first, second] => {
                if self.is_quantity_candidate(*first) && first < second {
                    NumberRoles {
                        qty: first.to_u32(),
                        value: Some(*second),
                        ..Default::default()
                    }
                } else {
                    NumberRoles {
                        value: Some((*first).max(*second)),
                        ..Default::default()
                    }
                }
            }
            _ => self.assign_many(numbers),
        }
    }

    fn assign_many(&self, numbers: &[Decimal]) -> NumberRoles {
        let Some(max) = numbers.iter().copied().max() else {
            return NumberRoles::default();
        };

        let qty = numbers
            .iter()
            .copied()
            .find(|n| self.is_quantity_candidate(*n) && *n < max);

        match qty {
            Some(qty) => {
                let rate = numbers
                    .iter()
                    .copied()
                    .find(|n| *n != qty && *n != max && *n > Decimal::ZERO)
                    .or_else(|| max.checked_div(qty));
                NumberRoles {
                    qty: qty.to_u32(),
                    rate,
                    value: Some(max),
                }
            }
            None => NumberRoles {
                qty: None,
                rate: numbers.get(numbers.len() - 2).copied(),
                value: numbers.last().copied(),
            },
        }
    }
}

impl Default for NumberDisambiguator {
    fn default() -> Self {
        Self::new()
    }
}
