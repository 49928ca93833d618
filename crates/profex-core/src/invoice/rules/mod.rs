//! Rule-based value extractors for proforma invoices.

pub mod amounts;
pub mod dates;
pub mod numbers;
pub mod patterns;
pub mod units;

pub use amounts::{AmountRule, extract_totals, parse_amount, parse_cell_amount};
pub use dates::{DateRule, parse_date};
pub use numbers::{NumberDisambiguator, NumberRoles, NumericToken, scan_numbers};
pub use units::{find_unit, normalize_table_unit};

/// A rule that scans a line sequence for one value.
pub trait LineRule {
    /// The type of value this rule produces.
    type Output;

    /// Find the first value, together with the index of the line it came from.
    fn find(&self, lines: &[String]) -> Option<(Self::Output, usize)>;

    /// Find the first value, discarding its position.
    fn value(&self, lines: &[String]) -> Option<Self::Output> {
        self.find(lines).map(|(value, _)| value)
    }
}
