//! Labeled issue date extraction.

use chrono::NaiveDate;

use super::LineRule;
use super::patterns::DATE_LABELED;

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%d-%m-%y"];

/// Finds `Date: dd/mm/yyyy` style labels whose value is a real calendar date.
/// The value is returned verbatim as printed.
pub struct DateRule;

impl DateRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateRule {
    fn default() -> Self {
        Self::new()
    }
}

impl LineRule for DateRule {
    type Output = String;

    fn find(&self, lines: &[String]) -> Option<(String, usize)> {
        lines.iter().enumerate().find_map(|(idx, line)| {
            DATE_LABELED
                .captures_iter(line)
                .map(|caps| caps[1].to_string())
                .find(|raw| parse_date(raw).is_some())
                .map(|raw| (raw, idx))
        })
    }
}

/// Parse a day-first date with either separator and a 2 or 4 digit year.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // %y would accept a four digit year as-is, so pick formats by length
    let year_len = s.rsplit(['/', '-']).next().map(str::len)?;
    DATE_FORMATS
        .iter()
        .filter(|fmt| fmt.ends_with('Y') == (year_len == 4))
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
