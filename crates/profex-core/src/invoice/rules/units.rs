//! Units of measure.

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::NUMERIC_TAIL;

lazy_static! {
    static ref UNIT_KEYWORD: Regex = Regex::new(
        r"(?i)\b(PCS|NOS|KG|HR|LTR|PIECES|UNITS?|KIT|BOX|CASE|SETS?|PC|UNT|KTS|BAG|BUNDLE|PACK|CYLINDER|LITRE|TYRE|TIRE|TL|LT)\b"
    ).unwrap();

    static ref TABLE_UNIT: Regex = Regex::new(
        r"(?i)\b(NOS|PCS|KG|HR|LTR|UNT|BOX|PC)\b"
    ).unwrap();
}

/// A unit keyword located in an item line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMatch {
    /// Uppercased unit code.
    pub unit: String,
    /// Byte offset where the keyword starts.
    pub start: usize,
    /// Byte offset just past the keyword.
    pub end: usize,
}

/// Locate the unit keyword in an item line.
///
/// Descriptions may contain unit words ("Tool kit"), so the first keyword
/// followed only by numbers is preferred. Otherwise the last keyword wins.
pub fn find_unit(text: &str) -> Option<UnitMatch> {
    let matches: Vec<_> = UNIT_KEYWORD.find_iter(text).collect();
    let chosen = matches
        .iter()
        .find(|m| NUMERIC_TAIL.is_match(&text[m.end()..]))
        .or_else(|| matches.last())?;

    Some(UnitMatch {
        unit: chosen.as_str().to_uppercase(),
        start: chosen.start(),
        end: chosen.end(),
    })
}

/// Unit for a table cell: a recognized code, else the raw text uppercased.
pub fn normalize_table_unit(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match TABLE_UNIT.captures(cell) {
        Some(caps) => Some(caps[1].to_uppercase()),
        None => Some(cell.to_uppercase()),
    }
}
