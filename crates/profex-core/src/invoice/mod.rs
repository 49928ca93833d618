//! Invoice field and line-item extraction.

pub mod fields;
pub mod line_items;
mod parser;
pub mod rules;
pub mod table;

pub use fields::FieldExtractor;
pub use line_items::{ItemState, LineItemParser, Transition};
pub use parser::{InvoiceParser, ProformaParser};
pub use table::TableExtractor;

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Trimmed, non-blank lines of `text`.
pub fn content_lines(text: &str) -> Vec<String> {
    normalize_text(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_lines() {
        let lines = content_lines("  PROFORMA INVOICE \r\n\r\n\tPI No: 7\rTotal\n   \n");
        assert_eq!(lines, vec!["PROFORMA INVOICE", "PI No: 7", "Total"]);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
