//! PDF processing module: text backends and positioned tokens.

mod extractor;
mod tokens;

pub use extractor::{
    LopdfBackend, PdfExtractBackend, TextExtraction, backends_from_config, extract_text,
    load_document,
};
pub use tokens::LopdfTokenSource;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Outcome of a successful backend run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    /// Non-blank text, pages joined with newlines.
    Text(String),
    /// The document decoded but contains no extractable text.
    Empty,
}

impl TextOutcome {
    /// Classify raw backend output.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            TextOutcome::Empty
        } else {
            TextOutcome::Text(text)
        }
    }
}

/// A strategy that turns PDF bytes into plain text.
pub trait TextBackend: Send + Sync {
    /// Name used in logs and aggregated failure messages.
    fn name(&self) -> &'static str;

    /// Extract the document's text. Decoding errors are `Err`, a readable
    /// document without text is `Ok(TextOutcome::Empty)`.
    fn extract_text(&self, data: &[u8]) -> Result<TextOutcome>;
}

/// A word with its page-relative bounding box. `y0` grows downward.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub text: String,
    pub block_id: u32,
    pub line_id: u32,
}

/// Tokens of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageTokens {
    /// Page number (1-indexed).
    pub page: u32,
    pub tokens: Vec<Token>,
}

/// A source of positioned word tokens, one entry per page in page order.
pub trait TokenSource: Send + Sync {
    fn tokens(&self, data: &[u8]) -> Result<Vec<PageTokens>>;
}
