//! Error types for the profex-core library.

use thiserror::Error;

/// Error type for configuration and file handling.
#[derive(Error, Debug)]
pub enum ProfexError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// No text backend is configured.
    #[error("no PDF extraction backend available")]
    NoBackend,
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No invoice data could be extracted.
    #[error("no invoice data found")]
    NoData,

    /// A heuristic panicked while parsing.
    #[error("parser panicked: {0}")]
    Panicked(String),
}

/// Result type for the profex library.
pub type Result<T> = std::result::Result<T, ProfexError>;
