//! Core library for proforma invoice extraction.
//!
//! This crate provides:
//! - PDF text backends and a positioned-token source
//! - Header field extraction from labeled lines
//! - Item table recovery from token positions, with a line-oriented fallback
//! - The flat extraction record and a canonical invoice projection

pub mod error;
pub mod extract;
pub mod invoice;
pub mod models;
pub mod pdf;

pub use error::{ExtractionError, PdfError, ProfexError, Result};
pub use extract::{Extraction, ExtractionFailure, Extractor, FileKind, sniff_file_kind};
pub use invoice::{
    FieldExtractor, InvoiceParser, LineItemParser, ProformaParser, TableExtractor,
};
pub use invoice::rules::NumberDisambiguator;
pub use models::canonical::CanonicalInvoice;
pub use models::config::ProfexConfig;
pub use models::invoice::{HeaderFields, ItemSource, LineItem, MonetaryTotals, ParsedInvoice};
pub use models::record::{ErrorCode, ExtractionRecord};
pub use pdf::{PageTokens, TextBackend, TextOutcome, Token, TokenSource};
