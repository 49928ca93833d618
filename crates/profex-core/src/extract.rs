//! Extraction orchestrator: input sniffing, text backends, parsing and the
//! item-source decision.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, PdfError};
use crate::invoice::{InvoiceParser, ProformaParser, TableExtractor, normalize_text};
use crate::models::config::ProfexConfig;
use crate::models::invoice::{ItemSource, ParsedInvoice};
use crate::models::record::{ErrorCode, ExtractionRecord};
use crate::pdf::{
    self, LopdfTokenSource, TextBackend, TextExtraction, TextOutcome, TokenSource,
    backends_from_config,
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tiff", "tif", "bmp", "webp"];
const PDF_MAGIC: &[u8] = b"%PDF";

/// Input classification from the filename hint and magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Unsupported,
}

/// Classify an upload. Image extensions win over PDF magic bytes.
pub fn sniff_file_kind(data: &[u8], filename: &str) -> FileKind {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => FileKind::Image,
        Some("pdf") => FileKind::Pdf,
        _ if data.len() > PDF_MAGIC.len() && data.starts_with(PDF_MAGIC) => FileKind::Pdf,
        _ => FileKind::Unsupported,
    }
}

/// A successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Parsed header, totals and items.
    pub invoice: ParsedInvoice,
    /// Normalized extracted text.
    pub raw_text: String,
    /// Text backend that produced `raw_text`.
    pub backend: &'static str,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// A failed extraction, carrying the record error code.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct ExtractionFailure {
    pub code: ErrorCode,
    pub message: String,
    /// Text obtained before the failure, if any.
    pub raw_text: String,
}

impl ExtractionFailure {
    fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
            raw_text: String::new(),
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }
}

impl From<ExtractionFailure> for ExtractionRecord {
    fn from(failure: ExtractionFailure) -> Self {
        ExtractionRecord::failure_with_message(failure.code, failure.message, failure.raw_text)
    }
}

/// Stateless document extractor. One instance can serve any number of
/// documents, concurrently.
pub struct Extractor {
    backends: Vec<Box<dyn TextBackend>>,
    token_source: Option<Box<dyn TokenSource>>,
    parser: ProformaParser,
    table: TableExtractor,
}

impl Extractor {
    /// Create an extractor from configuration.
    pub fn new(config: &ProfexConfig) -> Self {
        let token_source: Option<Box<dyn TokenSource>> = if config.pdf.use_positioned_tokens {
            Some(Box::new(
                LopdfTokenSource::new().with_line_tolerance(config.pdf.line_tolerance),
            ))
        } else {
            None
        };

        Self {
            backends: backends_from_config(&config.pdf),
            token_source,
            parser: ProformaParser::from_config(&config.extraction),
            table: TableExtractor::from_config(&config.extraction),
        }
    }

    /// Replace the text backend chain.
    pub fn with_backends(mut self, backends: Vec<Box<dyn TextBackend>>) -> Self {
        self.backends = backends;
        self
    }

    /// Replace the positioned-token source. `None` disables table extraction.
    pub fn with_token_source(mut self, source: Option<Box<dyn TokenSource>>) -> Self {
        self.token_source = source;
        self
    }

    /// Extract an invoice from uploaded bytes.
    pub fn extract(&self, data: &[u8], filename: &str) -> Result<Extraction, ExtractionFailure> {
        let start = clock();

        if data.is_empty() {
            return Err(ExtractionFailure::new(ErrorCode::EmptyFile));
        }
        match sniff_file_kind(data, filename) {
            FileKind::Pdf => {}
            FileKind::Image => {
                debug!("Rejecting image upload {}", filename);
                return Err(ExtractionFailure::new(ErrorCode::ImageFileNotSupported));
            }
            FileKind::Unsupported => {
                debug!("Rejecting unsupported upload {}", filename);
                return Err(ExtractionFailure::new(ErrorCode::UnsupportedFileType));
            }
        }

        let (backend, text) = match pdf::extract_text(&self.backends, data) {
            Ok(TextExtraction {
                backend,
                outcome: TextOutcome::Text(text),
            }) => (backend, text),
            Ok(TextExtraction {
                outcome: TextOutcome::Empty,
                ..
            }) => return Err(ExtractionFailure::new(ErrorCode::NoTextExtracted)),
            Err(e) => {
                let reason = match e {
                    PdfError::TextExtraction(reason) => reason,
                    other => other.to_string(),
                };
                return Err(ExtractionFailure::new(ErrorCode::PdfExtractionFailed)
                    .with_message(format!("Could not extract text from PDF: {}", reason)));
            }
        };

        self.parse_text(&text, Some(data), backend, start)
    }

    /// Parse text that was extracted elsewhere. No table extraction runs.
    pub fn extract_from_text(&self, text: &str) -> Result<Extraction, ExtractionFailure> {
        self.parse_text(text, None, "text", clock())
    }

    /// Extract and convert to the flat record. Never fails.
    pub fn extract_from_bytes(&self, data: &[u8], filename: &str) -> ExtractionRecord {
        match self.extract(data, filename) {
            Ok(extraction) => ExtractionRecord::success(&extraction.invoice, extraction.raw_text),
            Err(failure) => failure.into(),
        }
    }

    fn parse_text(
        &self,
        text: &str,
        data: Option<&[u8]>,
        backend: &'static str,
        start: Option<Instant>,
    ) -> Result<Extraction, ExtractionFailure> {
        let raw_text = normalize_text(text).trim().to_string();
        if raw_text.is_empty() {
            return Err(ExtractionFailure::new(ErrorCode::NoTextExtracted));
        }

        let parsed = catch_unwind(AssertUnwindSafe(|| self.parse_document(data, &raw_text)))
            .unwrap_or_else(|payload| Err(ExtractionError::Panicked(panic_message(payload))));

        let invoice = match parsed {
            Ok(invoice) if invoice.has_data() => invoice,
            Ok(_) => {
                info!("No invoice data recognized in extracted text");
                return Err(ExtractionFailure::new(ErrorCode::ParsingFailed).with_raw_text(raw_text));
            }
            Err(e) => {
                warn!("Parsing failed: {}", e);
                return Err(ExtractionFailure::new(ErrorCode::ParsingFailed).with_raw_text(raw_text));
            }
        };

        let processing_time_ms = start.map_or(0, |t| t.elapsed().as_millis() as u64);
        info!(
            "Extracted {} items ({:?}) in {}ms",
            invoice.items.len(),
            invoice.item_source,
            processing_time_ms
        );

        Ok(Extraction {
            invoice,
            raw_text,
            backend,
            processing_time_ms,
        })
    }

    /// Parse text, preferring table items when the token source finds any.
    fn parse_document(
        &self,
        data: Option<&[u8]>,
        raw_text: &str,
    ) -> Result<ParsedInvoice, ExtractionError> {
        let mut invoice = self.parser.parse(raw_text)?;

        let (Some(source), Some(data)) = (&self.token_source, data) else {
            return Ok(invoice);
        };
        match source.tokens(data) {
            Ok(pages) => {
                let table_items = self.table.extract_pages(&pages);
                if table_items.is_empty() {
                    debug!("Table extraction found no items, keeping text items");
                } else {
                    debug!("Using {} table items", table_items.len());
                    invoice.items = table_items;
                    invoice.item_source = ItemSource::Table;
                }
            }
            Err(e) => warn!("Token extraction failed, keeping text items: {}", e),
        }

        Ok(invoice)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ProfexConfig::default())
    }
}

// wasm32-unknown-unknown has no monotonic clock
#[cfg(not(target_arch = "wasm32"))]
fn clock() -> Option<Instant> {
    Some(Instant::now())
}

#[cfg(target_arch = "wasm32")]
fn clock() -> Option<Instant> {
    None
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
