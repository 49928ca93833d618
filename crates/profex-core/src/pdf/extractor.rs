//! PDF text extraction using pdf-extract and lopdf.

use lopdf::Document;
use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, info, trace, warn};

use super::{Result, TextBackend, TextOutcome};
use crate::error::PdfError;
use crate::models::config::{BackendKind, PdfConfig};

/// Load a PDF, decrypting documents protected by an empty password.
pub fn load_document(data: &[u8]) -> Result<Document> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");
    }

    let page_count = doc.get_pages().len();
    if page_count == 0 {
        return Err(PdfError::NoPages);
    }

    trace!("Loaded PDF with {} pages", page_count);
    Ok(doc)
}

/// Bytes pdf-extract can read: the input itself, or a decrypted copy.
fn plain_bytes(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
    if !doc.is_encrypted() {
        return Ok(Cow::Borrowed(data));
    }

    if doc.decrypt("").is_err() {
        return Err(PdfError::Encrypted);
    }
    let mut decrypted = Vec::new();
    doc.save_to(&mut decrypted)
        .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
    Ok(Cow::Owned(decrypted))
}

/// Text backend built on `pdf_extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractBackend;

impl TextBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        BackendKind::PdfExtract.name()
    }

    fn extract_text(&self, data: &[u8]) -> Result<TextOutcome> {
        let bytes = plain_bytes(data)?;

        // pdf-extract panics on some malformed font programs
        let text = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(&bytes)))
            .map_err(|_| PdfError::TextExtraction("pdf-extract panicked".to_string()))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        Ok(TextOutcome::from_text(text))
    }
}

/// Text backend built on lopdf's per-page text extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl TextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        BackendKind::Lopdf.name()
    }

    fn extract_text(&self, data: &[u8]) -> Result<TextOutcome> {
        let doc = load_document(data)?;

        let mut text = String::new();
        let mut last_error = None;
        let mut extracted_pages = 0;

        for page in doc.get_pages().keys() {
            match doc.extract_text(&[*page]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                    extracted_pages += 1;
                }
                Err(e) => {
                    trace!("lopdf could not extract page {}: {}", page, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        match (extracted_pages, last_error) {
            (0, Some(e)) => Err(PdfError::TextExtraction(e)),
            _ => Ok(TextOutcome::from_text(text)),
        }
    }
}

/// Instantiate the configured backends in priority order.
pub fn backends_from_config(config: &PdfConfig) -> Vec<Box<dyn TextBackend>> {
    config
        .backends
        .iter()
        .map(|kind| -> Box<dyn TextBackend> {
            match kind {
                BackendKind::PdfExtract => Box::new(PdfExtractBackend),
                BackendKind::Lopdf => Box::new(LopdfBackend),
            }
        })
        .collect()
}

/// Text obtained from the backend chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExtraction {
    /// Backend that produced the outcome.
    pub backend: &'static str,
    pub outcome: TextOutcome,
}

/// Try each backend in order. The first one returning text wins.
///
/// When every backend reports an empty document the outcome is
/// [`TextOutcome::Empty`]. When any backend failed and none produced text
/// the per-backend reasons are aggregated into one error.
pub fn extract_text(backends: &[Box<dyn TextBackend>], data: &[u8]) -> Result<TextExtraction> {
    if backends.is_empty() {
        return Err(PdfError::NoBackend);
    }

    let mut reasons: Vec<(&'static str, String)> = Vec::new();
    let mut failed = false;

    for backend in backends {
        match backend.extract_text(data) {
            Ok(TextOutcome::Text(text)) => {
                info!("Extracted {} characters using {}", text.len(), backend.name());
                return Ok(TextExtraction {
                    backend: backend.name(),
                    outcome: TextOutcome::Text(text),
                });
            }
            Ok(TextOutcome::Empty) => {
                warn!("{} extracted empty text", backend.name());
                reasons.push((backend.name(), format!("No text found in PDF ({})", backend.name())));
            }
            Err(e) => {
                warn!("{} extraction failed: {}", backend.name(), e);
                reasons.push((backend.name(), e.to_string()));
                failed = true;
            }
        }
    }

    if !failed {
        let backend = backends.last().map_or("none", |b| b.name());
        return Ok(TextExtraction {
            backend,
            outcome: TextOutcome::Empty,
        });
    }

    Err(PdfError::TextExtraction(aggregate_reasons(&reasons)))
}

fn aggregate_reasons(reasons: &[(&'static str, String)]) -> String {
    match reasons {
        [(_, reason)] => reason.clone(),
        _ => {
            let parts: Vec<String> = reasons
                .iter()
                .map(|(name, reason)| format!("{}: {}", name, reason))
                .collect();
            format!("PDF extraction failed - {}", parts.join(". "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, std::result::Result<TextOutcome, PdfError>);

    impl TextBackend for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn extract_text(&self, _data: &[u8]) -> Result<TextOutcome> {
            self.1.clone()
        }
    }

    fn chain(backends: Vec<Fixed>) -> Vec<Box<dyn TextBackend>> {
        backends
            .into_iter()
            .map(|b| Box::new(b) as Box<dyn TextBackend>)
            .collect()
    }

    #[test]
    fn test_first_text_wins() {
        let backends = chain(vec![
            Fixed("a", Err(PdfError::Parse("bad xref".to_string()))),
            Fixed("b", Ok(TextOutcome::Text("hello".to_string()))),
            Fixed("c", Ok(TextOutcome::Text("ignored".to_string()))),
        ]);
        let result = extract_text(&backends, b"%PDF").unwrap();
        assert_eq!(result.backend, "b");
        assert_eq!(result.outcome, TextOutcome::Text("hello".to_string()));
    }

    #[test]
    fn test_all_empty_is_empty() {
        let backends = chain(vec![
            Fixed("a", Ok(TextOutcome::Empty)),
            Fixed("b", Ok(TextOutcome::Empty)),
        ]);
        let result = extract_text(&backends, b"%PDF").unwrap();
        assert_eq!(result.outcome, TextOutcome::Empty);
    }

    #[test]
    fn test_failures_are_aggregated() {
        let backends = chain(vec![
            Fixed("a", Err(PdfError::Parse("bad xref".to_string()))),
            Fixed("b", Err(PdfError::TextExtraction("no font".to_string()))),
        ]);
        let err = extract_text(&backends, b"%PDF").unwrap_err();
        assert_eq!(
            err,
            PdfError::TextExtraction(
                "PDF extraction failed - a: failed to parse PDF: bad xref. b: failed to extract text: no font"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_single_failure_keeps_reason() {
        let backends = chain(vec![Fixed("a", Err(PdfError::Encrypted))]);
        let err = extract_text(&backends, b"%PDF").unwrap_err();
        assert_eq!(err, PdfError::TextExtraction("PDF is encrypted".to_string()));
    }

    #[test]
    fn test_no_backends() {
        assert_eq!(extract_text(&[], b"%PDF").unwrap_err(), PdfError::NoBackend);
    }

    #[test]
    fn test_garbage_bytes_fail_in_real_backends() {
        let backends: Vec<Box<dyn TextBackend>> = backends_from_config(&PdfConfig::default());
        assert_eq!(backends.len(), 2);
        assert!(extract_text(&backends, b"%PDF-1.4 not really a pdf").is_err());
    }
}
