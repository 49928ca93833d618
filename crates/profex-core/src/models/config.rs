//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ProfexError, Result};

/// Main configuration for the profex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfexConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Text backends that can turn PDF bytes into text, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `pdf-extract` plain text output.
    PdfExtract,
    /// `lopdf` per-page text extraction.
    Lopdf,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::PdfExtract => "pdf-extract",
            BackendKind::Lopdf => "lopdf",
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Text backends tried in order until one yields text.
    pub backends: Vec<BackendKind>,

    /// Run the positioned-token table extractor.
    pub use_positioned_tokens: bool,

    /// Vertical tolerance (points) for grouping glyph runs into one line.
    pub line_tolerance: f64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            backends: vec![BackendKind::PdfExtract, BackendKind::Lopdf],
            use_positioned_tokens: true,
            line_tolerance: 3.0,
        }
    }
}

/// Heuristic thresholds used by the field and item extractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Keyword categories a line must hit to count as the item table header.
    pub min_header_score: usize,

    /// Quantity candidates must be strictly below this value.
    pub quantity_ceiling: u32,

    /// Lines scanned after a bare label when looking for its value.
    pub lookahead_lines: usize,

    /// Width added beyond the outermost column anchors.
    pub column_sentinel: f64,

    /// Maximum item description length in characters.
    pub max_description_len: usize,

    /// Seller block size when the document has no anchor line.
    pub seller_fallback_lines: usize,

    /// Fold description-only table rows into the previous item. Off by
    /// default: every described row is its own item.
    pub merge_continuation_rows: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_header_score: 3,
            quantity_ceiling: 1000,
            lookahead_lines: 3,
            column_sentinel: 2000.0,
            max_description_len: 255,
            seller_fallback_lines: 8,
            merge_continuation_rows: false,
        }
    }
}

impl ProfexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ProfexError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ProfexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
