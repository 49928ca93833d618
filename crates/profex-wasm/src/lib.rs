//! WASM bindings for proforma invoice extraction.
//!
//! Exposes the extractor to browsers and Node.js. Results are returned as
//! plain JS objects shaped like the JSON produced by the CLI.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use profex_core::{
    CanonicalInvoice, Extractor, ExtractionRecord, FileKind, ProfexConfig,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract an uploaded file into the flat extraction record.
///
/// Failures are reported inside the record (`success: false`), never thrown.
#[wasm_bindgen]
pub fn extract_from_bytes(bytes: &[u8], filename: &str) -> Result<JsValue, JsValue> {
    to_js(&Extractor::default().extract_from_bytes(bytes, filename))
}

/// Parse already-extracted invoice text into the flat extraction record.
#[wasm_bindgen]
pub fn parse_invoice_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&text_record(&Extractor::default(), text))
}

/// Parse invoice text and return the canonical projection as a JSON string.
///
/// Throws the failure message when nothing could be extracted.
#[wasm_bindgen]
pub fn build_invoice_json(text: &str) -> Result<String, JsValue> {
    canonical_json(&Extractor::default(), text)
}

/// Classify an upload: "pdf", "image" or "unsupported".
#[wasm_bindgen]
pub fn file_kind(bytes: &[u8], filename: &str) -> String {
    match profex_core::sniff_file_kind(bytes, filename) {
        FileKind::Pdf => "pdf",
        FileKind::Image => "image",
        FileKind::Unsupported => "unsupported",
    }
    .to_string()
}

/// Parse an amount with comma thousands separators, such as "1,234.50".
#[wasm_bindgen]
pub fn parse_amount(amount: &str) -> Option<f64> {
    profex_core::invoice::rules::parse_amount(amount).and_then(|d| d.to_f64())
}

fn text_record(extractor: &Extractor, text: &str) -> ExtractionRecord {
    match extractor.extract_from_text(text) {
        Ok(extraction) => ExtractionRecord::success(&extraction.invoice, extraction.raw_text),
        Err(failure) => failure.into(),
    }
}

fn canonical_json(extractor: &Extractor, text: &str) -> Result<String, JsValue> {
    let extraction = extractor
        .extract_from_text(text)
        .map_err(|failure| JsValue::from_str(&failure.message))?;

    serde_json::to_string(&CanonicalInvoice::from(&extraction.invoice))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Configurable extractor for repeated use from JS.
#[wasm_bindgen]
pub struct ProformaExtractor {
    extractor: Extractor,
}

#[wasm_bindgen]
impl ProformaExtractor {
    /// Create an extractor. `config_json` overrides defaults field by field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ProformaExtractor, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str::<ProfexConfig>(&json)
                .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?,
            None => ProfexConfig::default(),
        };

        Ok(Self {
            extractor: Extractor::new(&config),
        })
    }

    /// Extract an uploaded file into the flat extraction record.
    #[wasm_bindgen]
    pub fn extract(&self, bytes: &[u8], filename: &str) -> Result<JsValue, JsValue> {
        to_js(&self.extractor.extract_from_bytes(bytes, filename))
    }

    /// Parse already-extracted text into the flat extraction record.
    #[wasm_bindgen]
    pub fn parse_text(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&text_record(&self.extractor, text))
    }

    /// Canonical projection of the given text, as a JSON string.
    #[wasm_bindgen]
    pub fn canonical(&self, text: &str) -> Result<String, JsValue> {
        canonical_json(&self.extractor, text)
    }
}
