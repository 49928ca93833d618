//! The flat extraction record returned to callers.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::invoice::{LineItem, ParsedInvoice};

/// Failure codes reported in [`ExtractionRecord::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    EmptyFile,
    ImageFileNotSupported,
    UnsupportedFileType,
    PdfExtractionFailed,
    NoTextExtracted,
    ParsingFailed,
}

impl ErrorCode {
    /// Default user-facing message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::EmptyFile => "File is empty. Please upload a valid PDF file.",
            ErrorCode::ImageFileNotSupported => {
                "Image files are not supported. Please convert to PDF or enter details manually."
            }
            ErrorCode::UnsupportedFileType => "Please upload a PDF file.",
            ErrorCode::PdfExtractionFailed => "Could not extract text from PDF.",
            ErrorCode::NoTextExtracted => "No readable text found in PDF.",
            ErrorCode::ParsingFailed => "Could not extract structured data from PDF.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmptyFile => "empty_file",
            ErrorCode::ImageFileNotSupported => "image_file_not_supported",
            ErrorCode::UnsupportedFileType => "unsupported_file_type",
            ErrorCode::PdfExtractionFailed => "pdf_extraction_failed",
            ErrorCode::NoTextExtracted => "no_text_extracted",
            ErrorCode::ParsingFailed => "parsing_failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one document extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,

    pub message: String,

    /// OCR is never performed.
    pub ocr_available: bool,

    pub header: RecordHeader,

    pub items: Vec<RecordItem>,

    /// Normalized extracted text, empty when no text was obtained.
    pub raw_text: String,
}

impl ExtractionRecord {
    /// A failed record with the default message for `code`.
    pub fn failure(code: ErrorCode, raw_text: impl Into<String>) -> Self {
        Self::failure_with_message(code, code.message(), raw_text)
    }

    pub fn failure_with_message(
        code: ErrorCode,
        message: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(code),
            message: message.into(),
            ocr_available: false,
            header: RecordHeader::default(),
            items: Vec::new(),
            raw_text: raw_text.into(),
        }
    }

    /// A successful record built from a parsed invoice.
    pub fn success(invoice: &ParsedInvoice, raw_text: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            message: "Invoice data extracted successfully".to_string(),
            ocr_available: false,
            header: RecordHeader::from(invoice),
            items: invoice.items.iter().map(RecordItem::from).collect(),
            raw_text: raw_text.into(),
        }
    }
}

/// Header fields and totals, flattened. Amounts are floats in this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordHeader {
    pub invoice_no: Option<String>,
    pub code_no: Option<String>,
    pub date: Option<String>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub reference: Option<String>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub total: Option<f64>,
    pub payment_method: Option<String>,
    pub delivery_terms: Option<String>,
    pub remarks: Option<String>,
    pub attended_by: Option<String>,
    pub kind_attention: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<String>,
    pub seller_phone: Option<String>,
    pub seller_email: Option<String>,
}

impl From<&ParsedInvoice> for RecordHeader {
    fn from(invoice: &ParsedInvoice) -> Self {
        let header = invoice.header.clone();
        Self {
            invoice_no: header.invoice_no,
            code_no: header.code_no,
            date: header.date,
            customer_name: header.customer_name,
            phone: header.phone,
            email: header.email,
            address: header.address,
            reference: header.reference,
            subtotal: to_float(invoice.totals.subtotal),
            tax: to_float(invoice.totals.tax),
            total: to_float(invoice.totals.total),
            payment_method: header.payment_method,
            delivery_terms: header.delivery_terms,
            remarks: header.remarks,
            attended_by: header.attended_by,
            kind_attention: header.kind_attention,
            seller_name: header.seller_name,
            seller_address: header.seller_address,
            seller_phone: header.seller_phone,
            seller_email: header.seller_email,
        }
    }
}

/// A line item in the flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordItem {
    pub description: String,
    pub qty: u32,
    pub unit: Option<String>,
    pub code: Option<String>,
    pub value: Option<f64>,
    pub rate: Option<f64>,
}

impl From<&LineItem> for RecordItem {
    fn from(item: &LineItem) -> Self {
        Self {
            description: item.description.clone(),
            qty: item.qty,
            unit: item.unit.clone(),
            code: item.code.clone(),
            value: to_float(item.value),
            rate: to_float(item.rate),
        }
    }
}

pub(crate) fn to_float(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}
