//! Proforma invoice parser over extracted text.

use tracing::{debug, info};

use super::fields::{FieldExtractor, split_sections};
use super::line_items::LineItemParser;
use super::rules::extract_totals;
use super::{Result, content_lines};
use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{ItemSource, ParsedInvoice};

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse an invoice from extracted text.
    fn parse(&self, text: &str) -> Result<ParsedInvoice>;
}

/// Text-only proforma parser: header fields, totals and text-fallback items.
#[derive(Debug, Clone)]
pub struct ProformaParser {
    fields: FieldExtractor,
    items: LineItemParser,
    seller_fallback_lines: usize,
}

impl ProformaParser {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            fields: FieldExtractor::from_config(config),
            items: LineItemParser::from_config(config),
            seller_fallback_lines: config.seller_fallback_lines,
        }
    }

    /// Replace the field extractor.
    pub fn with_fields(mut self, fields: FieldExtractor) -> Self {
        self.fields = fields;
        self
    }

    /// Replace the text-fallback item parser.
    pub fn with_items(mut self, items: LineItemParser) -> Self {
        self.items = items;
        self
    }
}

impl Default for ProformaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for ProformaParser {
    fn parse(&self, text: &str) -> Result<ParsedInvoice> {
        let lines = content_lines(text);
        if lines.is_empty() {
            return Err(ExtractionError::NoData);
        }
        info!("Parsing invoice from {} lines of text", lines.len());

        let header = self.fields.extract(&lines);
        let body = split_sections(&lines, self.seller_fallback_lines).body;
        let totals = extract_totals(body);
        let items = self.items.parse(body);

        let item_source = if items.is_empty() {
            ItemSource::None
        } else {
            ItemSource::Text
        };
        debug!(
            "Parsed {} items, total {:?}",
            items.len(),
            totals.total
        );

        Ok(ParsedInvoice {
            header,
            totals,
            items,
            item_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const DOCUMENT: &str = "ACME SUPPLIES LIMITED\r\n\
        P.O. Box 4411, Dar es Salaam\r\n\
        Tel: +255 22 286 1234\r\n\
        \r\n\
        PROFORMA INVOICE\r\n\
        PI No: PI-2024-0113\r\n\
        Customer Name: ACME TRADERS LTD   Date: 12/03/2024\r\n\
        Sr Code Description Unit Qty Rate Value\r\n\
        1  550213  Industrial Valve 2\"  NOS  4  125000.00  500000.00\r\n\
        2  550214  Gate valve DN80  PCS  2  250,000.00  500,000.00\r\n\
        Net Value        TZS 1,000,000.00\r\n\
        VAT 18%          TZS 180,000.00\r\n\
        Gross Value      TZS 1,180,000.00\r\n";

    #[test]
    fn test_parse_full_document() {
        let invoice = ProformaParser::new().parse(DOCUMENT).unwrap();

        assert_eq!(invoice.header.invoice_no.as_deref(), Some("PI-2024-0113"));
        assert_eq!(invoice.header.customer_name.as_deref(), Some("ACME TRADERS LTD"));
        assert_eq!(invoice.header.date.as_deref(), Some("12/03/2024"));
        assert_eq!(invoice.header.seller_name.as_deref(), Some("ACME SUPPLIES LIMITED"));
        assert_eq!(invoice.totals.subtotal, Some(Decimal::from_str("1000000.00").unwrap()));
        assert_eq!(invoice.totals.total, Some(Decimal::from_str("1180000.00").unwrap()));
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.item_source, ItemSource::Text);
        assert!(invoice.has_data());
    }

    #[test]
    fn test_blank_text_is_no_data() {
        assert_eq!(
            ProformaParser::new().parse(" \r\n\n\t").unwrap_err(),
            ExtractionError::NoData
        );
    }

    #[test]
    fn test_text_without_fields_has_no_data() {
        let invoice = ProformaParser::new()
            .parse("Thank you for your business\nPage 1 of 1")
            .unwrap();
        assert!(!invoice.has_data());
        assert_eq!(invoice.item_source, ItemSource::None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = ProformaParser::new();
        let first = serde_json::to_string(&parser.parse(DOCUMENT).unwrap()).unwrap();
        let second = serde_json::to_string(&parser.parse(DOCUMENT).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
