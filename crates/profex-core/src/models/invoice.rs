//! Proforma invoice data models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A parsed proforma invoice: header attributes, totals and line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedInvoice {
    /// Labeled header attributes.
    pub header: HeaderFields,

    /// Monetary totals as printed on the document.
    pub totals: MonetaryTotals,

    /// Line items in encounter order.
    pub items: Vec<LineItem>,

    /// Which extractor produced `items`.
    pub item_source: ItemSource,
}

impl ParsedInvoice {
    /// True when at least one of customer name, invoice number, total or
    /// any item was recovered.
    pub fn has_data(&self) -> bool {
        self.header.customer_name.is_some()
            || self.header.invoice_no.is_some()
            || self.totals.total.is_some()
            || !self.items.is_empty()
    }
}

/// Where the line items came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Positioned-token table extraction.
    Table,
    /// Line-oriented text fallback.
    Text,
    /// No items were found.
    #[default]
    None,
}

/// Header attributes. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub invoice_no: Option<String>,
    pub code_no: Option<String>,
    /// Issue date, verbatim as printed (validated as a calendar date).
    pub date: Option<String>,
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub reference: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_terms: Option<String>,
    pub remarks: Option<String>,
    pub attended_by: Option<String>,
    pub kind_attention: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<String>,
    pub seller_phone: Option<String>,
    pub seller_email: Option<String>,
    /// Seller TIN, when printed in the letterhead.
    pub seller_tax_id: Option<String>,
    /// Seller VAT registration number, when printed in the letterhead.
    pub seller_vat_reg: Option<String>,
}

/// Document totals. No arithmetic relation between them is enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryTotals {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
}

impl MonetaryTotals {
    /// VAT percent back-computed from tax and subtotal, rounded to 2 decimals.
    /// `None` when the ratio overflows.
    pub fn vat_percent(&self) -> Option<Decimal> {
        match (self.subtotal, self.tax) {
            (Some(subtotal), Some(tax)) if subtotal > Decimal::ZERO => tax
                .checked_div(subtotal)?
                .checked_mul(Decimal::ONE_HUNDRED)
                .map(|percent| percent.round_dp(2)),
            _ => None,
        }
    }
}

/// A single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description, never empty.
    pub description: String,

    /// Item code (digits or alphanumeric).
    pub code: Option<String>,

    /// Unit of measure (NOS, PCS, KG, ...).
    pub unit: Option<String>,

    /// Quantity, always at least 1.
    pub qty: u32,

    /// Unit rate.
    pub rate: Option<Decimal>,

    /// Line value.
    pub value: Option<Decimal>,

    /// First percentage printed on the item line.
    pub vat_percent: Option<Decimal>,
}

impl LineItem {
    /// Create an item with the given description and default quantity.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            code: None,
            unit: None,
            qty: 1,
            rate: None,
            value: None,
            vat_percent: None,
        }
    }
}

/// Collapse whitespace and cap the description at `max_len` characters.
pub fn clean_description(raw: &str, max_len: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_len).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_vat_percent() {
        let totals = MonetaryTotals {
            subtotal: Some(Decimal::from(1000)),
            tax: Some(Decimal::from(180)),
            total: None,
        };
        assert_eq!(totals.vat_percent(), Some(Decimal::from(18)));

        let totals = MonetaryTotals {
            subtotal: Some(Decimal::from(3)),
            tax: Some(Decimal::from(1)),
            total: None,
        };
        assert_eq!(totals.vat_percent(), Some(Decimal::from_str("33.33").unwrap()));
    }

    #[test]
    fn test_vat_percent_requires_positive_subtotal() {
        let totals = MonetaryTotals {
            subtotal: Some(Decimal::ZERO),
            tax: Some(Decimal::from(10)),
            total: None,
        };
        assert_eq!(totals.vat_percent(), None);
        assert_eq!(MonetaryTotals::default().vat_percent(), None);
    }

    #[test]
    fn test_vat_percent_overflow_is_absent() {
        let totals = MonetaryTotals {
            subtotal: Some(Decimal::from_str("0.0000000001").unwrap()),
            tax: Some(Decimal::from_str("79228162514264337593543950").unwrap()),
            total: None,
        };
        assert_eq!(totals.vat_percent(), None);
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("  Gate   valve\n 2 inch ", 255), "Gate valve 2 inch");
        assert_eq!(clean_description("abcdef", 3), "abc");
    }

    #[test]
    fn test_has_data() {
        let mut invoice = ParsedInvoice::default();
        assert!(!invoice.has_data());
        invoice.header.invoice_no = Some("PI-1".to_string());
        assert!(invoice.has_data());
    }
}
