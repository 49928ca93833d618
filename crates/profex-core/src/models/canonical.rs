//! Canonical invoice projection: the parsed invoice regrouped into
//! metadata, parties, items and totals.

use serde::{Deserialize, Serialize};

use super::invoice::ParsedInvoice;
use super::record::to_float;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalInvoice {
    pub invoice_metadata: InvoiceMetadata,
    pub seller_details: SellerDetails,
    pub customer_details: CustomerDetails,
    pub items: Vec<CanonicalItem>,
    pub totals: CanonicalTotals,
    pub footer_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: Option<String>,
    pub customer_reference: Option<String>,
    pub reference_date: String,
    pub page: String,
    pub pages: String,
    pub issue_date: Option<String>,
    pub due_date: String,
    pub delivery_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerDetails {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub vat_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub code: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    /// 1-based position in the item list.
    pub sr_no: usize,
    pub item_code: Option<String>,
    pub description: String,
    #[serde(rename = "type")]
    pub unit: Option<String>,
    pub quantity: u32,
    pub rate: Option<f64>,
    pub vat_percent: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTotals {
    pub sub_total: Option<f64>,
    pub vat_amount: Option<f64>,
    pub vat_percent: Option<f64>,
    pub discount: Option<f64>,
    pub grand_total: Option<f64>,
}

impl From<&ParsedInvoice> for CanonicalInvoice {
    fn from(invoice: &ParsedInvoice) -> Self {
        let header = &invoice.header;

        let kind = match &header.invoice_no {
            Some(number) if number.to_uppercase().starts_with("PI") => "Proforma Invoice",
            _ => "Invoice",
        };

        let items = invoice
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| CanonicalItem {
                sr_no: idx + 1,
                item_code: item.code.clone(),
                description: item.description.clone(),
                unit: item.unit.clone(),
                quantity: item.qty,
                rate: to_float(item.rate),
                vat_percent: to_float(item.vat_percent),
                value: to_float(item.value),
            })
            .collect();

        Self {
            invoice_metadata: InvoiceMetadata {
                kind: kind.to_string(),
                number: header.invoice_no.clone(),
                customer_reference: header.reference.clone(),
                reference_date: String::new(),
                page: "1".to_string(),
                pages: "1".to_string(),
                issue_date: header.date.clone(),
                due_date: String::new(),
                delivery_date: String::new(),
            },
            seller_details: SellerDetails {
                name: header.seller_name.clone(),
                address: header.seller_address.clone(),
                phone: header.seller_phone.clone(),
                email: header.seller_email.clone(),
                tax_id: header.seller_tax_id.clone(),
                vat_number: header.seller_vat_reg.clone(),
            },
            customer_details: CustomerDetails {
                code: header.code_no.clone(),
                name: header.customer_name.clone(),
                address: header.address.clone(),
                contact_person: header.kind_attention.clone(),
                phone: header.phone.clone(),
                email: header.email.clone(),
            },
            items,
            totals: CanonicalTotals {
                sub_total: to_float(invoice.totals.subtotal),
                vat_amount: to_float(invoice.totals.tax),
                vat_percent: to_float(invoice.totals.vat_percent()),
                discount: None,
                grand_total: to_float(invoice.totals.total),
            },
            footer_notes: header.remarks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn sample() -> ParsedInvoice {
        let mut invoice = ParsedInvoice::default();
        invoice.header.invoice_no = Some("PI-2024-001".to_string());
        invoice.header.kind_attention = Some("Mr. Juma".to_string());
        invoice.header.seller_vat_reg = Some("40-012345-A".to_string());
        invoice.header.remarks = Some("Prices valid 30 days".to_string());
        invoice.totals.subtotal = Some(Decimal::from(1000));
        invoice.totals.tax = Some(Decimal::from(180));
        invoice.totals.total = Some(Decimal::from(1180));
        invoice.items.push(LineItem::new("Hose clamp"));
        invoice.items.push(LineItem::new("Gasket"));
        invoice
    }

    #[test]
    fn test_projection_groups_fields() {
        let canonical = CanonicalInvoice::from(&sample());

        assert_eq!(canonical.invoice_metadata.kind, "Proforma Invoice");
        assert_eq!(canonical.invoice_metadata.page, "1");
        assert_eq!(canonical.invoice_metadata.due_date, "");
        assert_eq!(canonical.customer_details.contact_person.as_deref(), Some("Mr. Juma"));
        assert_eq!(canonical.seller_details.vat_number.as_deref(), Some("40-012345-A"));
        assert_eq!(canonical.footer_notes.as_deref(), Some("Prices valid 30 days"));
        assert_eq!(canonical.totals.vat_percent, Some(18.0));
        assert_eq!(canonical.totals.discount, None);
    }

    #[test]
    fn test_items_numbered_positionally() {
        let canonical = CanonicalInvoice::from(&sample());
        let numbers: Vec<usize> = canonical.items.iter().map(|i| i.sr_no).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_plain_invoice_type() {
        let mut invoice = sample();
        invoice.header.invoice_no = Some("INV-77".to_string());
        let canonical = CanonicalInvoice::from(&invoice);
        assert_eq!(canonical.invoice_metadata.kind, "Invoice");

        let json = serde_json::to_value(&canonical).unwrap();
        assert_eq!(json["invoice_metadata"]["type"], "Invoice");
        assert!(json["items"][0].get("type").is_some());
    }
}
