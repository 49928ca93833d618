//! Rendering extraction results.

use serde::Serialize;

use profex_core::{CanonicalInvoice, Extraction, ExtractionFailure, ExtractionRecord, ParsedInvoice};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Flat extraction record (JSON)
    Json,
    /// Canonical invoice projection (JSON)
    Canonical,
    /// One CSV row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Canonical => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Record plus the typed invoice it was built from, when extraction succeeded.
pub struct Outcome {
    pub record: ExtractionRecord,
    pub invoice: Option<ParsedInvoice>,
    pub processing_time_ms: u64,
}

impl From<Result<Extraction, ExtractionFailure>> for Outcome {
    fn from(result: Result<Extraction, ExtractionFailure>) -> Self {
        match result {
            Ok(extraction) => Self {
                record: ExtractionRecord::success(&extraction.invoice, extraction.raw_text),
                invoice: Some(extraction.invoice),
                processing_time_ms: extraction.processing_time_ms,
            },
            Err(failure) => Self {
                record: failure.into(),
                invoice: None,
                processing_time_ms: 0,
            },
        }
    }
}

pub fn render(outcome: &Outcome, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(&outcome.record, pretty),
        // failures have nothing to project, so the record is shown instead
        OutputFormat::Canonical => match &outcome.invoice {
            Some(invoice) => to_json(&CanonicalInvoice::from(invoice), pretty),
            None => to_json(&outcome.record, pretty),
        },
        OutputFormat::Csv => format_csv(&outcome.record),
        OutputFormat::Text => Ok(format_text(&outcome.record)),
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

#[derive(Serialize)]
struct ItemRow<'a> {
    invoice_no: &'a str,
    customer_name: &'a str,
    date: &'a str,
    sr_no: usize,
    code: &'a str,
    description: &'a str,
    unit: &'a str,
    qty: u32,
    rate: Option<f64>,
    value: Option<f64>,
}

fn format_csv(record: &ExtractionRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let header = &record.header;

    if record.items.is_empty() {
        wtr.write_record([
            "invoice_no",
            "customer_name",
            "date",
            "sr_no",
            "code",
            "description",
            "unit",
            "qty",
            "rate",
            "value",
        ])?;
    }

    for (idx, item) in record.items.iter().enumerate() {
        wtr.serialize(ItemRow {
            invoice_no: header.invoice_no.as_deref().unwrap_or(""),
            customer_name: header.customer_name.as_deref().unwrap_or(""),
            date: header.date.as_deref().unwrap_or(""),
            sr_no: idx + 1,
            code: item.code.as_deref().unwrap_or(""),
            description: &item.description,
            unit: item.unit.as_deref().unwrap_or(""),
            qty: item.qty,
            rate: item.rate,
            value: item.value,
        })?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ExtractionRecord) -> String {
    let mut output = String::new();

    if !record.success {
        let code = record.error.map_or("unknown", |e| e.as_str());
        output.push_str(&format!("Extraction failed ({}): {}\n", code, record.message));
        return output;
    }

    let header = &record.header;
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    output.push_str(&format!("Invoice: {}\n", field(&header.invoice_no)));
    output.push_str(&format!("Date: {}\n", field(&header.date)));
    if let Some(reference) = &header.reference {
        output.push_str(&format!("Reference: {}\n", reference));
    }
    output.push('\n');

    output.push_str("Seller:\n");
    output.push_str(&format!("  {}\n", field(&header.seller_name)));
    if let Some(address) = &header.seller_address {
        output.push_str(&format!("  {}\n", address));
    }
    output.push('\n');

    output.push_str("Customer:\n");
    output.push_str(&format!("  {}\n", field(&header.customer_name)));
    if let Some(address) = &header.address {
        output.push_str(&format!("  {}\n", address));
    }
    output.push('\n');

    output.push_str(&format!("Items ({}):\n", record.items.len()));
    for (idx, item) in record.items.iter().enumerate() {
        output.push_str(&format!(
            "  {:>2}. {} x{} {} = {}\n",
            idx + 1,
            item.description,
            item.qty,
            item.unit.as_deref().unwrap_or(""),
            amount(item.value)
        ));
    }
    output.push('\n');

    output.push_str("Totals:\n");
    output.push_str(&format!("  Subtotal: {}\n", amount(header.subtotal)));
    output.push_str(&format!("  Tax:      {}\n", amount(header.tax)));
    output.push_str(&format!("  Total:    {}\n", amount(header.total)));

    output
}

fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
