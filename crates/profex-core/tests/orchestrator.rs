//! End-to-end extraction through `Extractor`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pretty_assertions::assert_eq;
use profex_core::pdf::{LopdfBackend, LopdfTokenSource};
use profex_core::{
    ErrorCode, Extractor, ItemSource, ProfexConfig, TextBackend, TokenSource,
};
use rust_decimal::Decimal;
use std::str::FromStr;

const HEADER_ROW: [(i64, &str); 7] = [
    (36, "Sr"),
    (64, "Code"),
    (130, "Description"),
    (300, "Type"),
    (352, "Qty"),
    (404, "Rate"),
    (488, "Value"),
];

fn text_line(ops: &mut Vec<Operation>, y: i64, text: &str) {
    row(ops, y, &[(40, text)]);
}

fn row(ops: &mut Vec<Operation>, y: i64, cells: &[(i64, &str)]) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
    let mut last_x = 0;
    for (idx, (x, text)) in cells.iter().enumerate() {
        let ty = if idx == 0 { y } else { 0 };
        ops.push(Operation::new("Td", vec![(x - last_x).into(), ty.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        last_x = *x;
    }
    ops.push(Operation::new("ET", vec![]));
}

fn proforma_pdf() -> Vec<u8> {
    let mut ops = Vec::new();
    text_line(&mut ops, 800, "KILIMANJARO MACHINERY CO. LTD");
    text_line(&mut ops, 786, "Tel: +255 22 211 4455");
    text_line(&mut ops, 750, "PROFORMA INVOICE");
    text_line(&mut ops, 736, "PI No: PI-24-0387");
    text_line(&mut ops, 722, "Customer Name: ACME TRADERS LTD");
    row(&mut ops, 690, &HEADER_ROW);
    row(
        &mut ops,
        676,
        &[
            (36, "1"),
            (64, "550213"),
            (130, "Industrial Valve"),
            (300, "NOS"),
            (352, "4"),
            (404, "125,000.00"),
            (488, "500,000.00"),
        ],
    );
    row(
        &mut ops,
        662,
        &[
            (36, "2"),
            (64, "550214"),
            (130, "Gate valve"),
            (300, "PCS"),
            (352, "3"),
            (404, "250,000.00"),
            (488, "750,000.00"),
        ],
    );
    row(&mut ops, 648, &[(130, "cast iron body")]);
    text_line(&mut ops, 620, "Gross Value TZS 1,250,000.00");

    build_pdf(ops)
}

fn build_pdf(operations: Vec<Operation>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_empty_buffer() {
    let record = Extractor::default().extract_from_bytes(&[], "upload.pdf");
    assert!(!record.success);
    assert_eq!(record.error, Some(ErrorCode::EmptyFile));
    assert_eq!(record.message, "File is empty. Please upload a valid PDF file.");
}

#[test]
fn test_png_upload() {
    let record = Extractor::default().extract_from_bytes(b"\x89PNG\r\n\x1a\n....", "scan.png");
    assert!(!record.success);
    assert_eq!(record.error, Some(ErrorCode::ImageFileNotSupported));
    assert!(!record.ocr_available);
    assert!(record.items.is_empty());

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["error"], "image_file_not_supported");
    assert_eq!(json["ocr_available"], false);
}

#[test]
fn test_unknown_bytes_unsupported() {
    let record = Extractor::default().extract_from_bytes(b"name,qty\nbolt,4\n", "items.csv");
    assert_eq!(record.error, Some(ErrorCode::UnsupportedFileType));
    assert_eq!(record.message, "Please upload a PDF file.");
}

#[test]
fn test_corrupt_pdf_reports_every_backend() {
    let record = Extractor::default()
        .with_token_source(None)
        .extract_from_bytes(b"%PDF-1.7\ngarbage", "broken.pdf");

    assert_eq!(record.error, Some(ErrorCode::PdfExtractionFailed));
    assert!(record.message.starts_with("Could not extract text from PDF: PDF extraction failed - "));
    assert!(record.message.contains("pdf-extract: "));
    assert!(record.message.contains("lopdf: "));
    assert_eq!(record.raw_text, "");
}

#[test]
fn test_token_source_reads_generated_pdf() {
    let pages = LopdfTokenSource::new().tokens(&proforma_pdf()).unwrap();

    assert_eq!(pages.len(), 1);
    let tokens = &pages[0].tokens;
    let anchor = tokens.iter().find(|t| t.text == "Description").unwrap();
    let header: Vec<_> = tokens
        .iter()
        .filter(|t| (t.block_id, t.line_id) == (anchor.block_id, anchor.line_id))
        .map(|t| (t.text.as_str(), t.x0))
        .collect();
    assert_eq!(
        header,
        vec![
            ("Sr", 36.0),
            ("Code", 64.0),
            ("Description", 130.0),
            ("Type", 300.0),
            ("Qty", 352.0),
            ("Rate", 404.0),
            ("Value", 488.0),
        ]
    );
    assert!(tokens.windows(2).all(|w| w[0].y0 <= w[1].y0));
}

#[test]
fn test_generated_pdf_prefers_table_items() {
    let extractor = Extractor::default()
        .with_backends(vec![Box::new(LopdfBackend) as Box<dyn TextBackend>]);
    let extraction = extractor.extract(&proforma_pdf(), "proforma.pdf").unwrap();
    let invoice = &extraction.invoice;

    assert_eq!(extraction.backend, "lopdf");
    assert_eq!(invoice.header.customer_name.as_deref(), Some("ACME TRADERS LTD"));
    assert_eq!(invoice.header.invoice_no.as_deref(), Some("PI-24-0387"));
    assert_eq!(invoice.totals.total, Some(d("1250000.00")));

    assert_eq!(invoice.item_source, ItemSource::Table);
    assert_eq!(invoice.items.len(), 3);
    assert_eq!(invoice.items[0].code.as_deref(), Some("550213"));
    assert_eq!(invoice.items[0].description, "Industrial Valve");
    assert_eq!(invoice.items[0].qty, 4);
    assert_eq!(invoice.items[0].value, Some(d("500000.00")));
    assert_eq!(invoice.items[1].description, "Gate valve");
    assert_eq!(invoice.items[1].unit.as_deref(), Some("PCS"));
    assert_eq!(invoice.items[2].description, "cast iron body");
    assert_eq!(invoice.items[2].qty, 1);
}

#[test]
fn test_generated_pdf_default_config() {
    let record = Extractor::new(&ProfexConfig::default())
        .extract_from_bytes(&proforma_pdf(), "proforma.pdf");

    assert!(record.success);
    assert_eq!(record.error, None);
    assert_eq!(record.items.len(), 3);
    assert!(!record.raw_text.is_empty());
}

#[test]
fn test_positioned_tokens_can_be_disabled() {
    let mut config = ProfexConfig::default();
    config.pdf.use_positioned_tokens = false;
    config.pdf.backends = vec![profex_core::models::config::BackendKind::Lopdf];

    let extraction = Extractor::new(&config)
        .extract(&proforma_pdf(), "proforma.pdf")
        .unwrap();
    assert_ne!(extraction.invoice.item_source, ItemSource::Table);
}
