//! Table recovery from synthetic token pages.

use pretty_assertions::assert_eq;
use profex_core::invoice::table::{Column, RowCells, column_ranges, derive_columns, group_rows};
use profex_core::{PageTokens, TableExtractor, Token};
use rust_decimal::Decimal;
use std::str::FromStr;

const COLUMNS: [(&str, f64); 7] = [
    ("Sr", 36.0),
    ("Code", 64.0),
    ("Description", 130.0),
    ("Type", 300.0),
    ("Qty", 352.0),
    ("Rate", 404.0),
    ("Value", 488.0),
];

struct PageBuilder {
    tokens: Vec<Token>,
    line: u32,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            line: 0,
        }
    }

    fn row(mut self, cells: &[(&str, f64)]) -> Self {
        let y0 = 120.0 + self.line as f64 * 14.0;
        for (text, x0) in cells {
            self.tokens.push(Token {
                x0: *x0,
                y0,
                x1: x0 + text.len() as f64 * 5.0,
                y1: y0 + 10.0,
                text: text.to_string(),
                block_id: 1,
                line_id: self.line,
            });
        }
        self.line += 1;
        self
    }

    fn header(self) -> Self {
        self.row(&COLUMNS)
    }

    fn build(self) -> Vec<Token> {
        self.tokens
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_round_trip_n_rows() {
    let descriptions = ["Gate", "Pump", "Seal", "Hose", "Belt", "Gear", "Nozzle", "Filter"];
    let mut page = PageBuilder::new()
        .row(&[("PROFORMA", 36.0), ("INVOICE", 90.0)])
        .header();
    for (idx, description) in descriptions.iter().enumerate() {
        let qty = (idx + 2).to_string();
        let value = format!("{}.50", (idx + 2) * 100);
        page = page.row(&[
            (*description, 132.0),
            (qty.as_str(), 356.0),
            ("50.25", 404.0),
            (value.as_str(), 488.0),
        ]);
    }

    let items = TableExtractor::new().extract_page(&page.build());

    assert_eq!(items.len(), descriptions.len());
    for (idx, item) in items.iter().enumerate() {
        assert_eq!(item.description, descriptions[idx]);
        assert_eq!(item.qty, idx as u32 + 2);
        assert_eq!(item.rate, Some(d("50.25")));
        assert_eq!(item.value, Some(d(&format!("{}.50", (idx + 2) * 100))));
        assert_eq!(item.code, None);
    }
}

#[test]
fn test_cell_interpretation() {
    let tokens = PageBuilder::new()
        .header()
        .row(&[
            ("1", 38.0),
            ("#550213-A", 64.0),
            ("Industrial", 130.0),
            ("Valve", 185.0),
            ("nos.", 302.0),
            ("1,200", 352.0),
            ("TZS125,000.00", 400.0),
            ("150,000,000.00", 480.0),
        ])
        .row(&[("2", 38.0), ("Freight", 130.0), ("Lumpsum", 300.0), ("0", 352.0), ("90000", 488.0)])
        .build();

    let items = TableExtractor::new().extract_page(&tokens);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].code.as_deref(), Some("550213"));
    assert_eq!(items[0].description, "Industrial Valve");
    assert_eq!(items[0].unit.as_deref(), Some("NOS"));
    assert_eq!(items[0].qty, 1200);
    assert_eq!(items[0].rate, Some(d("125000.00")));
    assert_eq!(items[0].value, Some(d("150000000.00")));

    assert_eq!(items[1].unit.as_deref(), Some("LUMPSUM"));
    assert_eq!(items[1].qty, 1);
    assert_eq!(items[1].rate, None);
}

#[test]
fn test_pages_are_independent() {
    let first = PageBuilder::new()
        .header()
        .row(&[("1", 38.0), ("Bolt", 130.0), ("10", 352.0), ("500", 488.0)])
        .build();
    // second page has no header row, so nothing is taken from it
    let second = PageBuilder::new()
        .row(&[("2", 38.0), ("Nut", 130.0), ("10", 352.0), ("200", 488.0)])
        .build();
    let third = PageBuilder::new()
        .header()
        .row(&[("3", 38.0), ("Washer", 130.0), ("10", 352.0), ("100", 488.0)])
        .build();

    let items = TableExtractor::new().extract_pages(&[
        PageTokens { page: 1, tokens: first },
        PageTokens { page: 2, tokens: second },
        PageTokens { page: 3, tokens: third },
    ]);

    let descriptions: Vec<_> = items.iter().map(|i| i.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Bolt", "Washer"]);
}

#[test]
fn test_column_assignment_is_order_independent() {
    let tokens = PageBuilder::new()
        .header()
        .row(&[("1", 38.0), ("Bolt", 130.0), ("M12", 160.0), ("10", 352.0), ("500", 488.0)])
        .build();
    let mut reversed = tokens.clone();
    reversed.reverse();

    let extractor = TableExtractor::new();
    assert_eq!(extractor.extract_page(&tokens), extractor.extract_page(&reversed));
}

#[test]
fn test_ranges_cover_body_and_drop_nothing_in_band() {
    let tokens = PageBuilder::new()
        .header()
        .row(&[("1", 38.0), ("Bolt", 130.0), ("10", 352.0), ("500", 488.0)])
        .build();
    let rows = group_rows(&tokens);
    let specs = derive_columns(&rows[0]);
    assert_eq!(specs.len(), 7);

    let ranges = column_ranges(&specs, 2000.0);
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].x_max, pair[1].x_min);
        assert!(pair[0].x_min < pair[0].x_max);
    }

    let cells = RowCells::assign(&rows[1], &ranges);
    assert_eq!(cells.get(Column::Sr), "1");
    assert_eq!(cells.get(Column::Description), "Bolt");
    assert_eq!(cells.get(Column::Qty), "10");
    assert_eq!(cells.get(Column::Value), "500");
    assert_eq!(cells.get(Column::Code), "");
}
