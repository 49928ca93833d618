//! Item table recovery from positioned word tokens.
//!
//! Tokens are grouped into rows, the header row is located by keyword
//! scoring, column ranges are derived from header word positions and body
//! tokens are assigned to columns by their left edge.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::rules::patterns::header_keywords::{self, ROW_CATEGORIES};
use super::rules::patterns::{DIGIT_RUN_CODE, DIGIT_RUN_QTY, TABLE_BODY_END};
use super::rules::{normalize_table_unit, parse_cell_amount};
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{LineItem, clean_description};
use crate::pdf::{PageTokens, Token};

/// Canonical item table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Sr,
    Code,
    Description,
    Type,
    Qty,
    Rate,
    Value,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Sr,
        Column::Code,
        Column::Description,
        Column::Type,
        Column::Qty,
        Column::Rate,
        Column::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Sr => "sr",
            Column::Code => "code",
            Column::Description => "description",
            Column::Type => "type",
            Column::Qty => "qty",
            Column::Rate => "rate",
            Column::Value => "value",
        }
    }

    fn single_word_patterns(&self) -> &'static [Regex] {
        match self {
            Column::Sr => &SR_WORDS,
            Column::Code => &CODE_WORDS,
            Column::Description => &DESCRIPTION_WORDS,
            Column::Type => &TYPE_WORDS,
            Column::Qty => &QTY_WORDS,
            Column::Rate => &RATE_WORDS,
            Column::Value => &VALUE_WORDS,
        }
    }
}

lazy_static! {
    static ref SR_WORDS: Vec<Regex> = words(&[r"^sr\.?$", r"^s\.?\s*no\.?$", r"^no\.?$"]);
    static ref CODE_WORDS: Vec<Regex> = words(&[r"^code$"]);
    static ref DESCRIPTION_WORDS: Vec<Regex> = words(&[r"^description$", r"^desc\.?$"]);
    static ref TYPE_WORDS: Vec<Regex> = words(&[r"^type$", r"^unit$"]);
    static ref QTY_WORDS: Vec<Regex> = words(&[r"^qty\.?$", r"^quantity$"]);
    static ref RATE_WORDS: Vec<Regex> = words(&[r"^rate$", r"^price$"]);
    static ref VALUE_WORDS: Vec<Regex> = words(&[r"^value$", r"^amount$", r"^total$"]);

    // Two-word headers, matched before single words
    static ref PAIR_HEADERS: Vec<(Regex, Column)> = vec![
        (Regex::new(r"(?i)^item\s+code$").unwrap(), Column::Code),
        (Regex::new(r"(?i)^unit\s+price$").unwrap(), Column::Rate),
        (Regex::new(r"(?i)^(?:sr|s\.?)\s+no\.?$").unwrap(), Column::Sr),
    ];
}

fn words(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect()
}

/// A header-derived column anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub column: Column,
    pub anchor_x: f64,
}

/// Horizontal extent `[x_min, x_max)` owned by one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRange {
    pub column: Column,
    pub x_min: f64,
    pub x_max: f64,
}

impl ColumnRange {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.x_min && x < self.x_max
    }
}

/// Tokens sharing a `(block_id, line_id)` key, ordered by `x0`.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub key: (u32, u32),
    pub top: f64,
    pub tokens: Vec<&'a Token>,
}

impl Row<'_> {
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group tokens into rows sorted top to bottom.
pub fn group_rows(tokens: &[Token]) -> Vec<Row<'_>> {
    let mut grouped: BTreeMap<(u32, u32), Vec<&Token>> = BTreeMap::new();
    for token in tokens {
        grouped
            .entry((token.block_id, token.line_id))
            .or_default()
            .push(token);
    }

    let mut rows: Vec<Row<'_>> = grouped
        .into_iter()
        .map(|(key, mut tokens)| {
            tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            let top = tokens.iter().map(|t| t.y0).fold(f64::INFINITY, f64::min);
            Row { key, top, tokens }
        })
        .collect();

    rows.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.key.cmp(&b.key)));
    rows
}

fn normalize_header_word(text: &str) -> String {
    text.trim().trim_matches(':').to_lowercase()
}

/// Locate column anchors in the header row. Each column keeps the first
/// header word that names it; a word anchors at most one column.
pub fn derive_columns(header: &Row<'_>) -> Vec<ColumnSpec> {
    let tokens = &header.tokens;
    let mut consumed = vec![false; tokens.len()];
    let mut specs: Vec<ColumnSpec> = Vec::new();
    let has = |specs: &[ColumnSpec], column| specs.iter().any(|s| s.column == column);

    for i in 0..tokens.len().saturating_sub(1) {
        if consumed[i] || consumed[i + 1] {
            continue;
        }
        let pair = format!(
            "{} {}",
            normalize_header_word(&tokens[i].text),
            normalize_header_word(&tokens[i + 1].text)
        );
        if let Some((_, column)) = PAIR_HEADERS.iter().find(|(re, _)| re.is_match(&pair)) {
            if !has(&specs, *column) {
                specs.push(ColumnSpec {
                    column: *column,
                    anchor_x: tokens[i].x0,
                });
                consumed[i] = true;
                consumed[i + 1] = true;
            }
        }
    }

    for column in Column::ALL {
        if has(&specs, column) {
            continue;
        }
        let found = tokens.iter().enumerate().find(|(idx, token)| {
            !consumed[*idx]
                && column
                    .single_word_patterns()
                    .iter()
                    .any(|re| re.is_match(&normalize_header_word(&token.text)))
        });
        if let Some((idx, token)) = found {
            consumed[idx] = true;
            specs.push(ColumnSpec {
                column,
                anchor_x: token.x0,
            });
        }
    }

    specs.sort_by(|a, b| a.anchor_x.total_cmp(&b.anchor_x));
    specs
}

/// Midpoint boundaries between adjacent anchors. The outer ranges extend
/// `sentinel` units past the first and last anchors.
pub fn column_ranges(specs: &[ColumnSpec], sentinel: f64) -> Vec<ColumnRange> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let x_min = match i {
                0 => spec.anchor_x - sentinel,
                _ => (specs[i - 1].anchor_x + spec.anchor_x) / 2.0,
            };
            let x_max = match specs.get(i + 1) {
                Some(next) => (spec.anchor_x + next.anchor_x) / 2.0,
                None => spec.anchor_x + sentinel,
            };
            ColumnRange {
                column: spec.column,
                x_min,
                x_max,
            }
        })
        .collect()
}

/// Joined text per column for one body row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    cells: BTreeMap<Column, String>,
}

impl RowCells {
    /// Assign each token to the first range containing its `x0`. Tokens
    /// outside every range are dropped.
    pub fn assign(row: &Row<'_>, ranges: &[ColumnRange]) -> Self {
        let mut cells: BTreeMap<Column, String> = BTreeMap::new();
        for token in &row.tokens {
            if let Some(range) = ranges.iter().find(|r| r.contains(token.x0)) {
                let cell = cells.entry(range.column).or_default();
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(&token.text);
            }
        }
        Self { cells }
    }

    pub fn get(&self, column: Column) -> &str {
        self.cells.get(&column).map_or("", |s| s.trim())
    }

    /// Only the description cell has content.
    fn is_description_only(&self) -> bool {
        !self.get(Column::Description).is_empty()
            && Column::ALL
                .iter()
                .filter(|c| **c != Column::Description)
                .all(|c| self.get(*c).is_empty())
    }
}

/// Positioned-token item table extractor.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    min_header_score: usize,
    column_sentinel: f64,
    max_description_len: usize,
    merge_continuation_rows: bool,
}

impl TableExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_header_score: config.min_header_score,
            column_sentinel: config.column_sentinel,
            max_description_len: config.max_description_len,
            merge_continuation_rows: config.merge_continuation_rows,
        }
    }

    pub fn with_continuation_merge(mut self, merge: bool) -> Self {
        self.merge_continuation_rows = merge;
        self
    }

    /// Items from every page, concatenated in page order.
    pub fn extract_pages(&self, pages: &[PageTokens]) -> Vec<LineItem> {
        pages
            .iter()
            .flat_map(|page| {
                let items = self.extract_page(&page.tokens);
                trace!("Page {}: {} table items", page.page, items.len());
                items
            })
            .collect()
    }

    /// Items from one page's tokens, in row order.
    pub fn extract_page(&self, tokens: &[Token]) -> Vec<LineItem> {
        let rows = group_rows(tokens);

        let Some(header_idx) = rows.iter().position(|row| {
            header_keywords::score(&ROW_CATEGORIES, &row.text()) >= self.min_header_score
        }) else {
            trace!("No table header row on page");
            return Vec::new();
        };

        let specs = derive_columns(&rows[header_idx]);
        let ranges = column_ranges(&specs, self.column_sentinel);
        debug!(
            "Table header with columns: {:?}",
            specs.iter().map(|s| s.column.name()).collect::<Vec<_>>()
        );

        let mut items: Vec<LineItem> = Vec::new();
        for row in &rows[header_idx + 1..] {
            if TABLE_BODY_END.is_match(&row.text()) {
                break;
            }

            let cells = RowCells::assign(row, &ranges);
            let description = cells.get(Column::Description);
            if description.is_empty() {
                continue;
            }

            if self.merge_continuation_rows && cells.is_description_only() {
                if let Some(previous) = items.last_mut() {
                    let merged = format!("{} {}", previous.description, description);
                    previous.description = clean_description(&merged, self.max_description_len);
                    continue;
                }
            }

            items.push(self.build_item(&cells));
        }

        items
    }

    fn build_item(&self, cells: &RowCells) -> LineItem {
        let mut item = LineItem::new(clean_description(
            cells.get(Column::Description),
            self.max_description_len,
        ));

        item.code = DIGIT_RUN_CODE
            .find(cells.get(Column::Code))
            .map(|m| m.as_str().to_string());

        let qty_text = cells.get(Column::Qty).replace(',', "");
        item.qty = DIGIT_RUN_QTY
            .find(&qty_text)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|q| *q > 0)
            .unwrap_or(1);

        item.rate = parse_cell_amount(cells.get(Column::Rate));
        item.value = parse_cell_amount(cells.get(Column::Value));
        item.unit = normalize_table_unit(cells.get(Column::Type));
        item
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new()
    }
}
