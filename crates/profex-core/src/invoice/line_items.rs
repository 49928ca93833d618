//! Line-oriented item parser for documents without token positions.
//!
//! Items start on a line beginning with a 1-2 digit serial number and may
//! continue over following description lines. Parsing is an explicit state
//! machine: [`ItemState`] accumulates one item and [`ItemState::step`]
//! decides, per line, whether the item continues.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::rules::patterns::header_keywords::{self, HEADER_WORDS_ONLY, LINE_CATEGORIES};
use super::rules::patterns::{
    CONTINUATION_STOP, ITEM_CODE_PREFIX, ITEM_SECTION_END, ITEM_START, LEADING_NUMBER_AMOUNT,
    LEADING_QTY_UNIT, NUMERIC_ONLY_LINE, NUMERIC_TAIL, TRAILING_NUMERIC,
};
use super::rules::{NumberDisambiguator, NumericToken, find_unit, scan_numbers};
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{LineItem, clean_description};

/// Outcome of feeding one line to an [`ItemState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The line was appended to the description; keep accumulating.
    Continue,
    /// The line completed the item and was consumed.
    EmitConsumed,
    /// The line does not belong to the item; emit and re-examine the line.
    Emit,
}

/// An item being accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    code: Option<String>,
    description: Vec<String>,
    unit: Option<String>,
    numbers: Vec<Decimal>,
    percentages: Vec<Decimal>,
    consumed: usize,
}

impl ItemState {
    /// Begin an item from its start line, or `None` if the line has no
    /// leading serial number.
    pub fn start(line: &str) -> Option<Self> {
        let serial = ITEM_START.find(line)?;
        let mut rest = line[serial.end()..].trim();

        let mut code = None;
        if let Some(caps) = ITEM_CODE_PREFIX.captures(rest) {
            code = Some(caps[1].to_string());
            rest = rest[caps[0].len()..].trim();
        }

        let unit = find_unit(rest);
        let (description, tail) = match &unit {
            Some(unit) => (&rest[..unit.start], &rest[unit.end..]),
            None => {
                let end = TRAILING_NUMERIC.find(rest).map_or(rest.len(), |m| m.start());
                (&rest[..end], &rest[end..])
            }
        };

        let mut state = Self {
            code,
            description: vec![description.trim().to_string()],
            unit: unit.map(|u| u.unit),
            numbers: Vec::new(),
            percentages: Vec::new(),
            consumed: 1,
        };
        state.absorb_numbers(&scan_numbers(tail));
        Some(state)
    }

    fn absorb_numbers(&mut self, tokens: &[NumericToken]) {
        for token in tokens {
            if token.percent {
                self.percentages.push(token.value);
            } else {
                self.numbers.push(token.value);
            }
        }
    }

    /// Feed the next line.
    pub fn step(&mut self, line: &str) -> Transition {
        // "<qty> <UNIT> <numbers>" only; "2 BOX spanner set ..." is a new item
        let split_line = LEADING_QTY_UNIT
            .captures(line)
            .filter(|caps| NUMERIC_TAIL.is_match(&line[caps[0].len()..]));
        if let Some(caps) = split_line {
            if self.unit.is_none() {
                self.unit = Some(caps[1].to_uppercase());
            }
            if self.numbers.is_empty() {
                self.absorb_numbers(&scan_numbers(line));
                self.consumed += 1;
                return Transition::EmitConsumed;
            }
            return Transition::Emit;
        }

        if ITEM_START.is_match(line)
            || CONTINUATION_STOP.is_match(line)
            || HEADER_WORDS_ONLY.is_match(line)
            || LEADING_NUMBER_AMOUNT.is_match(line)
            || NUMERIC_ONLY_LINE.is_match(line)
        {
            return Transition::Emit;
        }

        self.description.push(line.to_string());
        self.consumed += 1;
        Transition::Continue
    }

    /// Number of lines this item has consumed, including its start line.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Build the item. Descriptions shorter than two characters are discarded.
    pub fn finish(self, disambiguator: &NumberDisambiguator, max_len: usize) -> Option<LineItem> {
        let description = clean_description(&self.description.join(" "), max_len);
        if description.chars().count() < 2 {
            trace!("Discarding item without description");
            return None;
        }

        let roles = disambiguator.assign(&self.numbers);
        Some(LineItem {
            description,
            code: self.code,
            unit: self.unit,
            qty: roles.qty.unwrap_or(1).max(1),
            rate: roles.rate,
            value: roles.value,
            vat_percent: self.percentages.first().copied(),
        })
    }
}

/// Text-fallback item parser.
#[derive(Debug, Clone)]
pub struct LineItemParser {
    min_header_score: usize,
    max_description_len: usize,
    disambiguator: NumberDisambiguator,
}

impl LineItemParser {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_header_score: config.min_header_score,
            max_description_len: config.max_description_len,
            disambiguator: NumberDisambiguator::with_ceiling(config.quantity_ceiling),
        }
    }

    /// Index of the item table header line.
    pub fn find_header(&self, lines: &[String]) -> Option<usize> {
        lines
            .iter()
            .position(|line| header_keywords::score(&LINE_CATEGORIES, line) >= self.min_header_score)
    }

    /// Parse items in encounter order.
    pub fn parse(&self, lines: &[String]) -> Vec<LineItem> {
        let Some(header) = self.find_header(lines) else {
            debug!("No item header line found");
            return Vec::new();
        };
        debug!("Item header at line {}", header);

        let mut items = Vec::new();
        let mut cursor = header + 1;

        while cursor < lines.len() {
            let line = &lines[cursor];

            if ITEM_SECTION_END.is_match(line) {
                trace!("Item section ends at line {}", cursor);
                break;
            }
            if HEADER_WORDS_ONLY.is_match(line) {
                cursor += 1;
                continue;
            }
            let Some(mut state) = ItemState::start(line) else {
                trace!("Skipping noise line: {}", line);
                cursor += 1;
                continue;
            };

            for next in &lines[cursor + 1..] {
                match state.step(next) {
                    Transition::Continue => continue,
                    Transition::EmitConsumed | Transition::Emit => break,
                }
            }

            cursor += state.consumed();
            if let Some(item) = state.finish(&self.disambiguator, self.max_description_len) {
                items.push(item);
            }
        }

        debug!("Text fallback found {} items", items.len());
        items
    }
}

impl Default for LineItemParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const HEADER: &str = "Sr Item Code Description Unit Qty Rate Value";

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_item_with_code_unit_and_numbers() {
        let doc = lines(&[
            HEADER,
            "1  550213  Industrial Valve 2\"  NOS  4  125000.00  500000.00",
            "Net Value 500000.00",
        ]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0],
            LineItem {
                description: "Industrial Valve 2\"".to_string(),
                code: Some("550213".to_string()),
                unit: Some("NOS".to_string()),
                qty: 4,
                rate: Some(d("125000.00")),
                value: Some(d("500000.00")),
                vat_percent: None,
            }
        );
    }

    #[test]
    fn test_single_number_is_value() {
        let doc = lines(&[HEADER, "3  Misc Service  75000"]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Misc Service");
        assert_eq!(items[0].qty, 1);
        assert_eq!(items[0].value, Some(d("75000")));
        assert_eq!(items[0].rate, None);
    }

    #[test]
    fn test_multiline_description() {
        let doc = lines(&[
            HEADER,
            "1  Hydraulic hose assembly  PCS  2  15,000.00  30,000.00",
            "with crimped fittings",
            "2  Filter  PCS  1  8,000.00  8,000.00",
            "Gross Value 38,000.00",
        ]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Hydraulic hose assembly with crimped fittings");
        assert_eq!(items[0].qty, 2);
        assert_eq!(items[0].value, Some(d("30000.00")));
        assert_eq!(items[1].description, "Filter");
    }

    #[test]
    fn test_split_qty_unit_line() {
        let doc = lines(&[
            HEADER,
            "1  Diesel injector pump",
            "4 NOS 125,000.00 500,000.00",
            "2  Gasket set  PCS  1  9000",
        ]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit.as_deref(), Some("NOS"));
        assert_eq!(items[0].qty, 4);
        assert_eq!(items[0].rate, Some(d("125000.00")));
        assert_eq!(items[0].value, Some(d("500000.00")));
        assert_eq!(items[1].description, "Gasket set");
    }

    #[test]
    fn test_percentage_is_not_a_role_number() {
        let doc = lines(&[HEADER, "1  Cement bags  BAG  10  18%  15,000  150,000"]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items[0].vat_percent, Some(d("18")));
        assert_eq!(items[0].qty, 10);
        assert_eq!(items[0].rate, Some(d("15000")));
    }

    #[test]
    fn test_noise_and_short_descriptions_skipped() {
        let doc = lines(&[
            HEADER,
            "Continued from previous order",
            "1  X  5000",
            "2  Wheel bearing  PCS  2  4500  9000",
        ]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Wheel bearing");
    }

    #[test]
    fn test_no_header_no_items() {
        let doc = lines(&["1  Wheel bearing  PCS  2  4500  9000"]);
        assert!(LineItemParser::new().parse(&doc).is_empty());
    }

    #[test]
    fn test_step_transitions() {
        let mut state = ItemState::start("1  Pump impeller").unwrap();
        assert_eq!(state.step("bronze, 6 blade"), Transition::Continue);
        assert_eq!(state.step("Date: 01/02/2024"), Transition::Emit);
        assert_eq!(state.step("12 NOS 3000 36000"), Transition::EmitConsumed);
        assert_eq!(state.consumed(), 3);
        assert_eq!(ItemState::start("Pump impeller"), None);
    }

    #[test]
    fn test_alphanumeric_code() {
        let state = ItemState::start("4  HX200  Heat exchanger  SET  1  90000").unwrap();
        let item = state.finish(&NumberDisambiguator::new(), 255).unwrap();
        assert_eq!(item.code.as_deref(), Some("HX200"));
        assert_eq!(item.unit.as_deref(), Some("SET"));
        assert_eq!(item.description, "Heat exchanger");
    }

    #[test]
    fn test_short_codes_are_codes() {
        let digits = ItemState::start("1  1234  Valve  NOS  2  100  200").unwrap();
        let item = digits.finish(&NumberDisambiguator::new(), 255).unwrap();
        assert_eq!(item.code.as_deref(), Some("1234"));
        assert_eq!(item.description, "Valve");

        let letters = ItemState::start("1  ABC  Valve  NOS  2  100  200").unwrap();
        let item = letters.finish(&NumberDisambiguator::new(), 255).unwrap();
        assert_eq!(item.code.as_deref(), Some("ABC"));
        assert_eq!(item.description, "Valve");
    }

    #[test]
    fn test_unit_item_start_is_a_new_item() {
        let mut state = ItemState::start("1  Diesel injector pump").unwrap();
        assert_eq!(state.step("2 BOX spanner set 5 100 500"), Transition::Emit);
        assert_eq!(state.consumed(), 1);

        let doc = lines(&[
            HEADER,
            "1  Diesel injector pump",
            "2 BOX spanner set 5 100 500",
            "3  Gasket  PCS  1  9000",
        ]);
        let items = LineItemParser::new().parse(&doc);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].description, "Diesel injector pump");
        assert_eq!((items[0].qty, items[0].value), (1, None));
        assert!(items[1].description.contains("spanner"));
        assert_eq!((items[1].qty, items[1].value), (5, Some(d("500"))));
        assert_eq!(items[2].description, "Gasket");
    }

    #[test]
    fn test_numeric_lines_stop_continuation() {
        let mut state = ItemState::start("1  Pump impeller").unwrap();
        assert_eq!(state.step("18%"), Transition::Emit);
        assert_eq!(state.step("250.00"), Transition::Emit);
        assert_eq!(state.step("100 1,037,400.00"), Transition::Emit);
        assert_eq!(state.consumed(), 1);

        let doc = lines(&[
            HEADER,
            "1  Pump impeller  PCS  4  259,350.00  1,037,400.00",
            "18%",
            "100 1,037,400.00",
            "bronze casting",
        ]);
        let items = LineItemParser::new().parse(&doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Pump impeller");
        assert_eq!(items[0].value, Some(d("1037400.00")));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let doc = lines(&[HEADER, "1  Valve  NOS  2  100  200", "2  Seal  PCS  3  10  30"]);
        let parser = LineItemParser::new();
        assert_eq!(parser.parse(&doc), parser.parse(&doc));
        assert!(parser.parse(&doc).iter().all(|item| item.qty >= 1));
    }
}
