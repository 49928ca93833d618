//! Header field extraction from normalized lines.
//!
//! Each field has its own pure `extract_*` function over the extraction
//! lines (the lines from the document anchor onward). [`FieldExtractor`]
//! runs them all and assembles [`HeaderFields`].

use regex::Regex;
use tracing::{debug, trace};

use super::rules::patterns::*;
use super::rules::{DateRule, LineRule};
use crate::models::config::ExtractionConfig;
use crate::models::invoice::HeaderFields;

/// Seller block and extraction lines of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSections<'a> {
    /// Letterhead lines before the anchor.
    pub seller: &'a [String],
    /// Lines from the anchor onward.
    pub body: &'a [String],
}

/// Split `lines` at the first anchor line. Without an anchor the first
/// `fallback_lines` lines are treated as the seller block and extraction
/// covers the whole document.
pub fn split_sections(lines: &[String], fallback_lines: usize) -> DocumentSections<'_> {
    match lines.iter().position(|line| ANCHOR.is_match(line)) {
        Some(idx) => {
            debug!("Anchor found at line {}", idx);
            DocumentSections {
                seller: &lines[..idx],
                body: &lines[idx..],
            }
        }
        None => {
            debug!("No anchor line, using first {} lines as seller block", fallback_lines);
            DocumentSections {
                seller: &lines[..fallback_lines.min(lines.len())],
                body: lines,
            }
        }
    }
}

/// Extracts header attributes from a document's lines.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    lookahead_lines: usize,
    seller_fallback_lines: usize,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            lookahead_lines: config.lookahead_lines,
            seller_fallback_lines: config.seller_fallback_lines,
        }
    }

    pub fn with_lookahead(mut self, lines: usize) -> Self {
        self.lookahead_lines = lines;
        self
    }

    /// Extract all header fields from the document's normalized lines.
    pub fn extract(&self, lines: &[String]) -> HeaderFields {
        let sections = split_sections(lines, self.seller_fallback_lines);
        let body = sections.body;
        let seller = extract_seller(sections.seller);
        let lookahead = self.lookahead_lines;

        let fields = HeaderFields {
            invoice_no: extract_invoice_no(body),
            code_no: extract_code_no(body),
            date: extract_date(body),
            customer_name: extract_customer_name(body),
            address: extract_address(body),
            phone: extract_phone(body),
            email: extract_email(body),
            reference: extract_reference(body),
            payment_method: extract_labeled(body, &PAYMENT_LABELS, lookahead),
            delivery_terms: extract_labeled(body, &DELIVERY_LABELS, lookahead),
            remarks: extract_labeled(body, &REMARKS_LABELS, lookahead),
            attended_by: extract_labeled(body, &ATTENDED_BY_LABELS, lookahead),
            kind_attention: extract_labeled(body, &KIND_ATTENTION_LABELS, lookahead),
            seller_name: seller.name,
            seller_address: seller.address,
            seller_phone: seller.phone,
            seller_email: seller.email,
            seller_tax_id: seller.tax_id,
            seller_vat_reg: seller.vat_reg,
        };

        trace!("Header fields: {:?}", fields);
        fields
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Seller letterhead details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SellerInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub vat_reg: Option<String>,
}

/// Seller name is the first line, address the rest joined with spaces.
pub fn extract_seller(block: &[String]) -> SellerInfo {
    let Some((first, rest)) = block.split_first() else {
        return SellerInfo::default();
    };

    let text = block.join("\n");
    let capture = |re: &Regex| {
        re.captures(&text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|v| !v.is_empty())
    };

    SellerInfo {
        name: Some(first.clone()),
        address: (!rest.is_empty()).then(|| rest.join(" ")),
        phone: capture(&SELLER_PHONE),
        email: EMAIL.find(&text).map(|m| m.as_str().to_string()),
        tax_id: capture(&SELLER_TIN),
        vat_reg: capture(&SELLER_VRN),
    }
}

/// Generic label/value lookup.
///
/// For each pattern in priority order, scan the lines: a non-empty
/// remainder after the label on the same line is the value. A bare label
/// takes the first of the next `lookahead` lines that is not itself a label.
/// Trailing `Date: dd/mm/yyyy` fragments are stripped.
pub fn extract_labeled(lines: &[String], patterns: &[Regex], lookahead: usize) -> Option<String> {
    for pattern in patterns {
        for (idx, line) in lines.iter().enumerate() {
            let Some(m) = pattern.find(line) else {
                continue;
            };

            let remainder = line[m.end()..].trim_start_matches(|c: char| {
                c.is_whitespace() || c == ':' || c == '='
            });
            if !remainder.trim().is_empty() {
                let value = strip_trailing_date(remainder);
                if !value.is_empty() {
                    return Some(value);
                }
                continue;
            }

            let next = lines
                .iter()
                .skip(idx + 1)
                .take(lookahead)
                .find(|l| !LABEL_STOPLIST.is_match(l))
                .map(|l| strip_trailing_date(l))
                .filter(|v| !v.is_empty());
            if next.is_some() {
                return next;
            }
        }
    }
    None
}

fn strip_trailing_date(value: &str) -> String {
    TRAILING_DATE_FRAGMENT.replace(value, "").trim().to_string()
}

fn is_bare_date(value: &str) -> bool {
    BARE_DATE.is_match(value)
}

/// `Code No: 0042`. A label followed by a bare date is skipped.
pub fn extract_code_no(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let value = CODE_NO.captures(line)?.get(1)?;
        if is_bare_date(&line[value.start()..]) {
            return None;
        }
        Some(value.as_str().to_string())
    })
}

/// `PI No: PI-2024-001` / `Invoice Number: 123`.
pub fn extract_invoice_no(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        INVOICE_NO
            .captures(line)
            .map(|caps| caps[1].to_string())
            .filter(|v| v.len() > 1)
    })
}

/// Same-line value after `Customer Name`, else the next line.
pub fn extract_customer_name(lines: &[String]) -> Option<String> {
    for (idx, line) in lines.iter().enumerate() {
        let Some(m) = CUSTOMER_NAME.find(line) else {
            continue;
        };

        let same_line = TRAILING_DATE_LABEL.replace(&line[m.end()..], "");
        let same_line = same_line.trim();
        if !same_line.is_empty() {
            if !starts_with_date(same_line) {
                return Some(same_line.to_string());
            }
            continue;
        }

        match lines.get(idx + 1) {
            Some(next) if !CUSTOMER_NEXT_LINE_STOP.is_match(next) => return Some(next.clone()),
            _ => {}
        }
    }
    None
}

fn starts_with_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    (1..=2).contains(&digits) && matches!(bytes.get(digits), Some(b'/') | Some(b'-'))
}

/// Labeled issue date that parses as a real calendar date.
pub fn extract_date(lines: &[String]) -> Option<String> {
    DateRule::new().value(lines)
}

/// Address from a `P.O. Box` or `Address` label plus up to three
/// following lines.
pub fn extract_address(lines: &[String]) -> Option<String> {
    for (idx, line) in lines.iter().enumerate() {
        let Some(m) = ADDRESS_LABEL.find(line) else {
            continue;
        };

        let first = line[m.end()..].trim_start_matches(|c: char| c.is_whitespace() || c == ':');
        let first = ADDRESS_TRAILING_LABEL.replace(first, "");
        let mut parts = Vec::new();
        if !first.trim().is_empty() {
            parts.push(first.trim().to_string());
        }

        for next in lines.iter().skip(idx + 1).take(3) {
            if ADDRESS_STOP.is_match(next) || ADDRESS_EMBEDDED_LABEL.is_match(next) {
                break;
            }
            if is_bare_date(next) || next.chars().count() <= 3 {
                continue;
            }
            let cleaned = ADDRESS_TRAILING_LABEL.replace(next, "");
            if !cleaned.trim().is_empty() {
                parts.push(cleaned.trim().to_string());
            }
        }

        let address = ADDRESS_CLEANUP.replace_all(&parts.join(" "), "").trim().to_string();
        if !address.is_empty() {
            return Some(address);
        }
    }
    None
}

/// First labeled phone number with at least seven digits.
pub fn extract_phone(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let caps = PHONE.captures(line)?;
        let candidate = caps[1].trim();
        if candidate.chars().filter(char::is_ascii_digit).count() < 7 {
            return None;
        }
        let cleaned = PHONE_TAIL.replace(candidate, "").trim().to_string();
        (!cleaned.is_empty()).then_some(cleaned)
    })
}

/// First email address on any line.
pub fn extract_email(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| EMAIL.find(line).map(|m| m.as_str().to_string()))
}

/// `FOR T <digits> <letters>` anywhere, else a `Reference`/`Ref` label.
/// `Cust Ref` belongs to the address block and is skipped.
pub fn extract_reference(lines: &[String]) -> Option<String> {
    if let Some(found) = lines
        .iter()
        .find_map(|line| REFERENCE_FOR_T.captures(line).map(|caps| caps[1].to_string()))
    {
        return Some(found);
    }

    lines.iter().find_map(|line| {
        REFERENCE.captures_iter(line).find_map(|caps| {
            let whole = caps.get(0)?;
            if line[..whole.start()].trim_end().to_lowercase().ends_with("cust") {
                return None;
            }
            let value = caps[1].trim();
            if value.is_empty() || starts_with_date(value) || REFERENCE_CUST_REF.is_match(value) {
                return None;
            }
            let value = REFERENCE_CLEANUP.replace(value, "").trim().to_string();
            (!value.is_empty()).then_some(value)
        })
    })
}
