//! Positioned word tokens read from lopdf content streams.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::extractor::load_document;
use super::{PageTokens, Result, Token, TokenSource};
use crate::error::PdfError;

/// A4 height in points, used when a page has no readable MediaBox.
const DEFAULT_PAGE_HEIGHT: f64 = 842.0;

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.5;

/// TJ adjustments (thousandths of an em) at or below this are word gaps.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// Token source walking page content streams with lopdf.
#[derive(Debug, Clone)]
pub struct LopdfTokenSource {
    line_tolerance: f64,
}

impl LopdfTokenSource {
    pub fn new() -> Self {
        Self { line_tolerance: 3.0 }
    }

    /// Baselines closer than `tolerance` points share a line.
    pub fn with_line_tolerance(mut self, tolerance: f64) -> Self {
        self.line_tolerance = tolerance;
        self
    }
}

impl Default for LopdfTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for LopdfTokenSource {
    fn tokens(&self, data: &[u8]) -> Result<Vec<PageTokens>> {
        let doc = load_document(data)?;
        let mut pages = Vec::new();

        for (page_num, page_id) in doc.get_pages() {
            let height = page_height(&doc, page_id).unwrap_or(DEFAULT_PAGE_HEIGHT);
            let words = page_words(&doc, page_id)?;
            let lines = cluster_lines(words, self.line_tolerance);
            let tokens = lines_to_tokens(lines, height);

            debug!("Page {}: {} tokens", page_num, tokens.len());
            pages.push(PageTokens {
                page: page_num,
                tokens,
            });
        }

        Ok(pages)
    }
}

/// A word in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
struct PlacedWord {
    text: String,
    x0: f64,
    x1: f64,
    baseline: f64,
    size: f64,
}

/// Text state while walking a content stream.
struct TextState {
    text_matrix: [f64; 6],
    line_matrix: [f64; 6],
    font_size: f64,
    leading: f64,
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

impl TextState {
    fn new() -> Self {
        Self {
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 12.0,
            leading: 0.0,
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        let m = self.line_matrix;
        self.line_matrix[4] += tx * m[0] + ty * m[2];
        self.line_matrix[5] += tx * m[1] + ty * m[3];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn effective_size(&self) -> f64 {
        match self.text_matrix[3].abs() {
            s if s > 0.0 => self.font_size * s,
            _ => self.font_size,
        }
    }

    fn glyph_width(&self) -> f64 {
        let scale = match self.text_matrix[0].abs() {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        self.font_size * GLYPH_WIDTH_RATIO * scale
    }

    /// Emit words for `text` at the current position and advance past it.
    fn show(&mut self, text: &str, words: &mut Vec<PlacedWord>) {
        let glyph = self.glyph_width();
        let x = self.text_matrix[4];
        let baseline = self.text_matrix[5];
        let size = self.effective_size();

        let mut current = String::new();
        let mut start = 0usize;
        let mut count = 0usize;

        for ch in text.chars() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    words.push(PlacedWord {
                        text: std::mem::take(&mut current),
                        x0: x + start as f64 * glyph,
                        x1: x + count as f64 * glyph,
                        baseline,
                        size,
                    });
                }
                start = count + 1;
            } else {
                if current.is_empty() {
                    start = count;
                }
                current.push(ch);
            }
            count += 1;
        }

        if !current.is_empty() {
            words.push(PlacedWord {
                text: current,
                x0: x + start as f64 * glyph,
                x1: x + count as f64 * glyph,
                baseline,
                size,
            });
        }

        self.text_matrix[4] += count as f64 * glyph;
    }

    /// Apply a TJ position adjustment in thousandths of an em.
    fn adjust(&mut self, amount: f64) {
        self.text_matrix[4] -= amount / 1000.0 * self.font_size * self.text_matrix[0].abs().max(1e-6);
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Decode a string operand: UTF-16BE with BOM, else Latin-1.
fn decode_string(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

fn page_words(doc: &Document, page_id: ObjectId) -> Result<Vec<PlacedWord>> {
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut state = TextState::new();
    let mut words = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if operands.len() >= 6 {
                    for (i, operand) in operands.iter().take(6).enumerate() {
                        state.text_matrix[i] = number(operand).unwrap_or(IDENTITY[i]);
                    }
                    state.line_matrix = state.text_matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(decode_string) {
                    state.show(&text, &mut words);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(decode_string) {
                    state.show(&text, &mut words);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(decode_string) {
                    state.show(&text, &mut words);
                }
            }
            "TJ" => {
                let Some(Ok(array)) = operands.first().map(Object::as_array) else {
                    continue;
                };
                for item in array {
                    if let Some(text) = decode_string(item) {
                        state.show(&text, &mut words);
                    } else if let Some(amount) = number(item) {
                        if amount <= TJ_SPACE_THRESHOLD {
                            state.show(" ", &mut words);
                        }
                        state.adjust(amount);
                    }
                }
            }
            _ => {}
        }
    }

    trace!("Found {} words on page", words.len());
    Ok(words)
}

fn page_height(doc: &Document, page_id: ObjectId) -> Option<f64> {
    let mut node = page_id;
    // MediaBox is inheritable from the page tree
    for _ in 0..32 {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let (_, media_box) = doc.dereference(media_box).ok()?;
            let values: Vec<f64> = media_box.as_array().ok()?.iter().filter_map(number).collect();
            if let [_, y0, _, y1] = values[..] {
                return Some((y1 - y0).abs());
            }
            return None;
        }
        node = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Group words into lines by baseline, top of page first.
fn cluster_lines(mut words: Vec<PlacedWord>, tolerance: f64) -> Vec<Vec<PlacedWord>> {
    words.sort_by(|a, b| {
        b.baseline
            .total_cmp(&a.baseline)
            .then(a.x0.total_cmp(&b.x0))
    });

    let mut lines: Vec<Vec<PlacedWord>> = Vec::new();
    let mut line_y = f64::NAN;

    for word in words {
        match lines.last_mut() {
            Some(line) if (line_y - word.baseline).abs() < tolerance => line.push(word),
            _ => {
                line_y = word.baseline;
                lines.push(vec![word]);
            }
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    lines
}

/// Convert clustered lines to top-down tokens with block and line ids.
/// A vertical gap over three times the font size starts a new block.
fn lines_to_tokens(lines: Vec<Vec<PlacedWord>>, page_height: f64) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut block_id = 0u32;
    let mut previous: Option<(f64, f64)> = None;

    for (line_id, line) in lines.into_iter().enumerate() {
        let baseline = line.first().map_or(0.0, |w| w.baseline);
        let size = line.iter().map(|w| w.size).fold(0.0, f64::max);

        if let Some((prev_baseline, prev_size)) = previous {
            if prev_baseline - baseline > 3.0 * prev_size.max(size) {
                block_id += 1;
            }
        }
        previous = Some((baseline, size));

        for word in line {
            tokens.push(Token {
                x0: word.x0,
                y0: page_height - word.baseline - word.size,
                x1: word.x1,
                y1: page_height - word.baseline,
                text: word.text,
                block_id,
                line_id: line_id as u32,
            });
        }
    }

    tokens
}
