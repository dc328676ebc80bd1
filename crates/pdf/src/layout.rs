//! Content-stream walking: PDF text operators to positioned [`Fragment`]s.
//!
//! ```text
//! content ops  ->  TextRun[]  ->  Fragment[]
//!   (per page)     state machine   top-down y, NFKC text
//! ```
//!
//! Positions are mapped through the text matrix and the CTM (`q`/`Q`/`cm`),
//! so generators that translate or flip user space still land on the page.
//! Glyph metrics are not consulted; widths are estimated from the character
//! count, which is enough for gap comparisons on the same line.

use outline_core::{Fragment, PageSize};
use unicode_normalization::UnicodeNormalization;

use crate::backend::{decode_text_simple, ContentOp, FontInfo, PageId, PdfBackend, PdfValue};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Approximate advance of one glyph as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Fraction of a glyph advance a `TJ` kerning shift must exceed to count as
/// a word space.
const TJ_SPACE_RATIO: f32 = 0.3;

/// The identity 2x3 matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 x m2` in PDF's row-vector convention: apply `m1`, then `m2`.
fn multiply(m1: [f32; 6], m2: [f32; 6]) -> [f32; 6] {
    let [a1, b1, c1, d1, e1, f1] = m1;
    let [a2, b2, c2, d2, e2, f2] = m2;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// A run of text in PDF user space: origin bottom-left, `y` at the baseline.
#[derive(Debug, Clone, PartialEq)]
struct TextRun {
    text: String,
    x: f32,
    baseline: f32,
    width: f32,
    font_size: f32,
    bold: bool,
}

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current transformation matrix, text space scaled into user space.
    ctm: [f32; 6],
    font: FontInfo,
    bold: bool,
    /// Font size in text-space units, before the text matrix scale.
    font_size: f32,
    text_matrix: [f32; 6],
    /// Set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Tz, as a factor (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY_MATRIX,
            font: FontInfo::default(),
            bold: false,
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Text space to user space: `Tm x CTM`.
    fn rendering_matrix(&self) -> [f32; 6] {
        multiply(self.text_matrix, self.ctm)
    }

    /// User-space position of the current glyph origin, rise included.
    fn origin(&self) -> (f32, f32) {
        let [_, _, c, d, e, f] = self.rendering_matrix();
        (c * self.text_rise + e, d * self.text_rise + f)
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the rendering matrix.
    fn effective_font_size(&self) -> f32 {
        let m = self.rendering_matrix();
        let scale = (m[1].powi(2) + m[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Horizontal scale of the rendering matrix, applied to widths.
    fn matrix_scale_x(&self) -> f32 {
        let m = self.rendering_matrix();
        (m[0].powi(2) + m[1].powi(2)).sqrt()
    }

    /// `cm`: prepend a transformation to the CTM.
    fn concat(&mut self, m: [f32; 6]) {
        self.ctm = multiply(m, self.ctm);
    }

    fn glyph_advance(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the line matrix by a translation (Td / TD / T*).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn set_font(&mut self, font: FontInfo, size: f32) {
        self.bold = font.is_bold();
        self.font = font;
        self.font_size = size;
    }

    /// Estimated rendered width of `text` in user space.
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_advance() * self.matrix_scale_x()
    }

    /// Advance the text position past `text`.
    fn advance_after_show(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_advance() + self.char_spacing + spacing
            })
            .sum();
        self.advance_x(dx);
    }

    fn run(&self, text: String, (x, baseline): (f32, f32)) -> TextRun {
        TextRun {
            width: self.text_width(&text),
            text,
            x,
            baseline,
            font_size: self.effective_font_size(),
            bold: self.bold,
        }
    }
}

/// Walks one page's operators and collects [`TextRun`]s.
struct PageWalker<'a> {
    backend: &'a dyn PdfBackend,
    fonts: Vec<FontInfo>,
    state: TextState,
    /// States saved by `q`.
    saved: Vec<TextState>,
    runs: Vec<TextRun>,
}

impl<'a> PageWalker<'a> {
    fn new(backend: &'a dyn PdfBackend, fonts: Vec<FontInfo>) -> Self {
        PageWalker {
            backend,
            fonts,
            state: TextState::default(),
            saved: Vec::new(),
            runs: Vec::new(),
        }
    }

    fn decode(&self, operand: &PdfValue) -> String {
        match operand {
            PdfValue::Str(bytes) => {
                let decoded = self.backend.decode_text(&self.state.font, bytes);
                if decoded.is_empty() {
                    decode_text_simple(bytes)
                } else {
                    decoded
                }
            }
            _ => String::new(),
        }
    }

    /// Apply one operator.
    ///
    /// | Operator | Action |
    /// |----------|--------|
    /// | `q` `Q`  | Save / restore graphics state |
    /// | `cm`     | Concatenate to the CTM |
    /// | `BT`     | Begin text object, reset matrices |
    /// | `Tf`     | Set font and size |
    /// | `Tm`     | Set text matrix |
    /// | `Td`     | Translate line |
    /// | `TD`     | Translate line and set leading |
    /// | `T*`     | Next line |
    /// | `TL` `Tc` `Tw` `Tz` `Ts` | Leading, spacing, scaling, rise |
    /// | `Tj`     | Show a string |
    /// | `TJ`     | Show strings with kerning |
    /// | `'` `"`  | Next line and show |
    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.saved.pop() {
                    // Text matrices are not part of the graphics state.
                    self.state = TextState {
                        text_matrix: self.state.text_matrix,
                        line_matrix: self.state.line_matrix,
                        ..saved
                    };
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(op) {
                    self.state.concat(m);
                }
            }
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => self.set_font(op),
            "Tm" => {
                if let Some(m) = matrix_operands(op) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = op.number(0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = op.number(0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.number(0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.number(0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.number(0) {
                    self.state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_array(items);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac), Some(operand)) =
                    (op.number(0), op.number(1), op.operands.get(2))
                {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                    self.state.next_line();
                    self.show(operand);
                }
            }
            _ => {}
        }
    }

    fn set_font(&mut self, op: &ContentOp) {
        let key = match op.operands.first() {
            Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.clone(),
            _ => return,
        };
        let size = op.number(1).unwrap_or(0.0);
        let font = self
            .fonts
            .iter()
            .find(|f| f.key == key)
            .cloned()
            .unwrap_or(FontInfo {
                key,
                ..FontInfo::default()
            });
        self.state.set_font(font, size);
    }

    fn show(&mut self, operand: &PdfValue) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let run = self.state.run(text, self.state.origin());
        self.state.advance_after_show(&run.text);
        self.runs.push(run);
    }

    /// `TJ` elements are strings or kerning shifts in thousandths of a text
    /// space unit.  One run is emitted per array; shifts wide enough to be a
    /// word gap become a space.
    fn show_array(&mut self, items: &[PdfValue]) {
        let mut buf = String::new();
        let mut origin = self.state.origin();

        for item in items {
            if let PdfValue::Str(_) = item {
                let piece = self.decode(item);
                if buf.is_empty() {
                    origin = self.state.origin();
                }
                buf.push_str(&piece);
                self.state.advance_after_show(&piece);
            } else if let Some(adj) = item.as_f32() {
                let dx = -adj / 1000.0 * self.state.font_size * self.state.horiz_scale;
                if dx > self.state.glyph_advance() * TJ_SPACE_RATIO && !buf.is_empty() {
                    buf.push(' ');
                }
                self.state.advance_x(dx);
            }
        }

        let text = buf.trim_end();
        if !text.is_empty() {
            let run = self.state.run(text.to_string(), origin);
            self.runs.push(run);
        }
    }
}

fn matrix_operands(op: &ContentOp) -> Option<[f32; 6]> {
    let vals: Vec<f32> = (0..6).filter_map(|i| op.number(i)).collect();
    match vals[..] {
        [a, b, c, d, e, f] => Some([a, b, c, d, e, f]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a run to a fragment in top-down page coordinates.
///
/// The box top sits one font size above the baseline.
fn to_fragment(run: TextRun, page_index: usize, page: PageSize) -> Option<Fragment> {
    let text: String = run.text.nfkc().collect();
    if text.trim().is_empty() {
        return None;
    }
    let top = page.height - run.baseline - run.font_size;
    Some(
        Fragment::new(text, run.font_size, page_index)
            .bold(run.bold)
            .at(run.x, top, run.width),
    )
}

/// Walk a single page's content stream and produce its fragments in stream
/// order.
///
/// `page_index` is 0-based.  Whitespace-only runs are dropped and text is
/// NFKC-normalized so ligatures and full-width forms compare as plain text.
pub fn extract_page_fragments(
    backend: &dyn PdfBackend,
    page_id: PageId,
    page_index: usize,
    page: PageSize,
) -> Result<Vec<Fragment>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|e| {
        log::warn!("page {}: cannot read fonts: {}", page_index + 1, e);
        Vec::new()
    });

    let mut walker = PageWalker::new(backend, fonts);
    for op in &ops {
        walker.apply(op);
    }

    let fragments: Vec<Fragment> = walker
        .runs
        .into_iter()
        .filter_map(|run| to_fragment(run, page_index, page))
        .collect();
    log::debug!(
        "page {}: {} operators, {} fragments",
        page_index + 1,
        ops.len(),
        fragments.len()
    );
    Ok(fragments)
}
