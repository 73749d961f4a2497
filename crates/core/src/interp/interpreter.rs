//! A restricted content-stream interpreter.
//!
//! Tracks only what text geometry needs: the current transformation matrix,
//! the text state, text-showing operators, and painted rectangles (the
//! latter feed comment containment). Fonts are not loaded; glyph advance
//! uses a fixed fraction of the font size, which keeps relative geometry
//! intact for marker detection without any metric machinery.

use crate::error::Result;
use crate::model::objects::safe_num;
use crate::model::PdfObject;
use crate::parser::pdf_parser::{ContentParser, Operation};
use crate::utils::{
    MATRIX_IDENTITY, Matrix, Point, Rect, apply_matrix_rect, decode_text, mult_matrix,
    translate_matrix, union_rect,
};

/// Approximate glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.5;

/// One text run: everything shown inside a single BT..ET block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Device-space bounding box.
    pub bbox: Rect,
    /// Decoded text.
    pub text: String,
}

/// The interpreter's output for one page.
#[derive(Debug, Default)]
pub struct PageLayout {
    pub runs: Vec<TextRun>,
    /// Painted rectangles (from `re` + a paint operator), device space.
    pub boxes: Vec<Rect>,
}

#[derive(Debug, Clone)]
struct TextState {
    matrix: Matrix,
    /// Position within the current line, in text space.
    line: Point,
    fontsize: f64,
    charspace: f64,
    wordspace: f64,
    /// Horizontal scaling percentage (100 = normal).
    scaling: f64,
    leading: f64,
    rise: f64,
}

impl TextState {
    fn new() -> Self {
        Self {
            matrix: MATRIX_IDENTITY,
            line: (0.0, 0.0),
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
        }
    }

    /// Reset the text and line matrices at the start of a text object.
    fn reset(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.line = (0.0, 0.0);
    }

    fn newline(&mut self) {
        self.matrix = translate_matrix(self.matrix, (0.0, -self.leading));
        self.line = (0.0, 0.0);
    }
}

pub struct LayoutInterpreter {
    ctm: Matrix,
    saved: Vec<Matrix>,
    ts: TextState,
    run_text: String,
    run_bbox: Option<Rect>,
    path_rects: Vec<Rect>,
    layout: PageLayout,
}

impl LayoutInterpreter {
    pub fn new() -> Self {
        Self {
            ctm: MATRIX_IDENTITY,
            saved: Vec::new(),
            ts: TextState::new(),
            run_text: String::new(),
            run_bbox: None,
            path_rects: Vec::new(),
            layout: PageLayout::default(),
        }
    }

    /// Run the interpreter over a page's content streams.
    pub fn process(streams: &[Vec<u8>]) -> Result<PageLayout> {
        let mut joined = Vec::new();
        for (i, stream) in streams.iter().enumerate() {
            if i > 0 {
                joined.push(b'\n');
            }
            joined.extend_from_slice(stream);
        }
        let ops = ContentParser::parse(&joined)?;

        let mut interp = Self::new();
        for op in &ops {
            interp.execute(op);
        }
        Ok(interp.finish())
    }

    fn finish(mut self) -> PageLayout {
        // Tolerate a missing ET at the end of the stream.
        self.flush_run();
        self.layout
    }

    fn execute(&mut self, op: &Operation) {
        let num = |i: usize| op.operands.get(i).and_then(safe_num);

        match op.operator.as_slice() {
            b"q" => self.saved.push(self.ctm),
            b"Q" => {
                if let Some(m) = self.saved.pop() {
                    self.ctm = m;
                }
            }
            b"cm" => {
                if let (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) =
                    (num(0), num(1), num(2), num(3), num(4), num(5))
                {
                    self.ctm = mult_matrix((a, b, c, d, e, f), self.ctm);
                }
            }

            b"re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) = (num(0), num(1), num(2), num(3)) {
                    self.path_rects
                        .push(apply_matrix_rect(self.ctm, (x, y, x + w, y + h)));
                }
            }
            b"S" | b"s" | b"f" | b"F" | b"f*" | b"B" | b"B*" | b"b" | b"b*" => {
                self.layout.boxes.append(&mut self.path_rects);
            }
            b"n" => self.path_rects.clear(),

            b"BT" => {
                self.ts.reset();
                self.run_text.clear();
                self.run_bbox = None;
            }
            b"ET" => self.flush_run(),

            b"Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.ts.matrix = translate_matrix(self.ts.matrix, (tx, ty));
                    self.ts.line = (0.0, 0.0);
                }
            }
            b"TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.ts.leading = -ty;
                    self.ts.matrix = translate_matrix(self.ts.matrix, (tx, ty));
                    self.ts.line = (0.0, 0.0);
                }
            }
            b"Tm" => {
                if let (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) =
                    (num(0), num(1), num(2), num(3), num(4), num(5))
                {
                    self.ts.matrix = (a, b, c, d, e, f);
                    self.ts.line = (0.0, 0.0);
                }
            }
            b"T*" => self.ts.newline(),
            b"TL" => {
                if let Some(l) = num(0) {
                    self.ts.leading = l;
                }
            }
            b"Tf" => {
                if let Some(size) = num(1) {
                    self.ts.fontsize = size;
                }
            }
            b"Tc" => {
                if let Some(v) = num(0) {
                    self.ts.charspace = v;
                }
            }
            b"Tw" => {
                if let Some(v) = num(0) {
                    self.ts.wordspace = v;
                }
            }
            b"Tz" => {
                if let Some(v) = num(0) {
                    self.ts.scaling = v;
                }
            }
            b"Ts" => {
                if let Some(v) = num(0) {
                    self.ts.rise = v;
                }
            }

            b"Tj" => {
                if let Some(PdfObject::Str(s)) = op.operands.first() {
                    self.show(s);
                }
            }
            b"'" => {
                self.ts.newline();
                if let Some(PdfObject::Str(s)) = op.operands.first() {
                    self.show(s);
                }
            }
            b"\"" => {
                if let Some(aw) = num(0) {
                    self.ts.wordspace = aw;
                }
                if let Some(ac) = num(1) {
                    self.ts.charspace = ac;
                }
                self.ts.newline();
                if let Some(PdfObject::Str(s)) = op.operands.get(2) {
                    self.show(s);
                }
            }
            b"TJ" => {
                if let Some(PdfObject::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            PdfObject::Str(s) => self.show(s),
                            other => {
                                if let Some(n) = safe_num(other) {
                                    self.ts.line.0 -=
                                        n / 1000.0 * self.ts.fontsize * (self.ts.scaling / 100.0);
                                }
                            }
                        }
                    }
                }
            }

            _ => {}
        }
    }

    /// Show a string: decode it, advance the line position, and grow the
    /// current run's bounding box.
    fn show(&mut self, bytes: &[u8]) {
        let text = decode_text(bytes);
        if text.is_empty() {
            return;
        }

        let scale = self.ts.scaling / 100.0;
        let start_x = self.ts.line.0;
        let mut x = start_x;
        for ch in text.chars() {
            let mut advance = self.ts.fontsize * GLYPH_WIDTH_RATIO + self.ts.charspace;
            if ch == ' ' {
                advance += self.ts.wordspace;
            }
            x += advance * scale;
        }

        let glyph_box = (start_x, self.ts.rise, x, self.ts.rise + self.ts.fontsize);
        let device_box = apply_matrix_rect(mult_matrix(self.ts.matrix, self.ctm), glyph_box);
        self.run_bbox = Some(match self.run_bbox {
            Some(b) => union_rect(b, device_box),
            None => device_box,
        });
        self.run_text.push_str(&text);
        self.ts.line.0 = x;
    }

    fn flush_run(&mut self) {
        if let Some(bbox) = self.run_bbox.take()
            && !self.run_text.is_empty()
        {
            self.layout.runs.push(TextRun {
                bbox,
                text: std::mem::take(&mut self.run_text),
            });
        }
        self.run_text.clear();
    }
}

impl Default for LayoutInterpreter {
    fn default() -> Self {
        Self::new()
    }
}
