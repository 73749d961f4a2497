//! Geometry primitives, rectangle normalization, and small text helpers.

use crate::error::{PdfError, Result};
use serde::Serialize;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1); (x0, y0) is bottom-left in PDF space.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: the result applies m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Translates a matrix by (x, y) within its own coordinate system.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a rectangle.
///
/// The result is the axis-aligned rectangle tightly enclosing the
/// transformed corners, not a rotated rectangle.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    let corners = [
        apply_matrix_pt(m, (x0, y0)),
        apply_matrix_pt(m, (x1, y0)),
        apply_matrix_pt(m, (x1, y1)),
        apply_matrix_pt(m, (x0, y1)),
    ];
    let mut out = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for (x, y) in corners {
        out.0 = out.0.min(x);
        out.1 = out.1.min(y);
        out.2 = out.2.max(x);
        out.3 = out.3.max(y);
    }
    out
}

/// Union of two rectangles.
pub fn union_rect(a: Rect, b: Rect) -> Rect {
    (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
}

/// A rectangle expressed as fractions of the page size, measured from the
/// top-left corner. Suitable for overlaying on rendered pages regardless of
/// output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Converts a PDF-space rectangle into page-relative fractions.
///
/// Page extents are rounded to whole units before use as divisors. A page
/// with a zero extent cannot be normalized against.
pub fn normalize_rect(rect: Rect, pagebox: Rect) -> Result<NormalizedRect> {
    let pgwidth = (pagebox.0 - pagebox.2).abs().round();
    let pgheight = (pagebox.1 - pagebox.3).abs().round();
    if pgwidth == 0.0 || pgheight == 0.0 {
        return Err(PdfError::DegeneratePage);
    }
    let (x0, y0, x1, y1) = rect;
    Ok(NormalizedRect {
        x: x0.min(x1) / pgwidth,
        y: (pgheight - y0.max(y1)) / pgheight,
        width: (x0.max(x1) - x0.min(x1)) / pgwidth,
        height: (y0.max(y1) - y0.min(y1)) / pgheight,
    })
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, Latin-1 otherwise.
pub fn decode_text(s: &[u8]) -> String {
    if s.len() >= 2 && s[0] == 0xFE && s[1] == 0xFF {
        let utf16: Vec<u16> = s[2..]
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        s.iter().map(|&b| b as char).collect()
    }
}

/// Percent-encode a byte string for use in a URI.
///
/// ASCII alphanumerics, `_.-~`, and every byte in `safe` pass through
/// unchanged; space becomes `+`; everything else is `%XX`-escaped.
pub fn quote_plus(s: &[u8], safe: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s {
        let c = b as char;
        if b.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~') || safe.contains(c) {
            out.push(c);
        } else if b == b' ' {
            out.push('+');
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
