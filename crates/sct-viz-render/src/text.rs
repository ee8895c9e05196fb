//! Approximate text metrics.
//!
//! Charts are emitted with a generic sans-serif family, so exact glyph
//! advances are unknown at layout time. Widths use per-class advance factors
//! typical of Helvetica-like faces, which is close enough for margins and
//! legend boxes.

use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Advance of one character in ems.
fn advance_em(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.25,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        '0'..='9' => 0.56,
        c if c.is_ascii_uppercase() => 0.68,
        _ => 0.54,
    }
}

/// Measure text width and height in points.
pub fn measure_text(text: &str, size_pt: f64, weight: FontWeight) -> TextMetrics {
    let bold = if weight == FontWeight::Bold { 1.06 } else { 1.0 };
    let em: f64 = text.chars().map(advance_em).sum();
    TextMetrics { width: em * size_pt * bold, height: 1.17 * size_pt, ascent: 0.93 * size_pt }
}

/// Measure text with a [`TextStyle`].
pub fn measure_styled(text: &str, style: &TextStyle) -> TextMetrics {
    measure_text(text, style.size, style.weight)
}
