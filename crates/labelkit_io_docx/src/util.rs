//! Stateless helper utilities used by the DOCX writer and reader.

use crate::conf::{N_LINE_SPACING_AUTO_UNITS, N_TWIPS_PER_INCH};
use crate::spec::{SpecParagraph, SpecRun};

////////////////////////////////////////////////////////////////////////////////
// #region UnitConversion

/// Convert inches to twips, rounding to nearest.
pub fn convert_inches_to_twips(inches: f32) -> u32 {
    (inches * N_TWIPS_PER_INCH as f32).round().max(0.0) as u32
}

/// Convert a point size to the half-point unit used by `w:sz`.
pub fn convert_points_to_half_points(size_pt: f32) -> usize {
    (size_pt * 2.0).round().max(1.0) as usize
}

/// Convert a line-spacing multiplier to "auto" line units (`240` = single).
pub fn convert_line_spacing_to_units(multiplier: f32) -> i32 {
    (multiplier * N_LINE_SPACING_AUTO_UNITS).round() as i32
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextNormalization

/// Drop characters that are not allowed in XML 1.0 text nodes.
///
/// Tab and newline survive because the writer maps them to `w:tab`/`w:br`.
pub fn sanitize_xml_text(text: &str) -> String {
    text.chars()
        .filter(|ch| match *ch {
            '\t' | '\n' => true,
            '\r' => false,
            '\u{FFFE}' | '\u{FFFF}' => false,
            _ => !ch.is_control(),
        })
        .collect()
}

/// Piece of run text as emitted to the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumTextSegment {
    /// Literal text.
    Text(String),
    /// Line break (`w:br`).
    Break,
    /// Tab character (`w:tab`).
    Tab,
}

/// Split run text on `'\n'` and `'\t'` into writer segments.
pub fn split_run_text_segments(text: &str) -> Vec<EnumTextSegment> {
    let mut l_segments = Vec::new();
    let mut c_buf = String::new();
    for ch in text.chars() {
        match ch {
            '\n' | '\t' => {
                if !c_buf.is_empty() {
                    l_segments.push(EnumTextSegment::Text(std::mem::take(&mut c_buf)));
                }
                l_segments.push(if ch == '\n' {
                    EnumTextSegment::Break
                } else {
                    EnumTextSegment::Tab
                });
            }
            _ => c_buf.push(ch),
        }
    }
    if !c_buf.is_empty() {
        l_segments.push(EnumTextSegment::Text(c_buf));
    }
    l_segments
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ParagraphUtils

/// Merge every run into one run carrying the first run's format.
///
/// No-op for paragraphs with at most one run.
pub fn collapse_paragraph_runs(para: &mut SpecParagraph) {
    if para.runs.len() <= 1 {
        return;
    }
    let c_text = para.text();
    let format = para.runs[0].format.clone();
    para.runs = vec![SpecRun::with_format(c_text, format)];
}

/// Map a zero-based row-major cell index to `(row, col)`.
pub fn derive_row_major_position(idx_cell: usize, n_cols: usize) -> (usize, usize) {
    let n_cols = usize::max(1, n_cols);
    (idx_cell / n_cols, idx_cell % n_cols)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
