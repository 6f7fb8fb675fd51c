//! In-memory word-processing document model, report and errors.

use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region TextFormatSpecification

/// Run-level text format with right-side overlay semantics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTextFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<f32>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Font color as `RRGGBB` hex.
    pub font_color: Option<String>,
}

impl SpecTextFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecTextFormat) -> SpecTextFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecTextFormat) -> SpecTextFormat {
        SpecTextFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumAlign {
    /// Left aligned.
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
    /// Justified.
    Justify,
}

/// Tab stop alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTabAlign {
    /// Text starts at the stop.
    Left,
    /// Text is centered on the stop.
    Center,
    /// Text ends at the stop.
    Right,
}

/// One paragraph tab stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecTabStop {
    /// Position from the paragraph's left edge in twips.
    pub position_twips: u32,
    /// Tab alignment.
    pub align: EnumTabAlign,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentTree

/// Styled text run. `'\n'` in `text` is a line break and `'\t'` a tab.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRun {
    /// Run text.
    pub text: String,
    /// Run format.
    pub format: SpecTextFormat,
}

impl SpecRun {
    /// Create an unformatted run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: SpecTextFormat::default(),
        }
    }

    /// Create a run with an explicit format.
    pub fn with_format(text: impl Into<String>, format: SpecTextFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

/// Paragraph of runs plus paragraph properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecParagraph {
    /// Ordered runs.
    pub runs: Vec<SpecRun>,
    /// Horizontal alignment; `None` inherits.
    pub align: Option<EnumAlign>,
    /// Left indent in twips.
    pub indent_left_twips: Option<i32>,
    /// Line spacing multiplier (`1.0` = single).
    pub line_spacing: Option<f32>,
    /// Custom tab stops.
    pub tab_stops: Vec<SpecTabStop>,
}

impl SpecParagraph {
    /// Create a paragraph holding one unformatted run.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![SpecRun::new(text)],
            ..Default::default()
        }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Table cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTableCell {
    /// Cell paragraphs.
    pub paragraphs: Vec<SpecParagraph>,
    /// Preferred width in twips.
    pub width_twips: Option<u32>,
    /// Background fill as `RRGGBB` hex.
    pub bg_color: Option<String>,
}

impl SpecTableCell {
    /// Paragraph texts joined by `'\n'`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(SpecParagraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any paragraph holds non-whitespace text.
    pub fn is_populated(&self) -> bool {
        self.paragraphs
            .iter()
            .any(|para| !para.text().trim().is_empty())
    }
}

/// Table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTableRow {
    /// Row cells.
    pub cells: Vec<SpecTableCell>,
    /// Row height in twips.
    pub height_twips: Option<u32>,
    /// Treat `height_twips` as exact instead of at-least.
    pub if_height_exact: bool,
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBorderStyle {
    /// No line.
    None,
    /// Solid line.
    Single,
    /// Dashed line.
    Dashed,
    /// Dotted line.
    Dotted,
}

/// One border line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableBorder {
    /// Line style.
    pub style: EnumBorderStyle,
    /// Width in eighths of a point.
    pub size_eighth_pt: u32,
    /// Line color as `RRGGBB` hex.
    pub color: String,
}

/// Outer and inner table borders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTableBorders {
    /// Top/bottom/left/right edges.
    pub outer: Option<SpecTableBorder>,
    /// Lines between rows and columns.
    pub inner: Option<SpecTableBorder>,
}

/// Table block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTable {
    /// Ordered rows.
    pub rows: Vec<SpecTableRow>,
    /// Grid column widths in twips.
    pub col_widths_twips: Vec<u32>,
    /// Fixed layout (no autofit).
    pub if_layout_fixed: bool,
    /// Border plan.
    pub borders: SpecTableBorders,
}

impl SpecTable {
    /// Number of columns of the widest row.
    pub fn n_cols(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &SpecTableCell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    /// Mutable cells in row-major order.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut SpecTableCell> {
        self.rows.iter_mut().flat_map(|row| row.cells.iter_mut())
    }
}

/// Top-level document block.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumBlock {
    /// Body paragraph.
    Paragraph(SpecParagraph),
    /// Table.
    Table(SpecTable),
    /// Hard page break.
    PageBreak,
}

/// Page size and margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPageSetup {
    /// Page width.
    pub width_twips: u32,
    /// Page height.
    pub height_twips: u32,
    /// Top margin.
    pub margin_top_twips: u32,
    /// Bottom margin.
    pub margin_bottom_twips: u32,
    /// Left margin.
    pub margin_left_twips: u32,
    /// Right margin.
    pub margin_right_twips: u32,
}

/// Whole document: ordered blocks plus page setup.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    /// Ordered body blocks.
    pub blocks: Vec<EnumBlock>,
    /// Page setup shared by all sections.
    pub page: SpecPageSetup,
}

impl SpecDocument {
    /// Create an empty document with the given page setup.
    pub fn new(page: SpecPageSetup) -> Self {
        Self {
            blocks: Vec::new(),
            page,
        }
    }

    /// Tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &SpecTable> {
        self.blocks.iter().filter_map(|block| match block {
            EnumBlock::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Mutable tables in document order.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut SpecTable> {
        self.blocks.iter_mut().filter_map(|block| match block {
            EnumBlock::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Every paragraph, body and table-cell, in document order.
    pub fn paragraphs_mut(&mut self) -> Vec<&mut SpecParagraph> {
        let mut l_paras = Vec::new();
        for block in self.blocks.iter_mut() {
            match block {
                EnumBlock::Paragraph(para) => l_paras.push(para),
                EnumBlock::Table(table) => {
                    for cell in table.cells_mut() {
                        l_paras.extend(cell.paragraphs.iter_mut());
                    }
                }
                EnumBlock::PageBreak => {}
            }
        }
        l_paras
    }

    /// Plain text of the document; paragraphs separated by `'\n'`.
    pub fn text(&self) -> String {
        let mut l_lines = Vec::new();
        for block in &self.blocks {
            match block {
                EnumBlock::Paragraph(para) => l_lines.push(para.text()),
                EnumBlock::Table(table) => {
                    l_lines.extend(table.cells().map(SpecTableCell::text));
                }
                EnumBlock::PageBreak => {}
            }
        }
        l_lines.join("\n")
    }

    /// Append `other`'s blocks after a page break (no break when `self` is empty).
    pub fn append_with_page_break(&mut self, other: SpecDocument) {
        if !self.blocks.is_empty() {
            self.blocks.push(EnumBlock::PageBreak);
        }
        self.blocks.extend(other.blocks);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Writer report accumulated across `write_document` calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecDocxReport {
    /// Number of documents buffered.
    pub cnt_documents: usize,
    /// Number of tables buffered.
    pub cnt_tables: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecDocxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Document package IO failures.
#[derive(Debug, thiserror::Error)]
pub enum DocxIoError {
    /// Write attempted after `close()`.
    #[error("Cannot write after close().")]
    Closed,
    /// Zip/XML packing failed.
    #[error("docx pack error: {0}")]
    Pack(String),
    /// Package parsing failed.
    #[error("docx read error: {0}")]
    Read(String),
    /// Filesystem failure.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
