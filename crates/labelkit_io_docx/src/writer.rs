//! DOCX writer kernel that converts the in-memory document model into a package.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use docx_rs::{
    AlignmentType, BorderType, BreakType, Docx, HeightRule, LineSpacing, LineSpacingType,
    PageMargin, Paragraph, Run, RunFonts, Shading, Tab, TabValueType, Table, TableBorder,
    TableBorderPosition, TableBorders, TableCell, TableLayoutType, TableRow, WidthType,
};
use tracing::{debug, info};

use crate::spec::{
    DocxIoError, EnumAlign, EnumBlock, EnumBorderStyle, EnumTabAlign, SpecDocument,
    SpecDocxReport, SpecPageSetup, SpecParagraph, SpecRun, SpecTable, SpecTableBorder,
    SpecTableBorders, SpecTableCell, SpecTableRow,
};
use crate::util::{
    EnumTextSegment, convert_line_spacing_to_units, convert_points_to_half_points,
    sanitize_xml_text, split_run_text_segments,
};

/// Stateful document writer.
///
/// Documents are buffered in memory until [`Self::close`] is called; each
/// document after the first starts on a new page.
pub struct DocxWriter {
    path_file_out: PathBuf,
    page: Option<SpecPageSetup>,
    l_blocks: Vec<EnumBlock>,
    report: SpecDocxReport,
    if_closed: bool,
}

impl DocxWriter {
    /// Create writer bound to output path.
    pub fn new(path_file_out: PathBuf) -> Self {
        Self {
            path_file_out,
            page: None,
            l_blocks: Vec::new(),
            report: SpecDocxReport::default(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return snapshot of the write report.
    pub fn report(&self) -> SpecDocxReport {
        self.report.clone()
    }

    /// Buffer one document.
    pub fn write_document(&mut self, doc: &SpecDocument) -> Result<(), DocxIoError> {
        if self.if_closed {
            return Err(DocxIoError::Closed);
        }

        match self.page {
            None => self.page = Some(doc.page),
            Some(page) if page != doc.page => {
                self.report.warn(format!(
                    "Page setup of document {} differs from the first document; first one kept.",
                    self.report.cnt_documents + 1
                ));
            }
            Some(_) => {}
        }

        if !self.l_blocks.is_empty() {
            self.l_blocks.push(EnumBlock::PageBreak);
        }
        self.report.cnt_documents += 1;
        self.report.cnt_tables += doc.tables().count();
        self.l_blocks.extend(doc.blocks.iter().cloned());
        Ok(())
    }

    /// Flush buffered documents to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), DocxIoError> {
        if self.if_closed {
            return Ok(());
        }
        let doc = SpecDocument {
            blocks: std::mem::take(&mut self.l_blocks),
            page: self.page.unwrap_or_else(crate::conf::derive_default_page_setup),
        };
        let v_bytes = derive_docx_bytes(&doc)?;
        fs::write(&self.path_file_out, &v_bytes).map_err(|source| DocxIoError::Io {
            path: self.path_file_out.clone(),
            source,
        })?;
        info!(
            path = %self.path_file_out.display(),
            n_bytes = v_bytes.len(),
            n_documents = self.report.cnt_documents,
            "docx written"
        );
        self.if_closed = true;
        Ok(())
    }
}

/// Serialize one document into `.docx` package bytes.
pub fn derive_docx_bytes(doc: &SpecDocument) -> Result<Vec<u8>, DocxIoError> {
    let docx = derive_docx_package(doc);
    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|err| DocxIoError::Pack(err.to_string()))?;
    let v_bytes = cursor.into_inner();
    debug!(n_bytes = v_bytes.len(), n_blocks = doc.blocks.len(), "docx packed");
    Ok(v_bytes)
}

fn derive_docx_package(doc: &SpecDocument) -> Docx {
    let mut docx = Docx::new()
        .page_size(doc.page.width_twips, doc.page.height_twips)
        .page_margin(
            PageMargin::new()
                .top(doc.page.margin_top_twips as _)
                .bottom(doc.page.margin_bottom_twips as _)
                .left(doc.page.margin_left_twips as _)
                .right(doc.page.margin_right_twips as _),
        );

    for block in &doc.blocks {
        docx = match block {
            EnumBlock::Paragraph(para) => docx.add_paragraph(derive_docx_paragraph(para)),
            EnumBlock::Table(table) => docx.add_table(derive_docx_table(table)),
            EnumBlock::PageBreak => {
                docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            }
        };
    }
    docx
}

fn derive_docx_table(spec: &SpecTable) -> Table {
    let l_rows = spec.rows.iter().map(derive_docx_table_row).collect();
    let mut table = Table::new(l_rows).set_borders(derive_docx_table_borders(&spec.borders));

    if !spec.col_widths_twips.is_empty() {
        let l_grid: Vec<usize> = spec.col_widths_twips.iter().map(|w| *w as usize).collect();
        let n_width_total: usize = l_grid.iter().sum();
        table = table
            .set_grid(l_grid)
            .width(n_width_total, WidthType::Dxa);
    }
    if spec.if_layout_fixed {
        table = table.layout(TableLayoutType::Fixed);
    }
    table
}

fn derive_docx_table_row(spec: &SpecTableRow) -> TableRow {
    let l_cells = spec.cells.iter().map(derive_docx_table_cell).collect();
    let mut row = TableRow::new(l_cells);
    if let Some(n_height) = spec.height_twips {
        let rule = if spec.if_height_exact {
            HeightRule::Exact
        } else {
            HeightRule::AtLeast
        };
        row = row.row_height(n_height as f32).height_rule(rule);
    }
    row
}

fn derive_docx_table_cell(spec: &SpecTableCell) -> TableCell {
    let mut cell = TableCell::new();
    for para in &spec.paragraphs {
        cell = cell.add_paragraph(derive_docx_paragraph(para));
    }
    // A cell without a paragraph is not valid WordprocessingML.
    if spec.paragraphs.is_empty() {
        cell = cell.add_paragraph(Paragraph::new());
    }
    if let Some(n_width) = spec.width_twips {
        cell = cell.width(n_width as usize, WidthType::Dxa);
    }
    if let Some(bg_color) = &spec.bg_color {
        cell = cell.shading(Shading::new().fill(bg_color.clone()));
    }
    cell
}

fn derive_docx_paragraph(spec: &SpecParagraph) -> Paragraph {
    let mut para = Paragraph::new();
    for run in &spec.runs {
        para = para.add_run(derive_docx_run(run));
    }
    if let Some(align) = spec.align {
        para = para.align(derive_alignment_type(align));
    }
    if let Some(n_indent) = spec.indent_left_twips {
        para = para.indent(Some(n_indent), None, None, None);
    }
    if let Some(n_spacing) = spec.line_spacing {
        para = para.line_spacing(
            LineSpacing::new()
                .line_rule(LineSpacingType::Auto)
                .line(convert_line_spacing_to_units(n_spacing) as _),
        );
    }
    for tab in &spec.tab_stops {
        para = para.add_tab(
            Tab::new()
                .val(derive_tab_value_type(tab.align))
                .pos(tab.position_twips as _),
        );
    }
    para
}

fn derive_docx_run(spec: &SpecRun) -> Run {
    let mut run = Run::new();
    for segment in split_run_text_segments(&sanitize_xml_text(&spec.text)) {
        run = match segment {
            EnumTextSegment::Text(text) => run.add_text(text),
            EnumTextSegment::Break => run.add_break(BreakType::TextWrapping),
            EnumTextSegment::Tab => run.add_tab(),
        };
    }

    let fmt = &spec.format;
    if let Some(name) = &fmt.font_name {
        run = run.fonts(
            RunFonts::new()
                .ascii(name.clone())
                .hi_ansi(name.clone())
                .east_asia(name.clone())
                .cs(name.clone()),
        );
    }
    if let Some(n_size) = fmt.font_size {
        run = run.size(convert_points_to_half_points(n_size));
    }
    if fmt.bold.unwrap_or(false) {
        run = run.bold();
    }
    if fmt.italic.unwrap_or(false) {
        run = run.italic();
    }
    if let Some(color) = &fmt.font_color {
        run = run.color(color.clone());
    }
    run
}

fn derive_docx_table_borders(spec: &SpecTableBorders) -> TableBorders {
    let mut borders = TableBorders::with_empty();
    if let Some(outer) = &spec.outer {
        for position in [
            TableBorderPosition::Top,
            TableBorderPosition::Bottom,
            TableBorderPosition::Left,
            TableBorderPosition::Right,
        ] {
            borders = borders.set(derive_docx_table_border(outer, position));
        }
    }
    if let Some(inner) = &spec.inner {
        for position in [TableBorderPosition::InsideH, TableBorderPosition::InsideV] {
            borders = borders.set(derive_docx_table_border(inner, position));
        }
    }
    borders
}

fn derive_docx_table_border(spec: &SpecTableBorder, position: TableBorderPosition) -> TableBorder {
    TableBorder::new(position)
        .size(spec.size_eighth_pt as usize)
        .color(spec.color.clone())
        .border_type(derive_border_type(spec.style))
}

fn derive_border_type(style: EnumBorderStyle) -> BorderType {
    match style {
        EnumBorderStyle::None => BorderType::Nil,
        EnumBorderStyle::Single => BorderType::Single,
        EnumBorderStyle::Dashed => BorderType::Dashed,
        EnumBorderStyle::Dotted => BorderType::Dotted,
    }
}

fn derive_alignment_type(align: EnumAlign) -> AlignmentType {
    match align {
        EnumAlign::Left => AlignmentType::Left,
        EnumAlign::Center => AlignmentType::Center,
        EnumAlign::Right => AlignmentType::Right,
        EnumAlign::Justify => AlignmentType::Both,
    }
}

fn derive_tab_value_type(align: EnumTabAlign) -> TabValueType {
    match align {
        EnumTabAlign::Left => TabValueType::Left,
        EnumTabAlign::Center => TabValueType::Center,
        EnumTabAlign::Right => TabValueType::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{derive_cut_guide_borders, derive_default_page_setup};
    use crate::spec::SpecTextFormat;

    fn derive_sample_document() -> SpecDocument {
        let fmt = SpecTextFormat {
            font_size: Some(14.0),
            bold: Some(true),
            ..Default::default()
        };
        let cell = SpecTableCell {
            paragraphs: vec![SpecParagraph {
                runs: vec![SpecRun::with_format("THC: 25%\nCBD: 2%", fmt)],
                line_spacing: Some(1.15),
                ..Default::default()
            }],
            width_twips: Some(3456),
            bg_color: Some("009900".to_string()),
        };
        let mut doc = SpecDocument::new(derive_default_page_setup());
        doc.blocks.push(EnumBlock::Table(SpecTable {
            rows: vec![SpecTableRow {
                cells: vec![cell.clone(), cell],
                height_twips: Some(3456),
                if_height_exact: true,
            }],
            col_widths_twips: vec![3456, 3456],
            if_layout_fixed: true,
            borders: derive_cut_guide_borders(),
        }));
        doc
    }

    #[test]
    fn test_derive_docx_bytes_is_zip_package() {
        let v_bytes = derive_docx_bytes(&derive_sample_document()).unwrap();
        assert!(v_bytes.len() > 4);
        assert_eq!(&v_bytes[..2], b"PK");
    }

    #[test]
    fn test_writer_close_is_idempotent_and_blocks_late_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path_out = dir.path().join("labels.docx");
        let mut writer = DocxWriter::new(path_out.clone());

        writer.write_document(&derive_sample_document()).unwrap();
        writer.write_document(&derive_sample_document()).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert!(path_out.is_file());
        assert_eq!(writer.report().cnt_documents, 2);
        assert_eq!(writer.report().cnt_tables, 2);
        assert!(matches!(
            writer.write_document(&derive_sample_document()),
            Err(DocxIoError::Closed)
        ));
    }

    #[test]
    fn test_writer_warns_on_page_setup_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DocxWriter::new(dir.path().join("mixed.docx"));
        let doc_portrait = derive_sample_document();
        let mut doc_landscape = derive_sample_document();
        doc_landscape.page.width_twips = doc_portrait.page.height_twips;
        doc_landscape.page.height_twips = doc_portrait.page.width_twips;

        writer.write_document(&doc_portrait).unwrap();
        writer.write_document(&doc_landscape).unwrap();
        assert_eq!(writer.report().warnings.len(), 1);
    }
}
