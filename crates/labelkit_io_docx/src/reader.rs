//! DOCX reader: package bytes into the in-memory document model.
//!
//! Only structure and text are recovered (tables, rows, cells, paragraphs,
//! runs, tabs, breaks); run formatting is left to the caller's defaults.

use std::fs;
use std::path::Path;

use docx_rs::{
    DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild,
    read_docx,
};

use crate::conf::derive_default_page_setup;
use crate::spec::{
    DocxIoError, EnumBlock, SpecDocument, SpecParagraph, SpecRun, SpecTable, SpecTableCell,
    SpecTableRow,
};

/// Parse `.docx` package bytes.
pub fn read_docx_document(v_bytes: &[u8]) -> Result<SpecDocument, DocxIoError> {
    let docx = read_docx(v_bytes).map_err(|err| DocxIoError::Read(err.to_string()))?;

    let mut doc = SpecDocument::new(derive_default_page_setup());
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(para) => {
                doc.blocks
                    .push(EnumBlock::Paragraph(derive_spec_paragraph(para)));
            }
            DocumentChild::Table(table) => {
                doc.blocks.push(EnumBlock::Table(derive_spec_table(table)));
            }
            _ => {}
        }
    }
    Ok(doc)
}

/// Read and parse a `.docx` file.
pub fn read_docx_file(path_file: &Path) -> Result<SpecDocument, DocxIoError> {
    let v_bytes = fs::read(path_file).map_err(|source| DocxIoError::Io {
        path: path_file.to_path_buf(),
        source,
    })?;
    read_docx_document(&v_bytes)
}

#[allow(irrefutable_let_patterns)]
fn derive_spec_table(table: &docx_rs::Table) -> SpecTable {
    let mut spec = SpecTable::default();
    for child_row in &table.rows {
        if let TableChild::TableRow(row) = child_row {
            let mut spec_row = SpecTableRow::default();
            for child_cell in &row.cells {
                if let TableRowChild::TableCell(cell) = child_cell {
                    spec_row.cells.push(derive_spec_table_cell(cell));
                }
            }
            spec.rows.push(spec_row);
        }
    }
    spec
}

fn derive_spec_table_cell(cell: &docx_rs::TableCell) -> SpecTableCell {
    let mut spec = SpecTableCell::default();
    for content in &cell.children {
        if let TableCellContent::Paragraph(para) = content {
            spec.paragraphs.push(derive_spec_paragraph(para));
        }
    }
    spec
}

fn derive_spec_paragraph(para: &docx_rs::Paragraph) -> SpecParagraph {
    let mut spec = SpecParagraph::default();
    for child in &para.children {
        let ParagraphChild::Run(run) = child else {
            continue;
        };
        let mut c_text = String::new();
        for run_child in &run.children {
            match run_child {
                RunChild::Text(text) => c_text.push_str(&text.text),
                RunChild::Tab(_) => c_text.push('\t'),
                RunChild::Break(_) => c_text.push('\n'),
                _ => {}
            }
        }
        spec.runs.push(SpecRun::new(c_text));
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::derive_docx_bytes;

    #[test]
    fn test_read_docx_document_recovers_table_text() {
        let mut doc = SpecDocument::new(derive_default_page_setup());
        doc.blocks.push(EnumBlock::Table(SpecTable {
            rows: vec![SpecTableRow {
                cells: vec![
                    SpecTableCell {
                        paragraphs: vec![SpecParagraph::from_text("{{Label1.Price}}")],
                        ..Default::default()
                    },
                    SpecTableCell {
                        paragraphs: vec![SpecParagraph::from_text("SATIVA\tACME")],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }));

        let v_bytes = derive_docx_bytes(&doc).unwrap();
        let doc_read = read_docx_document(&v_bytes).unwrap();

        let table = doc_read.tables().next().unwrap();
        let l_texts: Vec<String> = table.cells().map(SpecTableCell::text).collect();
        assert_eq!(l_texts, vec!["{{Label1.Price}}", "SATIVA\tACME"]);
    }

    #[test]
    fn test_read_docx_document_rejects_garbage() {
        assert!(matches!(
            read_docx_document(b"not a zip"),
            Err(DocxIoError::Read(_))
        ));
    }
}
