//! Grid expander: a single-cell master layout into a full N-cell label sheet.

use std::sync::LazyLock;

use labelkit_io_docx::{
    EnumAlign, EnumBlock, SpecDocument, SpecParagraph, SpecRun, SpecTable, SpecTableCell,
    SpecTableRow, collapse_paragraph_runs, derive_cut_guide_borders, derive_row_major_position,
};
use regex::Regex;
use tracing::debug;

use crate::conf::{TUP_LEGACY_REPAIRS, derive_builtin_master_lines};
use crate::spec::{EnumOutputStyle, LabelError, SpecGridGeometry, SpecSheetDimension};
use crate::util::compile_static_regex;

static RE_MASTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\bLabel1\.", "master label"));

fn derive_placeholder(key: &str) -> String {
    format!("{{{{Label1.{key}}}}}")
}

/// Insert missing placeholders of older masters after their anchor paragraph.
///
/// A repair is skipped when its anchor is absent too.
pub fn repair_legacy_master_cell(cell: &mut SpecTableCell) -> usize {
    let mut cnt_repaired = 0;
    for (c_key_missing, c_key_anchor) in TUP_LEGACY_REPAIRS {
        let c_missing = derive_placeholder(c_key_missing);
        if cell.paragraphs.iter().any(|para| para.text().contains(&c_missing)) {
            continue;
        }
        let c_anchor = derive_placeholder(c_key_anchor);
        let Some(idx_anchor) = cell
            .paragraphs
            .iter()
            .position(|para| para.text().contains(&c_anchor))
        else {
            continue;
        };
        let anchor = &cell.paragraphs[idx_anchor];
        let fmt_anchor = anchor
            .runs
            .first()
            .map(|run| run.format.clone())
            .unwrap_or_default();
        let para_new = SpecParagraph {
            runs: vec![SpecRun::with_format(c_missing, fmt_anchor)],
            align: anchor.align,
            indent_left_twips: None,
            line_spacing: anchor.line_spacing,
            tab_stops: Vec::new(),
        };
        cell.paragraphs.insert(idx_anchor + 1, para_new);
        cnt_repaired += 1;
        debug!(key = c_key_missing, anchor = c_key_anchor, "legacy master repaired");
    }
    cnt_repaired
}

fn derive_numbered_cell(master: &SpecTableCell, idx_label: usize) -> SpecTableCell {
    let mut cell = master.clone();
    let c_label = format!("Label{idx_label}.");
    for para in cell.paragraphs.iter_mut() {
        for run in para.runs.iter_mut() {
            if RE_MASTER_LABEL.is_match(&run.text) {
                run.text = RE_MASTER_LABEL
                    .replace_all(&run.text, c_label.as_str())
                    .into_owned();
            }
        }
    }
    cell
}

/// Expand the first populated cell of the master's first table into a grid.
///
/// Cell `i` (1-based, row-major) is a copy of the master cell with every
/// `Label1.` renumbered to `Label<i>.`. Columns get fixed widths, rows exact
/// heights, and every edge a cut-guide border.
pub fn expand_master_to_grid(
    master: &SpecDocument,
    geometry: &SpecGridGeometry,
    dimension: &SpecSheetDimension,
) -> Result<SpecDocument, LabelError> {
    geometry.validate()?;

    let table_master = master.tables().next().ok_or_else(|| {
        LabelError::Configuration("Master template has no table.".to_string())
    })?;
    let mut cell_master = table_master
        .cells()
        .find(|cell| cell.is_populated())
        .cloned()
        .ok_or_else(|| {
            LabelError::Configuration("Master template has no populated cell.".to_string())
        })?;

    for para in cell_master.paragraphs.iter_mut() {
        if para.text().contains("{{") {
            collapse_paragraph_runs(para);
        }
    }
    repair_legacy_master_cell(&mut cell_master);
    cell_master.width_twips = Some(dimension.cell_width_twips);

    let mut l_rows: Vec<SpecTableRow> = (0..geometry.n_rows)
        .map(|_| SpecTableRow {
            cells: Vec::with_capacity(geometry.n_cols),
            height_twips: Some(dimension.cell_height_twips),
            if_height_exact: true,
        })
        .collect();
    for idx_cell in 0..geometry.n_cells {
        let (idx_row, _) = derive_row_major_position(idx_cell, geometry.n_cols);
        l_rows[idx_row]
            .cells
            .push(derive_numbered_cell(&cell_master, idx_cell + 1));
    }

    let table = SpecTable {
        rows: l_rows,
        col_widths_twips: vec![dimension.cell_width_twips; geometry.n_cols],
        if_layout_fixed: true,
        borders: derive_cut_guide_borders(),
    };
    let mut doc = SpecDocument::new(dimension.page);
    doc.blocks.push(EnumBlock::Table(table));
    debug!(
        n_rows = geometry.n_rows,
        n_cols = geometry.n_cols,
        "master expanded to grid"
    );
    Ok(doc)
}

/// Built-in single-cell master of `style`, one centered paragraph per layout line.
pub fn derive_builtin_master_document(style: EnumOutputStyle) -> SpecDocument {
    let cell = SpecTableCell {
        paragraphs: derive_builtin_master_lines(style)
            .iter()
            .map(|line| SpecParagraph {
                align: Some(EnumAlign::Center),
                ..SpecParagraph::from_text(*line)
            })
            .collect(),
        ..Default::default()
    };
    let mut doc = SpecDocument::new(style.dimension().page);
    doc.blocks.push(EnumBlock::Table(SpecTable {
        rows: vec![SpecTableRow {
            cells: vec![cell],
            ..Default::default()
        }],
        ..Default::default()
    }));
    doc
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    static RE_LABEL_INDEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"Label(\d+)\.").unwrap());

    fn derive_cell_indices(doc: &SpecDocument) -> Vec<BTreeSet<usize>> {
        doc.tables()
            .flat_map(|table| table.cells())
            .map(|cell| {
                RE_LABEL_INDEX
                    .captures_iter(&cell.text())
                    .map(|caps| caps[1].parse::<usize>().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_expand_master_to_grid_every_style() {
        for style in EnumOutputStyle::ALL {
            let geometry = style.geometry();
            let doc = expand_master_to_grid(
                &derive_builtin_master_document(style),
                &geometry,
                &style.dimension(),
            )
            .unwrap();

            let table = doc.tables().next().unwrap();
            assert_eq!(table.rows.len(), geometry.n_rows);
            assert_eq!(table.n_cols(), geometry.n_cols);
            assert!(table.if_layout_fixed);
            assert!(table.rows.iter().all(|row| row.if_height_exact));
            assert!(table.cells().all(SpecTableCell::is_populated));

            let l_indices = derive_cell_indices(&doc);
            assert_eq!(l_indices.len(), geometry.n_cells);
            for (idx_cell, set_idx) in l_indices.iter().enumerate() {
                assert_eq!(set_idx, &BTreeSet::from([idx_cell + 1]));
            }
        }
    }

    #[test]
    fn test_expand_master_to_grid_repairs_legacy_masters() {
        let style = EnumOutputStyle::Double;
        let doc = expand_master_to_grid(
            &derive_builtin_master_document(style),
            &style.geometry(),
            &style.dimension(),
        )
        .unwrap();
        let cell = doc.tables().next().unwrap().cells().nth(4).unwrap();
        let l_texts: Vec<String> = cell.paragraphs.iter().map(SpecParagraph::text).collect();
        let idx_lineage = l_texts
            .iter()
            .position(|t| t.contains("{{Label5.Lineage}}"))
            .unwrap();
        assert_eq!(l_texts[idx_lineage + 1], "{{Label5.ProductBrand}}");

        let style = EnumOutputStyle::Mini;
        let doc = expand_master_to_grid(
            &derive_builtin_master_document(style),
            &style.geometry(),
            &style.dimension(),
        )
        .unwrap();
        let cell = doc.tables().next().unwrap().cells().last().unwrap();
        let l_texts: Vec<String> = cell.paragraphs.iter().map(SpecParagraph::text).collect();
        assert_eq!(l_texts.last().unwrap(), "{{Label20.DOH}}");
    }

    #[test]
    fn test_expand_master_to_grid_collapses_split_placeholders() {
        let mut master = derive_builtin_master_document(EnumOutputStyle::Horizontal);
        for table in master.tables_mut() {
            for cell in table.cells_mut() {
                cell.paragraphs[2].runs =
                    vec![SpecRun::new("{{Lab"), SpecRun::new("el1.Price}}")];
            }
        }
        let style = EnumOutputStyle::Horizontal;
        let doc = expand_master_to_grid(&master, &style.geometry(), &style.dimension()).unwrap();
        let cell = doc.tables().next().unwrap().cells().nth(8).unwrap();
        assert_eq!(cell.paragraphs[2].runs.len(), 1);
        assert_eq!(cell.paragraphs[2].runs[0].text, "{{Label9.Price}}");
    }

    #[test]
    fn test_expand_master_to_grid_rejects_bad_inputs() {
        let style = EnumOutputStyle::Horizontal;
        let empty = SpecDocument::new(style.dimension().page);
        assert!(matches!(
            expand_master_to_grid(&empty, &style.geometry(), &style.dimension()),
            Err(LabelError::Configuration(_))
        ));

        let mut blank = SpecDocument::new(style.dimension().page);
        blank.blocks.push(EnumBlock::Table(SpecTable {
            rows: vec![SpecTableRow {
                cells: vec![SpecTableCell::default()],
                ..Default::default()
            }],
            ..Default::default()
        }));
        assert!(matches!(
            expand_master_to_grid(&blank, &style.geometry(), &style.dimension()),
            Err(LabelError::Configuration(_))
        ));

        let geometry_bad = SpecGridGeometry {
            n_rows: 3,
            n_cols: 3,
            n_cells: 10,
        };
        assert!(matches!(
            expand_master_to_grid(
                &derive_builtin_master_document(style),
                &geometry_bad,
                &style.dimension()
            ),
            Err(LabelError::Configuration(_))
        ));
    }
}
