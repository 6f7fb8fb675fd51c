//! Lineage classification and cell coloring.
//!
//! Classification is a pure function over the lineage (falling back to the
//! strain) recovered from a rendered cell's markers. The keyword table lives in
//! [`crate::conf::TUP_LINEAGE_KEYWORDS`].

use labelkit_io_docx::{SpecDocument, SpecTableCell, SpecTextFormat};
use tracing::debug;

use crate::conf::TUP_LINEAGE_KEYWORDS;
use crate::marker::{EnumTextSpan, derive_text_spans};
use crate::spec::{
    EnumLabelField, EnumLineageCategory, SpecLabelContext, SpecTypographyScheme,
};
use crate::util::{contains_keyword_word, normalize_lineage_text};

/// Lineage and strain text recovered from one rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellFields {
    pub lineage: Option<String>,
    pub strain: Option<String>,
}

/// First category whose keyword appears in `text`, by table priority.
pub fn classify_lineage_text(text: &str) -> Option<EnumLineageCategory> {
    let c_norm = normalize_lineage_text(text);
    if c_norm.is_empty() {
        return None;
    }
    TUP_LINEAGE_KEYWORDS
        .iter()
        .find(|(_, l_keywords)| {
            l_keywords
                .iter()
                .any(|keyword| contains_keyword_word(&c_norm, keyword))
        })
        .map(|(category, _)| *category)
}

/// Canonical label when `text` is exactly one of the lineage keywords.
pub fn canonicalize_lineage_text(text: &str) -> Option<&'static str> {
    let c_norm = normalize_lineage_text(text);
    TUP_LINEAGE_KEYWORDS
        .iter()
        .find(|(_, l_keywords)| l_keywords.contains(&c_norm.as_str()))
        .map(|(category, _)| category.label())
}

/// Whether `text` is one of the canonical lineage labels.
pub fn is_canonical_lineage_text(text: &str) -> bool {
    let c_norm = normalize_lineage_text(text);
    TUP_LINEAGE_KEYWORDS
        .iter()
        .any(|(category, _)| category.label() == c_norm)
}

/// Category for a cell: lineage first, then strain, else uncolored.
pub fn classify_cell(fields: &SpecCellFields) -> Option<EnumLineageCategory> {
    fields
        .lineage
        .as_deref()
        .and_then(classify_lineage_text)
        .or_else(|| fields.strain.as_deref().and_then(classify_lineage_text))
}

/// Recover lineage and strain from the markers of one rendered cell.
pub fn derive_cell_fields(cell: &SpecTableCell) -> SpecCellFields {
    let mut fields = SpecCellFields::default();
    for para in &cell.paragraphs {
        let (l_spans, _) = derive_text_spans(&para.text());
        for span in l_spans {
            let EnumTextSpan::Field(span) = span else {
                continue;
            };
            match span.field {
                EnumLabelField::Lineage if fields.lineage.is_none() => {
                    fields.lineage = Some(span.text);
                }
                EnumLabelField::Strain if fields.strain.is_none() => {
                    fields.strain = Some(span.text);
                }
                _ => {}
            }
        }
    }
    fields
}

/// Cell fields of every table cell, row-major across tables.
pub fn derive_grid_cell_fields(doc: &SpecDocument) -> Vec<SpecCellFields> {
    doc.tables()
        .flat_map(|table| table.cells())
        .map(derive_cell_fields)
        .collect()
}

/// Swap in the record lineage for cells whose lineage slot shows the brand.
///
/// `l_fields` and `l_contexts` are index-aligned with the grid cells.
pub fn apply_context_lineage(l_fields: &mut [SpecCellFields], l_contexts: &[SpecLabelContext]) {
    for (fields, ctx) in l_fields.iter_mut().zip(l_contexts) {
        if let Some(c_lineage) = &ctx.lineage_source {
            fields.lineage = (!c_lineage.is_empty()).then(|| c_lineage.clone());
        }
    }
}

/// Paint every classified cell and return how many were painted.
///
/// `l_fields` is index-aligned with the row-major cells of `doc`.
pub fn apply_lineage_colors(
    doc: &mut SpecDocument,
    l_fields: &[SpecCellFields],
    scheme: &SpecTypographyScheme,
) -> usize {
    let fmt_painted = SpecTextFormat {
        font_name: Some(scheme.font_name.clone()),
        bold: Some(true),
        font_color: Some(scheme.font_color_painted.clone()),
        ..Default::default()
    };

    let mut cnt_painted = 0;
    let l_cells = doc.tables_mut().flat_map(|table| table.cells_mut());
    for (idx_cell, cell) in l_cells.enumerate() {
        let Some(category) = l_fields.get(idx_cell).and_then(classify_cell) else {
            continue;
        };
        cell.bg_color = Some(category.color().to_string());
        for para in cell.paragraphs.iter_mut() {
            for run in para.runs.iter_mut() {
                run.format = run.format.merge(&fmt_painted);
            }
        }
        cnt_painted += 1;
    }
    debug!(cnt_painted, "lineage colors applied");
    cnt_painted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::wrap;
    use labelkit_io_docx::{EnumBlock, SpecParagraph, SpecTable, SpecTableRow};

    fn derive_fields(lineage: &str, strain: &str) -> SpecCellFields {
        SpecCellFields {
            lineage: (!lineage.is_empty()).then(|| lineage.to_string()),
            strain: (!strain.is_empty()).then(|| strain.to_string()),
        }
    }

    #[test]
    fn test_classify_lineage_text_follows_priority() {
        assert_eq!(
            classify_lineage_text("Hybrid/Indica"),
            Some(EnumLineageCategory::HybridIndica)
        );
        assert_eq!(
            classify_lineage_text("sativa dominant hybrid"),
            Some(EnumLineageCategory::HybridSativa)
        );
        assert_eq!(
            classify_lineage_text("Paraphernalia"),
            Some(EnumLineageCategory::Paraphernalia)
        );
        assert_eq!(
            classify_lineage_text("CBD Blend"),
            Some(EnumLineageCategory::CbdBlend)
        );
        assert_eq!(classify_lineage_text("Blue Dream"), None);
        assert_eq!(classify_lineage_text(""), None);
    }

    #[test]
    fn test_classify_cell_falls_back_to_strain() {
        assert_eq!(classify_cell(&derive_fields("", "Blue Dream")), None);
        assert_eq!(
            classify_cell(&derive_fields("", "Indica Kush")),
            Some(EnumLineageCategory::Indica)
        );
        assert_eq!(
            classify_cell(&derive_fields("SATIVA", "Indica Kush")),
            Some(EnumLineageCategory::Sativa)
        );
    }

    #[test]
    fn test_apply_context_lineage_replaces_brand_slot() {
        let mut l_fields = vec![
            derive_fields("Chewy Co", ""),
            derive_fields("Hybrid Labs", "Blue Dream"),
            derive_fields("SATIVA", ""),
        ];
        let l_contexts = vec![
            SpecLabelContext {
                lineage_source: Some("Indica".to_string()),
                ..Default::default()
            },
            SpecLabelContext {
                lineage_source: Some(String::new()),
                ..Default::default()
            },
            SpecLabelContext::default(),
        ];
        apply_context_lineage(&mut l_fields, &l_contexts);
        assert_eq!(
            classify_cell(&l_fields[0]),
            Some(EnumLineageCategory::Indica)
        );
        assert_eq!(classify_cell(&l_fields[1]), None);
        assert_eq!(
            classify_cell(&l_fields[2]),
            Some(EnumLineageCategory::Sativa)
        );
    }

    #[test]
    fn test_canonical_lineage_text() {
        assert!(is_canonical_lineage_text("hybrid/indica"));
        assert!(!is_canonical_lineage_text("SATIVA DOMINANT"));
        assert_eq!(canonicalize_lineage_text("indica hybrid"), Some("HYBRID/INDICA"));
        assert_eq!(canonicalize_lineage_text("Sativa-ish"), None);
    }

    #[test]
    fn test_apply_lineage_colors_paints_classified_cells_only() {
        let cell_sativa = SpecTableCell {
            paragraphs: vec![SpecParagraph::from_text(wrap(
                "SATIVA",
                EnumLabelField::Lineage,
            ))],
            ..Default::default()
        };
        let cell_plain = SpecTableCell {
            paragraphs: vec![SpecParagraph::from_text(wrap(
                "Blue Dream",
                EnumLabelField::Strain,
            ))],
            ..Default::default()
        };
        let mut doc = SpecDocument::new(labelkit_io_docx::derive_default_page_setup());
        doc.blocks.push(EnumBlock::Table(SpecTable {
            rows: vec![SpecTableRow {
                cells: vec![cell_sativa, cell_plain],
                ..Default::default()
            }],
            ..Default::default()
        }));

        let l_fields = derive_grid_cell_fields(&doc);
        let scheme = SpecTypographyScheme::default();
        assert_eq!(apply_lineage_colors(&mut doc, &l_fields, &scheme), 1);

        let l_cells: Vec<&SpecTableCell> = doc.tables().flat_map(|t| t.cells()).collect();
        assert_eq!(l_cells[0].bg_color.as_deref(), Some("ED4123"));
        let fmt = &l_cells[0].paragraphs[0].runs[0].format;
        assert_eq!(fmt.bold, Some(true));
        assert_eq!(fmt.font_color.as_deref(), Some("FFFFFF"));
        assert_eq!(l_cells[1].bg_color, None);
    }
}
