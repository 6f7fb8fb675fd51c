//! Post-render typography: sizes, breaks and alignment driven by marker spans.
//!
//! The engine re-tokenizes every rendered paragraph into typed spans, sizes each
//! field by its complexity through the scheme's ladders, and rebuilds the
//! paragraph's runs without sentinels.

use labelkit_io_docx::{
    EnumAlign, EnumBlock, EnumTabAlign, SpecDocument, SpecParagraph, SpecRun, SpecTabStop,
    SpecTextFormat,
};
use tracing::debug;

use crate::conf::C_LINE_BREAK_TOKEN;
use crate::lineage::is_canonical_lineage_text;
use crate::marker::{EnumTextSpan, SpecFieldSpan, derive_text_spans};
use crate::spec::{
    EnumLabelField, EnumOutputStyle, EnumProductCategory, LabelError, SpecTypographyScheme,
};
use crate::util::calculate_text_complexity;

/// Counters of one typography pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecTypographyReport {
    /// Paragraphs whose runs were rebuilt.
    pub cnt_paragraphs_styled: usize,
    /// Field spans sized.
    pub cnt_spans: usize,
    /// Spans sized with the style default because no rule or bucket matched.
    pub cnt_fallback_sizes: usize,
    /// Orphan sentinels dropped.
    pub cnt_orphan_markers: usize,
}

/// Turn soft break tokens into line breaks and drop trailing breaks.
pub fn convert_soft_breaks(text: &str) -> String {
    text.replace(C_LINE_BREAK_TOKEN, "\n")
        .trim_end_matches('\n')
        .to_string()
}

/// Marker-driven typography with an explicit scheme.
#[derive(Debug, Clone)]
pub struct TypographyEngine {
    scheme: SpecTypographyScheme,
}

impl TypographyEngine {
    /// Validate `scheme` and build the engine.
    pub fn new(scheme: SpecTypographyScheme) -> Result<Self, LabelError> {
        scheme.validate()?;
        Ok(Self { scheme })
    }

    pub fn scheme(&self) -> &SpecTypographyScheme {
        &self.scheme
    }

    /// Size for `text` in `field`; the flag is `true` when the style default was used.
    pub fn resolve_font_size(
        &self,
        field: EnumLabelField,
        style: EnumOutputStyle,
        category: Option<EnumProductCategory>,
        text: &str,
    ) -> (f32, bool) {
        let complexity = calculate_text_complexity(
            text,
            self.scheme.n_len_long_word,
            self.scheme.n_complexity_per_extra_line,
        );
        match self
            .scheme
            .lookup_font_size(field, style, category, complexity)
        {
            Some(size_pt) => (size_pt, false),
            None => (self.scheme.size_default(style), true),
        }
    }

    /// Style every paragraph of `doc`.
    ///
    /// `l_categories` is index-aligned with the row-major table cells; body
    /// paragraphs and cells without an entry use the general rules.
    pub fn apply(
        &self,
        doc: &mut SpecDocument,
        style: EnumOutputStyle,
        l_categories: &[EnumProductCategory],
    ) -> SpecTypographyReport {
        let n_tab_pos = style.dimension().cell_inner_width_twips();
        let mut report = SpecTypographyReport::default();
        let mut idx_cell = 0;
        for block in doc.blocks.iter_mut() {
            match block {
                EnumBlock::Paragraph(para) => {
                    self.style_paragraph(para, style, None, n_tab_pos, &mut report);
                }
                EnumBlock::Table(table) => {
                    for cell in table.cells_mut() {
                        let category = l_categories.get(idx_cell).copied();
                        for para in cell.paragraphs.iter_mut() {
                            self.style_paragraph(para, style, category, n_tab_pos, &mut report);
                        }
                        idx_cell += 1;
                    }
                }
                EnumBlock::PageBreak => {}
            }
        }
        debug!(
            cnt_paragraphs_styled = report.cnt_paragraphs_styled,
            cnt_spans = report.cnt_spans,
            cnt_fallback_sizes = report.cnt_fallback_sizes,
            "typography applied"
        );
        report
    }

    fn style_paragraph(
        &self,
        para: &mut SpecParagraph,
        style: EnumOutputStyle,
        category: Option<EnumProductCategory>,
        n_tab_pos: u32,
        report: &mut SpecTypographyReport,
    ) {
        let (l_spans, n_orphans) = derive_text_spans(&para.text());
        report.cnt_orphan_markers += n_orphans;

        let fmt_base = para
            .runs
            .first()
            .map(|run| run.format.clone())
            .unwrap_or_default();
        let fmt_literal = fmt_base.with_(SpecTextFormat {
            font_size: Some(self.scheme.size_default(style)),
            ..Default::default()
        });

        let l_fields: Vec<&SpecFieldSpan> = l_spans
            .iter()
            .filter_map(|span| match span {
                EnumTextSpan::Field(field_span) => Some(field_span),
                EnumTextSpan::Literal(_) => None,
            })
            .collect();
        if l_fields.is_empty() {
            if n_orphans > 0 {
                let c_text: String = l_spans
                    .iter()
                    .map(|span| match span {
                        EnumTextSpan::Literal(c_txt) => convert_soft_breaks(c_txt),
                        EnumTextSpan::Field(field_span) => convert_soft_breaks(&field_span.text),
                    })
                    .collect();
                para.runs = vec![SpecRun::with_format(c_text, fmt_base)];
            }
            return;
        }

        let span_of = |field: EnumLabelField| l_fields.iter().find(|span| span.field == field);
        let span_lineage = span_of(EnumLabelField::Lineage);
        let span_vendor = span_of(EnumLabelField::Vendor);
        let if_lineage_vendor = span_lineage.is_some() && span_vendor.is_some();
        let if_lineage_canonical =
            span_lineage.is_some_and(|span| is_canonical_lineage_text(&span.text));

        let size_lineage = span_lineage.map(|span| {
            self.resolve_font_size(EnumLabelField::Lineage, style, category, &span.text)
                .0
        });
        let c_vendor_sep = match (span_lineage, span_vendor) {
            (Some(lineage), Some(vendor))
                if lineage.text.chars().count() + vendor.text.chars().count()
                    > self.scheme.n_chars_lineage_vendor_max(style) =>
            {
                "\n\t"
            }
            _ => "\t",
        };

        let mut l_runs = Vec::with_capacity(l_spans.len());
        for span in &l_spans {
            match span {
                EnumTextSpan::Literal(c_txt) => {
                    if if_lineage_vendor && c_txt.trim().is_empty() {
                        continue;
                    }
                    l_runs.push(SpecRun::with_format(
                        convert_soft_breaks(c_txt),
                        fmt_literal.clone(),
                    ));
                }
                EnumTextSpan::Field(field_span) => {
                    let c_text = convert_soft_breaks(&field_span.text);
                    if c_text.trim().is_empty() {
                        continue;
                    }
                    let (mut size_pt, if_fallback) =
                        self.resolve_font_size(field_span.field, style, category, &field_span.text);
                    report.cnt_spans += 1;
                    if if_fallback {
                        report.cnt_fallback_sizes += 1;
                    }

                    let if_vendor = field_span.field == EnumLabelField::Vendor;
                    let c_run_text = if if_vendor && if_lineage_vendor {
                        if let Some(size_cap) = size_lineage {
                            size_pt = f32::min(size_pt, size_cap);
                        }
                        format!("{c_vendor_sep}{c_text}")
                    } else {
                        c_text
                    };
                    l_runs.push(SpecRun::with_format(
                        c_run_text,
                        fmt_base.with_(SpecTextFormat {
                            font_name: Some(self.scheme.font_name.clone()),
                            font_size: Some(size_pt),
                            bold: Some(!if_vendor),
                            italic: Some(if_vendor),
                            font_color: None,
                        }),
                    ));
                }
            }
        }
        trim_trailing_breaks(&mut l_runs);
        para.runs = l_runs;

        let if_has = |field: EnumLabelField| l_fields.iter().any(|span| span.field == field);
        if if_has(EnumLabelField::Brand) || if_has(EnumLabelField::Doh) {
            para.align = Some(EnumAlign::Center);
        }
        if span_lineage.is_some() {
            if if_lineage_canonical || if_lineage_vendor {
                para.align = Some(EnumAlign::Left);
            } else {
                para.align = Some(EnumAlign::Center);
            }
            para.indent_left_twips =
                if_lineage_canonical.then_some(self.scheme.indent_lineage_twips);
        }
        if if_lineage_vendor {
            para.tab_stops = vec![SpecTabStop {
                position_twips: n_tab_pos,
                align: EnumTabAlign::Right,
            }];
        }
        para.line_spacing = Some(if if_has(EnumLabelField::Ratio) {
            self.scheme.line_spacing_potency
        } else {
            self.scheme.line_spacing_default
        });
        report.cnt_paragraphs_styled += 1;
    }
}

fn trim_trailing_breaks(l_runs: &mut Vec<SpecRun>) {
    while let Some(run) = l_runs.last_mut() {
        let c_trimmed = run.text.trim_end_matches('\n');
        if c_trimmed.len() != run.text.len() {
            run.text = c_trimmed.to_string();
        }
        if run.text.is_empty() {
            l_runs.pop();
        } else {
            break;
        }
    }
}
