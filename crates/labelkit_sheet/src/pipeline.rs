//! Chunked label pipeline with a wall-clock budget.
//!
//! Records are split into sheet-sized chunks in input order. Each chunk runs
//! `Render -> Typography -> Color -> Scrub`; the two cosmetic stages are skipped
//! once the budget is spent, and the scrub stage always removes leftover
//! sentinels. Chunks are joined with page breaks.

use std::path::Path;
use std::time::{Duration, Instant};

use labelkit_io_docx::{DocxWriter, SpecDocument};
use tracing::{info, info_span, warn};

use crate::conf::C_LINE_BREAK_TOKEN;
use crate::context::build_label_contexts;
use crate::grid::{derive_builtin_master_document, expand_master_to_grid};
use crate::lineage::{apply_context_lineage, apply_lineage_colors, derive_grid_cell_fields};
use crate::marker::{count_marker_tokens, strip_marker_tokens};
use crate::render::render_label_grid;
use crate::report::{ReportLabelRun, ReportLabelRunBuilder, SpecChunkReport};
use crate::spec::{
    EnumChunkStatus, EnumRenderStage, LabelError, SpecGridGeometry, SpecLabelContext,
    SpecRecord, SpecRenderOptions, SpecTypographyScheme,
};
use crate::typography::TypographyEngine;
use crate::util::generate_record_chunks;

/// Rendered document plus run report.
#[derive(Debug, Clone)]
pub struct SpecLabelOutput {
    pub document: SpecDocument,
    pub report: ReportLabelRun,
}

/// Remove every sentinel and soft-break token left in `doc`; returns tokens removed.
pub fn scrub_document(doc: &mut SpecDocument) -> usize {
    let mut cnt_tokens = 0;
    for para in doc.paragraphs_mut() {
        for run in para.runs.iter_mut() {
            let n_tokens = count_marker_tokens(&run.text);
            if n_tokens > 0 {
                run.text = strip_marker_tokens(&run.text);
                cnt_tokens += n_tokens;
            }
            if run.text.contains(C_LINE_BREAK_TOKEN) {
                run.text = run.text.replace(C_LINE_BREAK_TOKEN, "\n");
            }
        }
        if let Some(run) = para.runs.last_mut() {
            let n_len_trimmed = run.text.trim_end_matches('\n').len();
            run.text.truncate(n_len_trimmed);
        }
    }
    cnt_tokens
}

struct ChunkOutcome {
    document: Option<SpecDocument>,
    status: EnumChunkStatus,
    cnt_cells_colored: u64,
    cnt_fallback_sizes: u64,
    cnt_orphan_markers: u64,
}

/// Label sheet renderer built once per style, scheme, options and master.
#[derive(Debug, Clone)]
pub struct LabelSheetRenderer {
    options: SpecRenderOptions,
    geometry: SpecGridGeometry,
    engine: TypographyEngine,
    doc_grid: SpecDocument,
}

impl LabelSheetRenderer {
    /// Build a renderer over the style's built-in master.
    pub fn new(
        options: SpecRenderOptions,
        scheme: SpecTypographyScheme,
    ) -> Result<Self, LabelError> {
        let master = derive_builtin_master_document(options.style);
        Self::with_master(options, scheme, &master)
    }

    /// Build a renderer over a caller-supplied master document.
    ///
    /// Scheme and geometry problems are fatal here, never per chunk.
    pub fn with_master(
        options: SpecRenderOptions,
        scheme: SpecTypographyScheme,
        master: &SpecDocument,
    ) -> Result<Self, LabelError> {
        let engine = TypographyEngine::new(scheme)?;
        let geometry = options.style.geometry();
        let doc_grid = expand_master_to_grid(master, &geometry, &options.style.dimension())?;
        Ok(Self {
            options,
            geometry,
            engine,
            doc_grid,
        })
    }

    pub fn options(&self) -> &SpecRenderOptions {
        &self.options
    }

    pub fn geometry(&self) -> &SpecGridGeometry {
        &self.geometry
    }

    /// Expanded, unrendered grid.
    pub fn grid(&self) -> &SpecDocument {
        &self.doc_grid
    }

    /// Render `l_records` into one document, one sheet per chunk.
    pub fn render(&self, l_records: &[SpecRecord]) -> Result<SpecLabelOutput, LabelError> {
        if l_records.is_empty() {
            return Err(LabelError::EmptyBatch);
        }
        let t_start_batch = Instant::now();
        let mut builder = ReportLabelRunBuilder::default();
        builder.add_counts(&["cnt_records"], l_records.len() as u64);

        let l_contexts = build_label_contexts(l_records);
        for ctx in &l_contexts {
            for c_issue in &ctx.l_issues {
                builder.add_warning(c_issue.clone());
            }
        }

        let l_chunks = generate_record_chunks(l_contexts.len(), self.geometry.n_cells);
        let mut doc_out: Option<SpecDocument> = None;
        for (idx_chunk, (idx_record_start, n_records)) in l_chunks.iter().copied().enumerate() {
            let _span_chunk = info_span!("label_chunk", idx_chunk, n_records).entered();
            let t_start_chunk = Instant::now();
            let outcome = self.render_chunk(
                &l_contexts[idx_record_start..idx_record_start + n_records],
                t_start_batch,
                t_start_chunk,
            );

            builder.add_counts(&["cnt_cells_colored"], outcome.cnt_cells_colored);
            builder.add_counts(&["cnt_fallback_sizes"], outcome.cnt_fallback_sizes);
            builder.add_counts(&["cnt_orphan_markers"], outcome.cnt_orphan_markers);
            builder.add_chunk(SpecChunkReport {
                idx_chunk,
                idx_record_start,
                n_records,
                status: outcome.status,
                elapsed_ms: t_start_chunk.elapsed().as_millis(),
            });

            if let Some(doc_chunk) = outcome.document {
                match doc_out.as_mut() {
                    Some(doc) => doc.append_with_page_break(doc_chunk),
                    None => doc_out = Some(doc_chunk),
                }
            }
        }

        let report = builder.build();
        let Some(document) = doc_out else {
            return Err(LabelError::NoDocumentProduced {
                n_chunks: l_chunks.len(),
            });
        };
        info!(
            style = self.options.style.name(),
            elapsed_ms = t_start_batch.elapsed().as_millis() as u64,
            "{}",
            report
        );
        Ok(SpecLabelOutput { document, report })
    }

    /// Render `l_records` and save the result as a `.docx` package.
    pub fn render_to_file(
        &self,
        l_records: &[SpecRecord],
        path_file_out: &Path,
    ) -> Result<ReportLabelRun, LabelError> {
        let output = self.render(l_records)?;
        let mut writer = DocxWriter::new(path_file_out.to_path_buf());
        writer.write_document(&output.document)?;
        writer.close()?;
        Ok(output.report)
    }

    fn is_budget_spent(&self, t_start_batch: Instant, t_start_chunk: Instant) -> bool {
        let budget = self.options.budget;
        let if_total_spent = budget
            .timeout_total_ms
            .is_some_and(|ms| t_start_batch.elapsed() >= Duration::from_millis(ms));
        let if_chunk_spent = budget
            .timeout_chunk_ms
            .is_some_and(|ms| t_start_chunk.elapsed() >= Duration::from_millis(ms));
        if_total_spent || if_chunk_spent
    }

    fn render_chunk(
        &self,
        l_contexts: &[SpecLabelContext],
        t_start_batch: Instant,
        t_start_chunk: Instant,
    ) -> ChunkOutcome {
        let mut outcome = ChunkOutcome {
            document: None,
            status: EnumChunkStatus::Completed,
            cnt_cells_colored: 0,
            cnt_fallback_sizes: 0,
            cnt_orphan_markers: 0,
        };

        let mut doc = match render_label_grid(&self.doc_grid, l_contexts, self.geometry.n_cells) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(error = %err, "label chunk failed");
                outcome.status = EnumChunkStatus::Failed {
                    message: err.to_string(),
                };
                return outcome;
            }
        };
        let mut l_cell_fields = derive_grid_cell_fields(&doc);
        apply_context_lineage(&mut l_cell_fields, l_contexts);
        let l_categories: Vec<_> = l_contexts.iter().map(|ctx| ctx.category).collect();

        for stage in [EnumRenderStage::Typography, EnumRenderStage::Color] {
            if stage.is_cosmetic() && self.is_budget_spent(t_start_batch, t_start_chunk) {
                warn!(stage = ?stage, "render budget spent, cosmetic stages skipped");
                outcome.status = EnumChunkStatus::Partial {
                    stage_skipped_first: stage,
                };
                break;
            }
            match stage {
                EnumRenderStage::Typography => {
                    let report = self
                        .engine
                        .apply(&mut doc, self.options.style, &l_categories);
                    outcome.cnt_fallback_sizes = report.cnt_fallback_sizes as u64;
                    outcome.cnt_orphan_markers = report.cnt_orphan_markers as u64;
                }
                EnumRenderStage::Color => {
                    outcome.cnt_cells_colored =
                        apply_lineage_colors(&mut doc, &l_cell_fields, self.engine.scheme()) as u64;
                }
                EnumRenderStage::Render | EnumRenderStage::Scrub => {}
            }
        }

        scrub_document(&mut doc);
        outcome.document = Some(doc);
        outcome
    }
}
