//! Label run report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::EnumChunkStatus;

/// Outcome of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecChunkReport {
    /// Zero-based chunk position.
    pub idx_chunk: usize,
    /// Index of the chunk's first record in the batch.
    pub idx_record_start: usize,
    /// Records rendered in this chunk.
    pub n_records: usize,
    /// Stage outcome.
    pub status: EnumChunkStatus,
    /// Wall-clock time spent on the chunk.
    pub elapsed_ms: u128,
}

/// Aggregate counters and diagnostics for one `render` run.
#[derive(Debug, Default, Clone)]
pub struct ReportLabelRun {
    /// Records received.
    pub cnt_records: u64,
    /// Chunks attempted.
    pub cnt_chunks: u64,
    /// Chunks where every stage ran.
    pub cnt_completed: u64,
    /// Chunks that skipped cosmetic stages.
    pub cnt_partial: u64,
    /// Chunks that produced no content.
    pub cnt_failed: u64,
    /// Cells painted with a lineage color.
    pub cnt_cells_colored: u64,
    /// Field spans sized with a style default.
    pub cnt_fallback_sizes: u64,
    /// Orphan sentinels dropped by the typography tokenizer.
    pub cnt_orphan_markers: u64,
    /// Per-record data issues.
    pub warnings: Vec<String>,
    /// Per-chunk failures.
    pub errors: Vec<String>,
    /// Per-chunk outcomes in input order.
    pub chunks: Vec<SpecChunkReport>,
}

impl ReportLabelRun {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_records".to_string(), self.cnt_records);
        dict_counts.insert("cnt_chunks".to_string(), self.cnt_chunks);
        dict_counts.insert("cnt_completed".to_string(), self.cnt_completed);
        dict_counts.insert("cnt_partial".to_string(), self.cnt_partial);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_cells_colored".to_string(), self.cnt_cells_colored);
        dict_counts.insert("cnt_fallback_sizes".to_string(), self.cnt_fallback_sizes);
        dict_counts.insert("cnt_orphan_markers".to_string(), self.cnt_orphan_markers);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} records={} chunks={} completed={} partial={} failed={} colored={} errors={} warnings={}",
            dict_counts["cnt_records"],
            dict_counts["cnt_chunks"],
            dict_counts["cnt_completed"],
            dict_counts["cnt_partial"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_cells_colored"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportLabelRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[LABEL]"))
    }
}

/// Mutable accumulator for label run statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportLabelRunBuilder {
    /// See [`ReportLabelRun::cnt_records`].
    pub cnt_records: u64,
    /// See [`ReportLabelRun::cnt_cells_colored`].
    pub cnt_cells_colored: u64,
    /// See [`ReportLabelRun::cnt_fallback_sizes`].
    pub cnt_fallback_sizes: u64,
    /// See [`ReportLabelRun::cnt_orphan_markers`].
    pub cnt_orphan_markers: u64,
    /// See [`ReportLabelRun::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportLabelRun::errors`].
    pub errors: Vec<String>,
    /// See [`ReportLabelRun::chunks`].
    pub chunks: Vec<SpecChunkReport>,
}

impl ReportLabelRunBuilder {
    /// Increment one or more named counters by `value`.
    ///
    /// Unknown names are ignored.
    pub fn add_counts(&mut self, field_names: &[&str], value: u64) {
        for field_name in field_names {
            match *field_name {
                "cnt_records" => self.cnt_records += value,
                "cnt_cells_colored" => self.cnt_cells_colored += value,
                "cnt_fallback_sizes" => self.cnt_fallback_sizes += value,
                "cnt_orphan_markers" => self.cnt_orphan_markers += value,
                _ => {}
            }
        }
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Record one chunk outcome; failures also land in `errors`.
    pub fn add_chunk(&mut self, chunk: SpecChunkReport) {
        if let EnumChunkStatus::Failed { message } = &chunk.status {
            self.errors
                .push(format!("chunk {}: {message}", chunk.idx_chunk));
        }
        self.chunks.push(chunk);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportLabelRun {
        let (mut cnt_completed, mut cnt_partial, mut cnt_failed) = (0, 0, 0);
        for chunk in &self.chunks {
            match chunk.status {
                EnumChunkStatus::Completed => cnt_completed += 1,
                EnumChunkStatus::Partial { .. } => cnt_partial += 1,
                EnumChunkStatus::Failed { .. } => cnt_failed += 1,
            }
        }
        ReportLabelRun {
            cnt_records: self.cnt_records,
            cnt_chunks: self.chunks.len() as u64,
            cnt_completed,
            cnt_partial,
            cnt_failed,
            cnt_cells_colored: self.cnt_cells_colored,
            cnt_fallback_sizes: self.cnt_fallback_sizes,
            cnt_orphan_markers: self.cnt_orphan_markers,
            warnings: self.warnings,
            errors: self.errors,
            chunks: self.chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::EnumRenderStage;

    fn derive_chunk(idx_chunk: usize, status: EnumChunkStatus) -> SpecChunkReport {
        SpecChunkReport {
            idx_chunk,
            idx_record_start: idx_chunk * 9,
            n_records: 9,
            status,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_report_label_run_to_dict_and_format() {
        let mut builder = ReportLabelRunBuilder::default();
        builder.add_counts(&["cnt_records"], 25);
        builder.add_counts(&["cnt_cells_colored", "unknown"], 4);
        builder.add_warning("record 3: missing price".to_string());
        builder.add_chunk(derive_chunk(0, EnumChunkStatus::Completed));
        builder.add_chunk(derive_chunk(
            1,
            EnumChunkStatus::Partial {
                stage_skipped_first: EnumRenderStage::Typography,
            },
        ));
        builder.add_chunk(derive_chunk(
            2,
            EnumChunkStatus::Failed {
                message: "bad placeholder".to_string(),
            },
        ));
        let report = builder.build();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_records"], 25);
        assert_eq!(dict_counts["cnt_chunks"], 3);
        assert_eq!(dict_counts["cnt_completed"], 1);
        assert_eq!(dict_counts["cnt_partial"], 1);
        assert_eq!(dict_counts["cnt_failed"], 1);
        assert_eq!(dict_counts["cnt_cells_colored"], 4);
        assert_eq!(report.errors, vec!["chunk 2: bad placeholder".to_string()]);

        let txt = report.format("[LABEL]");
        assert_eq!(
            txt,
            "[LABEL] records=25 chunks=3 completed=1 partial=1 failed=1 colored=4 errors=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}
