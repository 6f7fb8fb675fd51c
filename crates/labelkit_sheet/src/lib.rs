//! `labelkit_sheet` v1:
//! Rust-side grid label sheet pipeline.
//!
//! - `conf`       : constants, vocabularies and default presets
//! - `spec`       : shared models, options and errors
//! - `util`       : pure helper functions
//! - `marker`     : field sentinels and typed span tokenizer
//! - `grid`       : master cell to N-cell grid expansion
//! - `context`    : record to display-ready label context
//! - `render`     : double-brace template substitution
//! - `typography` : marker-driven sizing, breaks and alignment
//! - `lineage`    : lineage classification and cell coloring
//! - `ingest`     : DataFrame / IPC bytes to records
//! - `report`     : run report and builder
//! - `pipeline`   : chunked rendering with a wall-clock budget
pub mod conf;
pub mod context;
pub mod grid;
pub mod ingest;
pub mod lineage;
pub mod marker;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod spec;
pub mod typography;
pub mod util;

pub use conf::{derive_default_typography_scheme, derive_grid_geometry, derive_sheet_dimension};
pub use context::{build_label_context, build_label_contexts, classify_product_category};
pub use grid::{derive_builtin_master_document, expand_master_to_grid};
pub use ingest::{derive_records_from_dataframe, derive_records_from_ipc_bytes};
pub use lineage::{
    SpecCellFields, apply_lineage_colors, classify_cell, classify_lineage_text,
    is_canonical_lineage_text,
};
pub use marker::{
    EnumTextSpan, SpecFieldSpan, contains_marker, derive_text_spans, is_wrapped,
    strip_marker_tokens, unwrap, wrap,
};
pub use pipeline::{LabelSheetRenderer, SpecLabelOutput, scrub_document};
pub use render::render_label_grid;
pub use report::{ReportLabelRun, ReportLabelRunBuilder, SpecChunkReport};
pub use spec::{
    EnumChunkStatus, EnumLabelField, EnumLineageCategory, EnumOutputStyle, EnumProductCategory,
    EnumRecordValue, EnumRenderStage, LabelError, SpecFontSizeRule, SpecGridGeometry,
    SpecLabelContext, SpecRecord, SpecRenderBudget, SpecRenderOptions, SpecSheetDimension,
    SpecSizeBucket, SpecStyleTypography, SpecTypographyScheme,
};
pub use typography::{SpecTypographyReport, TypographyEngine};
