//! `labelkit_io_docx` v1:
//! Rust-side word-processing document kernel.
//!
//! - `conf`   : constants and default presets
//! - `spec`   : document model, report and errors
//! - `util`   : pure helper functions
//! - `writer` : in-memory model to `.docx` package
//! - `reader` : `.docx` package to in-memory model
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_FONT_NAME_DEFAULT, N_PAGE_LETTER_HEIGHT_TWIPS, N_PAGE_LETTER_WIDTH_TWIPS, N_TWIPS_PER_INCH,
    derive_cut_guide_borders, derive_default_page_setup, derive_default_text_format,
};
pub use reader::{read_docx_document, read_docx_file};
pub use spec::{
    DocxIoError, EnumAlign, EnumBlock, EnumBorderStyle, EnumTabAlign, SpecDocument,
    SpecDocxReport, SpecPageSetup, SpecParagraph, SpecRun, SpecTabStop, SpecTable,
    SpecTableBorder, SpecTableBorders, SpecTableCell, SpecTableRow, SpecTextFormat,
};
pub use util::{
    collapse_paragraph_runs, convert_inches_to_twips, derive_row_major_position,
    sanitize_xml_text,
};
pub use writer::{DocxWriter, derive_docx_bytes};
