//! DOCX constants and default preset factories.

use crate::spec::{
    EnumBorderStyle, SpecPageSetup, SpecTableBorder, SpecTableBorders, SpecTextFormat,
};

/// Twips per inch.
pub const N_TWIPS_PER_INCH: u32 = 1_440;
/// Line-spacing units for one "auto" line.
pub const N_LINE_SPACING_AUTO_UNITS: f32 = 240.0;
/// US Letter width in twips.
pub const N_PAGE_LETTER_WIDTH_TWIPS: u32 = 12_240;
/// US Letter height in twips.
pub const N_PAGE_LETTER_HEIGHT_TWIPS: u32 = 15_840;
/// Default typeface.
pub const C_FONT_NAME_DEFAULT: &str = "Arial";
/// Default body size in points.
pub const N_FONT_SIZE_DEFAULT: f32 = 11.0;
/// Cut-guide border color.
pub const C_CUT_GUIDE_COLOR: &str = "BFBFBF";

/// Build the default body text format.
pub fn derive_default_text_format() -> SpecTextFormat {
    SpecTextFormat {
        font_name: Some(C_FONT_NAME_DEFAULT.to_string()),
        font_size: Some(N_FONT_SIZE_DEFAULT),
        bold: Some(false),
        italic: Some(false),
        font_color: None,
    }
}

/// US Letter portrait with half-inch margins.
pub fn derive_default_page_setup() -> SpecPageSetup {
    SpecPageSetup {
        width_twips: N_PAGE_LETTER_WIDTH_TWIPS,
        height_twips: N_PAGE_LETTER_HEIGHT_TWIPS,
        margin_top_twips: N_TWIPS_PER_INCH / 2,
        margin_bottom_twips: N_TWIPS_PER_INCH / 2,
        margin_left_twips: N_TWIPS_PER_INCH / 2,
        margin_right_twips: N_TWIPS_PER_INCH / 2,
    }
}

/// Dashed light-grey borders on every cell edge, used as a cutting guide.
pub fn derive_cut_guide_borders() -> SpecTableBorders {
    let border = SpecTableBorder {
        style: EnumBorderStyle::Dashed,
        size_eighth_pt: 4,
        color: C_CUT_GUIDE_COLOR.to_string(),
    };
    SpecTableBorders {
        outer: Some(border.clone()),
        inner: Some(border),
    }
}
