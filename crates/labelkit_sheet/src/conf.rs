//! Label-sheet constants, vocabularies and default preset factories.

use std::collections::BTreeMap;

use labelkit_io_docx::{SpecPageSetup, convert_inches_to_twips};

use crate::spec::{
    EnumLabelField, EnumLineageCategory, EnumOutputStyle, EnumProductCategory, SpecFontSizeRule,
    SpecGridGeometry, SpecSheetDimension, SpecSizeBucket, SpecStyleTypography,
    SpecTypographyScheme,
};

////////////////////////////////////////////////////////////////////////////////
// #region MarkerAndTemplateConstants

/// Suffix of a field's start sentinel (`DESC` + `STARTMK`).
pub const C_MARKER_START_SUFFIX: &str = "STARTMK";
/// Suffix of a field's end sentinel (`DESC` + `ENDMK`).
pub const C_MARKER_END_SUFFIX: &str = "ENDMK";
/// In-value soft line break, turned into a real break by typography.
pub const C_LINE_BREAK_TOKEN: &str = "|BR|";
/// Separator between description and weight in `DescAndWeight`.
pub const C_DESC_WEIGHT_JOIN: &str = " -\u{a0}";
/// Non-breaking space.
pub const C_NBSP: &str = "\u{a0}";

/// Template variable names and the marker field each one carries.
pub const TUP_TEMPLATE_KEYS: [(&str, EnumLabelField); 10] = [
    ("DescAndWeight", EnumLabelField::Description),
    ("Description", EnumLabelField::Description),
    ("ProductBrand", EnumLabelField::Brand),
    ("Price", EnumLabelField::Price),
    ("Lineage", EnumLabelField::Lineage),
    ("Ratio", EnumLabelField::Ratio),
    ("ProductStrain", EnumLabelField::Strain),
    ("WeightUnits", EnumLabelField::Weight),
    ("ProductVendor", EnumLabelField::Vendor),
    ("DOH", EnumLabelField::Doh),
];

/// Placeholders inserted into legacy masters: `(missing key, anchor key)`.
pub const TUP_LEGACY_REPAIRS: [(&str, &str); 2] =
    [("ProductBrand", "Lineage"), ("DOH", "ProductStrain")];

/// Built-in single-cell master layout per style, one paragraph per line.
pub fn derive_builtin_master_lines(style: EnumOutputStyle) -> &'static [&'static str] {
    match style {
        EnumOutputStyle::Horizontal => &[
            "{{Label1.DescAndWeight}}",
            "{{Label1.ProductBrand}}",
            "{{Label1.Price}}",
            "{{Label1.Ratio}}",
            "{{Label1.Lineage}} {{Label1.ProductVendor}}",
            "{{Label1.ProductStrain}}",
            "{{Label1.DOH}}",
        ],
        EnumOutputStyle::Double => &[
            "{{Label1.DescAndWeight}}",
            "{{Label1.Price}}",
            "{{Label1.Ratio}}",
            "{{Label1.Lineage}} {{Label1.ProductVendor}}",
            "{{Label1.ProductStrain}}",
            "{{Label1.DOH}}",
        ],
        EnumOutputStyle::Mini => &[
            "{{Label1.DescAndWeight}}",
            "{{Label1.ProductBrand}}",
            "{{Label1.Price}}",
            "{{Label1.Ratio}}",
            "{{Label1.Lineage}}",
            "{{Label1.ProductStrain}}",
        ],
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RecordVocabulary

/// Semantic input columns resolved through [`TUP_COLUMN_ALIASES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumSourceColumn {
    Description,
    Brand,
    Price,
    Lineage,
    Ratio,
    Thc,
    Cbd,
    Strain,
    Weight,
    Units,
    WeightUnits,
    Vendor,
    ProductType,
    Doh,
}

/// Accepted column names per semantic column, matched case-insensitively.
pub const TUP_COLUMN_ALIASES: [(EnumSourceColumn, &[&str]); 14] = [
    (
        EnumSourceColumn::Description,
        &["Description", "Product Name*", "ProductName", "Product Name"],
    ),
    (
        EnumSourceColumn::Brand,
        &["ProductBrand", "Product Brand", "Brand"],
    ),
    (EnumSourceColumn::Price, &["Price", "Price*"]),
    (
        EnumSourceColumn::Lineage,
        &["Lineage", "Product Lineage"],
    ),
    (
        EnumSourceColumn::Ratio,
        &["Ratio", "Ratio_or_THC_CBD", "Potency"],
    ),
    (EnumSourceColumn::Thc, &["THC test result", "THC"]),
    (EnumSourceColumn::Cbd, &["CBD test result", "CBD"]),
    (
        EnumSourceColumn::Strain,
        &["ProductStrain", "Product Strain", "Strain"],
    ),
    (EnumSourceColumn::Weight, &["Weight", "Weight*"]),
    (EnumSourceColumn::Units, &["Units"]),
    (
        EnumSourceColumn::WeightUnits,
        &["WeightUnits", "Weight Units"],
    ),
    (
        EnumSourceColumn::Vendor,
        &["Vendor", "Vendor/Supplier*", "ProductVendor"],
    ),
    (
        EnumSourceColumn::ProductType,
        &["ProductType", "Product Type*", "Product Type"],
    ),
    (EnumSourceColumn::Doh, &["DOH", "DOH Compliant (Yes/No)"]),
];

/// Raw values treated as missing.
pub const TUP_NAN_LIKE_VALUES: [&str; 5] = ["nan", "none", "null", "n/a", "#n/a"];
/// Raw values that turn the date-of-harvest flag on.
pub const TUP_DOH_TRUTHY_VALUES: [&str; 6] = ["yes", "y", "true", "1", "x", "doh"];
/// Text shown for a set date-of-harvest flag.
pub const C_DOH_DISPLAY: &str = "DOH";

/// Product-type keywords in priority order; first hit wins, `Other` otherwise.
///
/// The first keyword of each entry is the category's own name.
pub const TUP_PRODUCT_CATEGORY_KEYWORDS: [(EnumProductCategory, &[&str]); 7] = [
    (
        EnumProductCategory::Paraphernalia,
        &[
            "paraphernalia",
            "accessor",
            "lighter",
            "grinder",
            "rolling paper",
            "pipe",
            "tray",
        ],
    ),
    (
        EnumProductCategory::PreRoll,
        &["pre-roll", "preroll", "pre roll", "blunt"],
    ),
    (
        EnumProductCategory::Flower,
        &["flower", "shake", "bud", "smalls"],
    ),
    (
        EnumProductCategory::Concentrate,
        &[
            "concentrate",
            "vape",
            "cartridge",
            "cart",
            "wax",
            "shatter",
            "rosin",
            "resin",
            "badder",
            "budder",
            "dab",
            "distillate",
            "kief",
            "hash",
        ],
    ),
    (
        EnumProductCategory::Tincture,
        &["tincture", "sublingual"],
    ),
    (
        EnumProductCategory::Topical,
        &["topical", "lotion", "balm", "salve", "capsule", "transdermal"],
    ),
    (
        EnumProductCategory::Edible,
        &[
            "edible",
            "gummy",
            "gummies",
            "chocolate",
            "beverage",
            "drink",
            "candy",
            "cookie",
            "baked",
        ],
    ),
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LineageVocabulary

/// Lineage keywords in priority order, matched on whole words of normalized text.
pub const TUP_LINEAGE_KEYWORDS: [(EnumLineageCategory, &[&str]); 8] = [
    (EnumLineageCategory::Paraphernalia, &["PARAPHERNALIA"]),
    (
        EnumLineageCategory::HybridIndica,
        &[
            "HYBRID/INDICA",
            "HYBRID INDICA",
            "INDICA HYBRID",
            "INDICA DOMINANT",
        ],
    ),
    (
        EnumLineageCategory::HybridSativa,
        &[
            "HYBRID/SATIVA",
            "HYBRID SATIVA",
            "SATIVA HYBRID",
            "SATIVA DOMINANT",
        ],
    ),
    (EnumLineageCategory::Sativa, &["SATIVA"]),
    (EnumLineageCategory::Indica, &["INDICA"]),
    (EnumLineageCategory::Hybrid, &["HYBRID"]),
    (EnumLineageCategory::CbdBlend, &["CBD BLEND", "CBD"]),
    (EnumLineageCategory::Mixed, &["MIXED"]),
];

/// Background color of a lineage category.
pub fn derive_lineage_color(category: EnumLineageCategory) -> &'static str {
    match category {
        EnumLineageCategory::Sativa => "ED4123",
        EnumLineageCategory::Indica => "9900FF",
        EnumLineageCategory::Hybrid => "009900",
        EnumLineageCategory::HybridIndica => "7A3FB8",
        EnumLineageCategory::HybridSativa => "F27A1A",
        EnumLineageCategory::CbdBlend => "F1C232",
        EnumLineageCategory::Mixed => "0021F5",
        EnumLineageCategory::Paraphernalia => "FFC0CB",
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GeometryPresets

/// Cell padding on each horizontal side.
pub const N_CELL_PADDING_TWIPS: u32 = 108;

/// Rows × columns = cells for `style`.
pub fn derive_grid_geometry(style: EnumOutputStyle) -> SpecGridGeometry {
    let (n_rows, n_cols) = match style {
        EnumOutputStyle::Horizontal => (3, 3),
        EnumOutputStyle::Double => (4, 3),
        EnumOutputStyle::Mini => (4, 5),
    };
    SpecGridGeometry {
        n_rows,
        n_cols,
        n_cells: n_rows * n_cols,
    }
}

/// Physical cell size and page setup for `style`.
pub fn derive_sheet_dimension(style: EnumOutputStyle) -> SpecSheetDimension {
    let (width_in, height_in, margin_in, if_landscape) = match style {
        EnumOutputStyle::Horizontal => (3.4, 2.4, 0.4, true),
        EnumOutputStyle::Double => (2.4, 2.4, 0.5, false),
        EnumOutputStyle::Mini => (1.5, 2.4, 0.4, false),
    };
    let n_margin = convert_inches_to_twips(margin_in);
    let (n_page_width, n_page_height) = if if_landscape {
        (
            labelkit_io_docx::N_PAGE_LETTER_HEIGHT_TWIPS,
            labelkit_io_docx::N_PAGE_LETTER_WIDTH_TWIPS,
        )
    } else {
        (
            labelkit_io_docx::N_PAGE_LETTER_WIDTH_TWIPS,
            labelkit_io_docx::N_PAGE_LETTER_HEIGHT_TWIPS,
        )
    };
    SpecSheetDimension {
        cell_width_twips: convert_inches_to_twips(width_in),
        cell_height_twips: convert_inches_to_twips(height_in),
        cell_padding_twips: N_CELL_PADDING_TWIPS,
        page: SpecPageSetup {
            width_twips: n_page_width,
            height_twips: n_page_height,
            margin_top_twips: n_margin,
            margin_bottom_twips: n_margin,
            margin_left_twips: n_margin,
            margin_right_twips: n_margin,
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TypographyPresets

/// Size used when a scheme has no settings for a style.
pub const N_FONT_SIZE_FALLBACK: f32 = 10.0;
/// Smallest size produced by style scaling.
pub const N_FONT_SIZE_MIN: f32 = 6.0;
/// Foreground of lineage-painted cells.
pub const C_FONT_COLOR_PAINTED: &str = "FFFFFF";

const N_MAX: usize = usize::MAX;

/// Base (horizontal) ladders: `(field, category override, [(complexity_max, size_pt)])`.
const TUP_BASE_SIZE_LADDERS: [(EnumLabelField, Option<EnumProductCategory>, &[(usize, f32)]); 16] = [
    (
        EnumLabelField::Description,
        None,
        &[(16, 28.0), (28, 24.0), (40, 20.0), (56, 18.0), (72, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Brand,
        None,
        &[(10, 20.0), (18, 18.0), (28, 14.0), (N_MAX, 12.0)],
    ),
    (
        EnumLabelField::Price,
        None,
        &[(4, 36.0), (6, 32.0), (8, 28.0), (N_MAX, 24.0)],
    ),
    (
        EnumLabelField::Lineage,
        None,
        &[(8, 20.0), (14, 18.0), (22, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Ratio,
        None,
        &[(10, 18.0), (16, 16.0), (24, 14.0), (36, 12.0), (N_MAX, 10.0)],
    ),
    (
        EnumLabelField::Strain,
        None,
        &[(12, 14.0), (20, 12.0), (N_MAX, 10.0)],
    ),
    (
        EnumLabelField::Weight,
        None,
        &[(6, 18.0), (12, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Vendor,
        None,
        &[(12, 11.0), (20, 10.0), (N_MAX, 9.0)],
    ),
    (EnumLabelField::Doh, None, &[(N_MAX, 12.0)]),
    (
        EnumLabelField::Brand,
        Some(EnumProductCategory::Edible),
        &[(10, 24.0), (18, 20.0), (28, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Brand,
        Some(EnumProductCategory::Tincture),
        &[(10, 24.0), (18, 20.0), (28, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Brand,
        Some(EnumProductCategory::Topical),
        &[(10, 24.0), (18, 20.0), (28, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Brand,
        Some(EnumProductCategory::Paraphernalia),
        &[(10, 24.0), (18, 20.0), (28, 16.0), (N_MAX, 14.0)],
    ),
    (
        EnumLabelField::Strain,
        Some(EnumProductCategory::Edible),
        &[(12, 12.0), (20, 11.0), (N_MAX, 9.0)],
    ),
    (
        EnumLabelField::Strain,
        Some(EnumProductCategory::Tincture),
        &[(12, 12.0), (20, 11.0), (N_MAX, 9.0)],
    ),
    (
        EnumLabelField::Strain,
        Some(EnumProductCategory::Topical),
        &[(12, 12.0), (20, 11.0), (N_MAX, 9.0)],
    ),
];

/// Scale applied to the base ladders per style.
pub fn derive_style_size_scale(style: EnumOutputStyle) -> f32 {
    match style {
        EnumOutputStyle::Horizontal => 1.0,
        EnumOutputStyle::Double => 0.85,
        EnumOutputStyle::Mini => 0.7,
    }
}

/// Scale `size_pt` and round to the nearest half point, floored at [`N_FONT_SIZE_MIN`].
pub fn scale_font_size(size_pt: f32, scale: f32) -> f32 {
    f32::max(N_FONT_SIZE_MIN, (size_pt * scale * 2.0).round() / 2.0)
}

/// Default per-style settings.
pub fn derive_default_style_typography(style: EnumOutputStyle) -> SpecStyleTypography {
    let (size_default, n_chars_lineage_vendor_max) = match style {
        EnumOutputStyle::Horizontal => (12.0, 30),
        EnumOutputStyle::Double => (10.0, 22),
        EnumOutputStyle::Mini => (8.0, 16),
    };
    SpecStyleTypography {
        size_default,
        n_chars_lineage_vendor_max,
    }
}

/// Build the default typography scheme for every style.
pub fn derive_default_typography_scheme() -> SpecTypographyScheme {
    let mut dict_styles = BTreeMap::new();
    let mut l_size_rules = Vec::new();
    for style in EnumOutputStyle::ALL {
        dict_styles.insert(style, derive_default_style_typography(style));
        let scale = derive_style_size_scale(style);
        for (field, category, l_ladder) in TUP_BASE_SIZE_LADDERS {
            l_size_rules.push(SpecFontSizeRule {
                style,
                field,
                category,
                buckets: l_ladder
                    .iter()
                    .map(|(complexity_max, size_pt)| SpecSizeBucket {
                        complexity_max: *complexity_max,
                        size_pt: scale_font_size(*size_pt, scale),
                    })
                    .collect(),
            });
        }
    }

    SpecTypographyScheme {
        font_name: labelkit_io_docx::C_FONT_NAME_DEFAULT.to_string(),
        font_color_painted: C_FONT_COLOR_PAINTED.to_string(),
        line_spacing_default: 0.9,
        line_spacing_potency: 1.15,
        indent_lineage_twips: 72,
        n_len_long_word: 10,
        n_complexity_per_extra_line: 4,
        dict_styles,
        l_size_rules,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
