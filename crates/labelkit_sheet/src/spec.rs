//! Shared label-sheet specification models, options and errors.

use std::collections::BTreeMap;

use labelkit_io_docx::{DocxIoError, SpecPageSetup};
use serde::{Deserialize, Serialize};

use crate::conf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Output style selecting the sheet geometry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnumOutputStyle {
    /// 3 rows × 3 columns, 9 cells, landscape sheet.
    #[default]
    Horizontal,
    /// 4 rows × 3 columns, 12 cells.
    Double,
    /// 4 rows × 5 columns, 20 cells.
    Mini,
}

impl EnumOutputStyle {
    /// Every supported style.
    pub const ALL: [EnumOutputStyle; 3] = [Self::Horizontal, Self::Double, Self::Mini];

    /// Selector name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Double => "double",
            Self::Mini => "mini",
        }
    }

    /// Parse a selector name (`horizontal`/`double`/`mini`) or grid shape (`3x3`/`4x3`/`4x5`).
    pub fn parse(selector: &str) -> Result<Self, LabelError> {
        match selector.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "3x3" | "9" => Ok(Self::Horizontal),
            "double" | "4x3" | "12" => Ok(Self::Double),
            "mini" | "4x5" | "20" => Ok(Self::Mini),
            other => Err(LabelError::Configuration(format!(
                "Unknown output style: {other:?}"
            ))),
        }
    }

    /// Grid geometry of this style.
    pub fn geometry(&self) -> SpecGridGeometry {
        conf::derive_grid_geometry(*self)
    }

    /// Physical cell and page dimensions of this style.
    pub fn dimension(&self) -> SpecSheetDimension {
        conf::derive_sheet_dimension(*self)
    }
}

/// Closed marker vocabulary: the semantic fields whose identity survives rendering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnumLabelField {
    /// Description (alone or combined with weight).
    Description,
    /// Product brand.
    Brand,
    /// Display price.
    Price,
    /// Lineage, or the brand standing in for it.
    Lineage,
    /// Potency / cannabinoid ratio.
    Ratio,
    /// Strain name.
    Strain,
    /// Display weight.
    Weight,
    /// Vendor name.
    Vendor,
    /// Date-of-harvest flag.
    Doh,
}

impl EnumLabelField {
    /// Every field of the vocabulary.
    pub const ALL: [EnumLabelField; 9] = [
        Self::Description,
        Self::Brand,
        Self::Price,
        Self::Lineage,
        Self::Ratio,
        Self::Strain,
        Self::Weight,
        Self::Vendor,
        Self::Doh,
    ];

    /// Upper-case tag used to build sentinel tokens.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Description => "DESC",
            Self::Brand => "BRAND",
            Self::Price => "PRICE",
            Self::Lineage => "LINEAGE",
            Self::Ratio => "RATIO",
            Self::Strain => "STRAIN",
            Self::Weight => "WEIGHT",
            Self::Vendor => "VENDOR",
            Self::Doh => "DOH",
        }
    }
}

/// Product classification bucket gating optional fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnumProductCategory {
    /// Loose flower.
    Flower,
    /// Pre-rolls, single or multi-pack.
    PreRoll,
    /// Concentrates and vape cartridges.
    Concentrate,
    /// Edibles and beverages.
    Edible,
    /// Tinctures.
    Tincture,
    /// Topicals and capsules.
    Topical,
    /// Accessories.
    Paraphernalia,
    /// Anything unclassified.
    #[default]
    Other,
}

impl EnumProductCategory {
    /// Potency is reported in percent.
    pub fn is_percentage_potency(&self) -> bool {
        matches!(
            self,
            Self::Flower | Self::PreRoll | Self::Concentrate | Self::Other
        )
    }

    /// Potency is reported in milligrams.
    pub fn is_milligram_potency(&self) -> bool {
        matches!(self, Self::Edible | Self::Tincture | Self::Topical)
    }
}

/// Canonical lineage categories used for cell coloring.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnumLineageCategory {
    /// Sativa.
    Sativa,
    /// Indica.
    Indica,
    /// Hybrid.
    Hybrid,
    /// Indica-leaning hybrid.
    HybridIndica,
    /// Sativa-leaning hybrid.
    HybridSativa,
    /// CBD blend.
    CbdBlend,
    /// Mixed.
    Mixed,
    /// Paraphernalia.
    Paraphernalia,
}

impl EnumLineageCategory {
    /// Canonical display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sativa => "SATIVA",
            Self::Indica => "INDICA",
            Self::Hybrid => "HYBRID",
            Self::HybridIndica => "HYBRID/INDICA",
            Self::HybridSativa => "HYBRID/SATIVA",
            Self::CbdBlend => "CBD",
            Self::Mixed => "MIXED",
            Self::Paraphernalia => "PARAPHERNALIA",
        }
    }

    /// Background color as `RRGGBB` hex.
    pub fn color(&self) -> &'static str {
        conf::derive_lineage_color(*self)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GeometrySpecification

/// Grid shape: rows × columns = cells-per-sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecGridGeometry {
    /// Row count.
    pub n_rows: usize,
    /// Column count.
    pub n_cols: usize,
    /// Cells per sheet.
    pub n_cells: usize,
}

impl SpecGridGeometry {
    /// Build a validated geometry.
    pub fn new(n_rows: usize, n_cols: usize, n_cells: usize) -> Result<Self, LabelError> {
        let geometry = Self {
            n_rows,
            n_cols,
            n_cells,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Check `rows × columns == cells` and non-empty.
    pub fn validate(&self) -> Result<(), LabelError> {
        if self.n_rows == 0 || self.n_cols == 0 {
            return Err(LabelError::Configuration(format!(
                "Grid geometry must be non-empty: {}x{}",
                self.n_rows, self.n_cols
            )));
        }
        if self.n_rows * self.n_cols != self.n_cells {
            return Err(LabelError::Configuration(format!(
                "Grid geometry is inconsistent: {}x{} != {} cells",
                self.n_rows, self.n_cols, self.n_cells
            )));
        }
        Ok(())
    }
}

/// Physical sizes for one style, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSheetDimension {
    /// Fixed column width.
    pub cell_width_twips: u32,
    /// Exact row height.
    pub cell_height_twips: u32,
    /// Horizontal cell padding on each side.
    pub cell_padding_twips: u32,
    /// Page size and margins.
    pub page: SpecPageSetup,
}

impl SpecSheetDimension {
    /// Usable text width inside one cell.
    pub fn cell_inner_width_twips(&self) -> u32 {
        self.cell_width_twips
            .saturating_sub(2 * self.cell_padding_twips)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RecordAndContext

/// Raw record value as handed over by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumRecordValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

/// One input record: field name to raw value. Read-only during context building.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRecord {
    /// Raw fields keyed by source column name.
    pub dict_fields: BTreeMap<String, EnumRecordValue>,
}

impl SpecRecord {
    /// Build a record from `(name, text)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            dict_fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), EnumRecordValue::String(v.into())))
                .collect(),
        }
    }

    /// Set one field, returning the record.
    pub fn with_value(mut self, name: impl Into<String>, value: EnumRecordValue) -> Self {
        self.dict_fields.insert(name.into(), value);
        self
    }
}

/// Display-ready per-record context consumed by template rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecLabelContext {
    /// Position of the source record in the batch.
    pub idx_record: usize,
    /// Product classification.
    pub category: EnumProductCategory,
    /// Final display text per semantic field, before wrapping.
    pub dict_values: BTreeMap<EnumLabelField, String>,
    /// Template variable name to marker-wrapped value.
    pub dict_template: BTreeMap<String, String>,
    /// Non-fatal data problems found while building.
    pub l_issues: Vec<String>,
    /// Record lineage when the lineage slot displays something else (the
    /// brand of milligram products); cell coloring classifies this instead.
    pub lineage_source: Option<String>,
}

impl SpecLabelContext {
    /// Display text of `field`; empty when absent.
    pub fn value(&self, field: EnumLabelField) -> &str {
        self.dict_values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Marker-wrapped template value for a placeholder key.
    pub fn template_value(&self, key: &str) -> Option<&str> {
        self.dict_template.get(key).map(String::as_str)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TypographySpecification

/// One complexity bucket: content up to `complexity_max` renders at `size_pt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecSizeBucket {
    /// Inclusive upper complexity bound.
    pub complexity_max: usize,
    /// Point size.
    pub size_pt: f32,
}

/// Size ladder for one (style, field[, category]) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecFontSizeRule {
    /// Output style.
    pub style: EnumOutputStyle,
    /// Field the ladder applies to.
    pub field: EnumLabelField,
    /// Product category override; `None` is the general rule.
    #[serde(default)]
    pub category: Option<EnumProductCategory>,
    /// Buckets in ascending `complexity_max` order.
    pub buckets: Vec<SpecSizeBucket>,
}

/// Per-style typography settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecStyleTypography {
    /// Size for literal text and for unmatched buckets.
    pub size_default: f32,
    /// Character budget of a combined lineage+vendor line.
    pub n_chars_lineage_vendor_max: usize,
}

/// Typography configuration passed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecTypographyScheme {
    /// Typeface forced on every styled field.
    pub font_name: String,
    /// Foreground used on lineage-painted cells.
    pub font_color_painted: String,
    /// Line spacing of styled non-potency paragraphs.
    pub line_spacing_default: f32,
    /// Line spacing of potency paragraphs.
    pub line_spacing_potency: f32,
    /// Left indent of canonical lineage paragraphs.
    pub indent_lineage_twips: i32,
    /// Word length above which each extra character adds complexity.
    pub n_len_long_word: usize,
    /// Complexity added per extra line.
    pub n_complexity_per_extra_line: usize,
    /// Per-style settings.
    pub dict_styles: BTreeMap<EnumOutputStyle, SpecStyleTypography>,
    /// Size ladders.
    pub l_size_rules: Vec<SpecFontSizeRule>,
}

impl Default for SpecTypographyScheme {
    fn default() -> Self {
        conf::derive_default_typography_scheme()
    }
}

impl SpecTypographyScheme {
    /// Parse a scheme from JSON and validate it.
    pub fn from_json_str(txt: &str) -> Result<Self, LabelError> {
        let scheme: SpecTypographyScheme = serde_json::from_str(txt)?;
        scheme.validate()?;
        Ok(scheme)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, LabelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ladders are ascending in complexity, non-increasing in size, and unique per key.
    pub fn validate(&self) -> Result<(), LabelError> {
        if self.line_spacing_default <= 0.0 || self.line_spacing_potency <= 0.0 {
            return Err(LabelError::Configuration(
                "Line spacing multipliers must be positive.".to_string(),
            ));
        }
        for style in EnumOutputStyle::ALL {
            let Some(cfg_style) = self.dict_styles.get(&style) else {
                return Err(LabelError::Configuration(format!(
                    "Missing typography settings for style {:?}",
                    style.name()
                )));
            };
            if cfg_style.size_default <= 0.0 {
                return Err(LabelError::Configuration(format!(
                    "Default size for style {:?} must be positive.",
                    style.name()
                )));
            }
        }

        let mut set_keys = std::collections::BTreeSet::new();
        for rule in &self.l_size_rules {
            let c_key = format!(
                "{}/{:?}/{:?}",
                rule.style.name(),
                rule.field,
                rule.category
            );
            if !set_keys.insert((rule.style, rule.field, rule.category)) {
                return Err(LabelError::Configuration(format!(
                    "Duplicate size rule: {c_key}"
                )));
            }
            if rule.buckets.is_empty() {
                return Err(LabelError::Configuration(format!(
                    "Size rule has no buckets: {c_key}"
                )));
            }
            for pair in rule.buckets.windows(2) {
                if pair[1].complexity_max <= pair[0].complexity_max {
                    return Err(LabelError::Configuration(format!(
                        "Size buckets must ascend in complexity: {c_key}"
                    )));
                }
                if pair[1].size_pt > pair[0].size_pt {
                    return Err(LabelError::Configuration(format!(
                        "Size buckets must not grow with complexity: {c_key}"
                    )));
                }
            }
            if rule.buckets.iter().any(|bucket| bucket.size_pt <= 0.0) {
                return Err(LabelError::Configuration(format!(
                    "Size buckets must be positive: {c_key}"
                )));
            }
        }
        Ok(())
    }

    /// Literal-text/fallback size for `style`.
    pub fn size_default(&self, style: EnumOutputStyle) -> f32 {
        self.dict_styles
            .get(&style)
            .map(|cfg| cfg.size_default)
            .unwrap_or(conf::N_FONT_SIZE_FALLBACK)
    }

    /// Lineage+vendor character budget for `style`.
    pub fn n_chars_lineage_vendor_max(&self, style: EnumOutputStyle) -> usize {
        self.dict_styles
            .get(&style)
            .map(|cfg| cfg.n_chars_lineage_vendor_max)
            .unwrap_or(usize::MAX)
    }

    /// Look up a size; category overrides win over the general rule.
    ///
    /// `None` when no rule or bucket matches.
    pub fn lookup_font_size(
        &self,
        field: EnumLabelField,
        style: EnumOutputStyle,
        category: Option<EnumProductCategory>,
        complexity: usize,
    ) -> Option<f32> {
        let rule_override = category.and_then(|cat| {
            self.l_size_rules.iter().find(|rule| {
                rule.style == style && rule.field == field && rule.category == Some(cat)
            })
        });
        let rule = rule_override.or_else(|| {
            self.l_size_rules.iter().find(|rule| {
                rule.style == style && rule.field == field && rule.category.is_none()
            })
        })?;

        rule.buckets
            .iter()
            .find(|bucket| complexity <= bucket.complexity_max)
            .map(|bucket| bucket.size_pt)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RenderOptions

/// Wall-clock budget; `None` disables the corresponding check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecRenderBudget {
    /// Whole-batch budget in milliseconds.
    #[serde(default)]
    pub timeout_total_ms: Option<u64>,
    /// Per-chunk budget in milliseconds.
    #[serde(default)]
    pub timeout_chunk_ms: Option<u64>,
}

/// Renderer-wide options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecRenderOptions {
    /// Output style.
    pub style: EnumOutputStyle,
    /// Wall-clock budget.
    #[serde(default)]
    pub budget: SpecRenderBudget,
}

impl SpecRenderOptions {
    /// Parse options from JSON.
    pub fn from_json_str(txt: &str) -> Result<Self, LabelError> {
        Ok(serde_json::from_str(txt)?)
    }
}

/// Per-chunk pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumRenderStage {
    /// Template substitution (mandatory).
    Render,
    /// Marker-driven sizing and layout (cosmetic).
    Typography,
    /// Lineage cell painting (cosmetic).
    Color,
    /// Residual sentinel removal (mandatory).
    Scrub,
}

impl EnumRenderStage {
    /// Whether the stage may be skipped once the budget is exhausted.
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Self::Typography | Self::Color)
    }
}

/// Outcome tag of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumChunkStatus {
    /// Every stage ran.
    Completed,
    /// Budget ran out; stages from `stage_skipped_first` on (cosmetic ones) were skipped.
    Partial {
        /// First skipped stage.
        stage_skipped_first: EnumRenderStage,
    },
    /// Chunk produced no content.
    Failed {
        /// Failure text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Label pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// Bad geometry, master template or scheme. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Malformed placeholder in a rendered chunk.
    #[error("template error: {0}")]
    Template(String),
    /// Tabular input could not be converted into records.
    #[error("ingest error: {0}")]
    Ingest(String),
    /// Nothing to render.
    #[error("no records to render")]
    EmptyBatch,
    /// Every chunk failed.
    #[error("no document produced: all {n_chunks} chunks failed")]
    NoDocumentProduced {
        /// Number of attempted chunks.
        n_chunks: usize,
    },
    /// Document package IO failure.
    #[error(transparent)]
    Docx(#[from] DocxIoError),
    /// Scheme/options JSON failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_style_parse_accepts_names_and_shapes() {
        assert_eq!(
            EnumOutputStyle::parse("Horizontal").unwrap(),
            EnumOutputStyle::Horizontal
        );
        assert_eq!(EnumOutputStyle::parse("4x3").unwrap(), EnumOutputStyle::Double);
        assert_eq!(EnumOutputStyle::parse(" mini ").unwrap(), EnumOutputStyle::Mini);
        assert!(matches!(
            EnumOutputStyle::parse("vertical"),
            Err(LabelError::Configuration(_))
        ));
    }

    #[test]
    fn test_grid_geometry_rejects_inconsistent_shapes() {
        assert!(SpecGridGeometry::new(3, 3, 9).is_ok());
        assert!(SpecGridGeometry::new(3, 3, 10).is_err());
        assert!(SpecGridGeometry::new(0, 3, 0).is_err());
    }

    #[test]
    fn test_lookup_font_size_prefers_category_override() {
        let scheme = SpecTypographyScheme::default();
        let size_general = scheme.lookup_font_size(
            EnumLabelField::Brand,
            EnumOutputStyle::Horizontal,
            Some(EnumProductCategory::Flower),
            4,
        );
        let size_edible = scheme.lookup_font_size(
            EnumLabelField::Brand,
            EnumOutputStyle::Horizontal,
            Some(EnumProductCategory::Edible),
            4,
        );
        assert_eq!(size_general, Some(20.0));
        assert_eq!(size_edible, Some(24.0));
    }

    #[test]
    fn test_typography_scheme_json_roundtrip_and_validation() {
        let scheme = SpecTypographyScheme::default();
        let txt = scheme.to_json_string().unwrap();
        assert_eq!(SpecTypographyScheme::from_json_str(&txt).unwrap(), scheme);

        let mut scheme_dup = scheme.clone();
        let rule = scheme_dup.l_size_rules[0].clone();
        scheme_dup.l_size_rules.push(rule);
        assert!(matches!(
            scheme_dup.validate(),
            Err(LabelError::Configuration(_))
        ));

        let mut scheme_growing = scheme;
        scheme_growing.l_size_rules[0].buckets[1].size_pt = 99.0;
        assert!(scheme_growing.validate().is_err());
    }

    #[test]
    fn test_render_options_from_json() {
        let options = SpecRenderOptions::from_json_str(
            r#"{"style": "mini", "budget": {"timeout_chunk_ms": 250}}"#,
        )
        .unwrap();
        assert_eq!(options.style, EnumOutputStyle::Mini);
        assert_eq!(options.budget.timeout_chunk_ms, Some(250));
        assert_eq!(options.budget.timeout_total_ms, None);
    }
}
