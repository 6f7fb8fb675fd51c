//! Context builder: one raw record into a display-ready, marker-wrapped label context.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

use crate::conf::{
    C_DESC_WEIGHT_JOIN, C_DOH_DISPLAY, C_LINE_BREAK_TOKEN, C_NBSP, EnumSourceColumn,
    TUP_COLUMN_ALIASES, TUP_DOH_TRUTHY_VALUES, TUP_NAN_LIKE_VALUES,
    TUP_PRODUCT_CATEGORY_KEYWORDS, TUP_TEMPLATE_KEYS,
};
use crate::lineage::{canonicalize_lineage_text, classify_lineage_text};
use crate::marker::{strip_marker_tokens, wrap};
use crate::spec::{
    EnumLabelField, EnumLineageCategory, EnumProductCategory, EnumRecordValue, SpecLabelContext,
    SpecRecord,
};
use crate::util::{
    collapse_whitespace, compile_static_regex, contains_keyword_word, format_number_compact,
};

static RE_POTENCY_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?i)\b(THCA|THC|CBDA|CBD|CBG|CBN|TAC)\s*:?\s*(\d+(?:\.\d+)?)\s*%",
        "percentage potency",
    )
});
static RE_POTENCY_MILLIGRAM: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?i)(?:(\d+(?:\.\d+)?)\s*mg\s*(THCA|THC|CBDA|CBD|CBG|CBN|TAC)\b|\b(THCA|THC|CBDA|CBD|CBG|CBN|TAC)\s*:?\s*(\d+(?:\.\d+)?)\s*mg\b)",
        "milligram potency",
    )
});
static RE_CANNABINOID_NAME: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)\b(THCA|THC|CBDA|CBD|CBG|CBN|TAC)\b", "cannabinoid name")
});
static RE_PACK_NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?i)\b(\d+(?:\.\d+)?)\s*(g|mg|oz)\s*x\s*(\d+)\s*(?:pack|pk)\b",
        "pack notation",
    )
});

////////////////////////////////////////////////////////////////////////////////
// #region FieldNormalization

/// Trim and normalize one raw value.
///
/// NaN-like text becomes empty, whitespace (newlines included) collapses,
/// and sentinel and soft-break tokens are stripped.
pub fn normalize_record_value(value: &EnumRecordValue) -> String {
    let c_raw = match value {
        EnumRecordValue::None => return String::new(),
        EnumRecordValue::Number(n) => return format_number_compact(*n),
        EnumRecordValue::String(s) => s,
    };
    let c_txt = collapse_whitespace(&strip_marker_tokens(&c_raw.replace(C_LINE_BREAK_TOKEN, " ")));
    if TUP_NAN_LIKE_VALUES.contains(&c_txt.to_ascii_lowercase().as_str()) {
        return String::new();
    }
    c_txt
}

/// First non-empty normalized value among the aliases of `column`.
pub fn lookup_record_text(record: &SpecRecord, column: EnumSourceColumn) -> String {
    lookup_record_value(record, column)
        .map(normalize_record_value)
        .find(|c_txt| !c_txt.is_empty())
        .unwrap_or_default()
}

fn lookup_record_value(
    record: &SpecRecord,
    column: EnumSourceColumn,
) -> impl Iterator<Item = &EnumRecordValue> {
    let l_aliases: &[&str] = TUP_COLUMN_ALIASES
        .iter()
        .find(|(col, _)| *col == column)
        .map(|(_, l_aliases)| *l_aliases)
        .unwrap_or(&[]);
    l_aliases.iter().flat_map(move |alias| {
        record
            .dict_fields
            .iter()
            .filter(move |(c_name, _)| c_name.trim().eq_ignore_ascii_case(alias))
            .map(|(_, value)| value)
    })
}

fn lookup_record_number(record: &SpecRecord, column: EnumSourceColumn) -> Option<f64> {
    lookup_record_value(record, column).find_map(|value| match value {
        EnumRecordValue::Number(n) if n.is_finite() => Some(*n),
        EnumRecordValue::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Classification

fn contains_category_keyword(text: &str, keyword: &str) -> bool {
    contains_keyword_word(text, keyword)
        || contains_keyword_word(text, &format!("{keyword}s"))
        || contains_keyword_word(text, &format!("{keyword}es"))
}

/// Product category from the product-type text.
///
/// A category's own name (first keyword of its entry) wins over the looser
/// hints; within each pass the table priority applies. Keywords match whole
/// words, plurals included.
pub fn classify_product_category(product_type: &str) -> EnumProductCategory {
    let c_lower = product_type.to_lowercase();
    if c_lower.is_empty() {
        return EnumProductCategory::Other;
    }
    let category_named = TUP_PRODUCT_CATEGORY_KEYWORDS
        .iter()
        .find(|(_, l_keywords)| {
            l_keywords
                .first()
                .is_some_and(|kw| contains_category_keyword(&c_lower, kw))
        });
    category_named
        .or_else(|| {
            TUP_PRODUCT_CATEGORY_KEYWORDS.iter().find(|(_, l_keywords)| {
                l_keywords
                    .iter()
                    .any(|kw| contains_category_keyword(&c_lower, kw))
            })
        })
        .map(|(category, _)| *category)
        .unwrap_or(EnumProductCategory::Other)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FieldComposition

/// Compose potency text, one cannabinoid per line joined by soft breaks.
///
/// Percentage pairs and milligram amounts are split per line. Without ratio
/// text the separate THC/CBD numbers are used. Anything else passes through.
pub fn compose_potency(
    ratio: &str,
    thc: Option<f64>,
    cbd: Option<f64>,
    category: EnumProductCategory,
) -> String {
    if RE_POTENCY_PERCENT.is_match(ratio) {
        return derive_cannabinoid_segments(ratio).join(C_LINE_BREAK_TOKEN);
    }

    let l_milligram: Vec<String> = RE_POTENCY_MILLIGRAM
        .captures_iter(ratio)
        .filter_map(|caps| {
            let m_amount = caps.get(1).or_else(|| caps.get(4))?;
            let m_name = caps.get(2).or_else(|| caps.get(3))?;
            Some(format!(
                "{}mg {}",
                m_amount.as_str(),
                m_name.as_str().to_uppercase()
            ))
        })
        .collect();
    if !l_milligram.is_empty() {
        return l_milligram.join(C_LINE_BREAK_TOKEN);
    }

    if !ratio.is_empty() {
        return ratio.to_string();
    }

    let c_unit = if category.is_milligram_potency() {
        "mg"
    } else {
        "%"
    };
    [("THC", thc), ("CBD", cbd)]
        .into_iter()
        .filter_map(|(c_name, value)| {
            value.map(|n| {
                if c_unit == "%" {
                    format!("{c_name}: {}%", format_number_compact(n))
                } else {
                    format!("{}mg {c_name}", format_number_compact(n))
                }
            })
        })
        .collect::<Vec<_>>()
        .join(C_LINE_BREAK_TOKEN)
}

/// Split percentage potency text into one line per cannabinoid name.
///
/// `NAME: N%` segments are normalized; others (`CBD: <1%`, `CBD: ND`) keep
/// their value text so no cannabinoid is dropped.
fn derive_cannabinoid_segments(ratio: &str) -> Vec<String> {
    let l_starts: Vec<usize> = RE_CANNABINOID_NAME
        .find_iter(ratio)
        .map(|m| m.start())
        .collect();
    l_starts
        .iter()
        .enumerate()
        .filter_map(|(idx, &n_start)| {
            let n_end = l_starts.get(idx + 1).copied().unwrap_or(ratio.len());
            let c_segment = ratio[n_start..n_end].trim_end_matches([' ', ',', ';', '/', '|']);
            if let Some(caps) = RE_POTENCY_PERCENT.captures(c_segment) {
                if caps.get(0).is_some_and(|m| m.start() == 0) {
                    return Some(format!("{}: {}%", caps[1].to_uppercase(), &caps[2]));
                }
            }
            let m_name = RE_CANNABINOID_NAME.find(c_segment)?;
            let c_rest = collapse_whitespace(c_segment[m_name.end()..].trim_start_matches([' ', ':']));
            if c_rest.is_empty() {
                return None;
            }
            Some(format!("{}: {c_rest}", m_name.as_str().to_uppercase()))
        })
        .collect()
}

/// Normalize `Ng x M Pack` notation; `M == 1` collapses to `Ng`.
pub fn normalize_pack_notation(text: &str) -> String {
    RE_PACK_NOTATION
        .replace_all(text, |caps: &Captures| {
            let c_amount = &caps[1];
            let c_unit = caps[2].to_lowercase();
            match caps[3].parse::<u32>() {
                Ok(1) => format!("{c_amount}{c_unit}"),
                _ => format!("{c_amount}{c_unit} x {} Pack", &caps[3]),
            }
        })
        .into_owned()
}

/// Compose the display weight from the combined or split weight columns.
pub fn compose_weight(weight_units: &str, weight: &str, units: &str) -> String {
    let c_raw = if !weight_units.is_empty() {
        weight_units.to_string()
    } else if !weight.is_empty() {
        let c_unit = units.trim();
        if weight.chars().last().is_some_and(|ch| ch.is_ascii_digit()) {
            format!("{weight}{c_unit}")
        } else {
            weight.to_string()
        }
    } else {
        String::new()
    };
    normalize_pack_notation(&c_raw)
}

/// Normalize pack notation and drop a trailing copy of the weight.
pub fn compose_description(description: &str, weight: &str) -> String {
    let c_desc = normalize_pack_notation(description);
    if weight.is_empty() {
        return c_desc;
    }
    let c_lower = c_desc.to_lowercase();
    let c_weight_lower = weight.to_lowercase();
    if c_lower.len() > c_weight_lower.len() && c_lower.ends_with(&c_weight_lower) {
        let n_cut = c_desc.len() - weight.len();
        if c_desc.is_char_boundary(n_cut) {
            return c_desc[..n_cut]
                .trim_end_matches([' ', '-', '\u{a0}'])
                .to_string();
        }
    }
    c_desc
}

/// `desc -<NBSP>weight`, with weight spaces made non-breaking.
pub fn compose_desc_and_weight(description: &str, weight: &str) -> String {
    match (description.is_empty(), weight.is_empty()) {
        (_, true) => description.to_string(),
        (true, false) => weight.replace(' ', C_NBSP),
        (false, false) => format!(
            "{description}{C_DESC_WEIGHT_JOIN}{}",
            weight.replace(' ', C_NBSP)
        ),
    }
}

/// Format a price as `$25` or `$25.99`; unparsable text is kept.
pub fn format_price(price: &str) -> String {
    let c_digits = price.trim().trim_start_matches('$').replace(',', "");
    match c_digits.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 => format!("${}", n as i64),
        Ok(n) if n.is_finite() => format!("${n:.2}"),
        _ => price.to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ContextBuilder

/// Build the label context of record `idx_record`.
///
/// Missing description or price is recorded as an issue and never raised.
pub fn build_label_context(idx_record: usize, record: &SpecRecord) -> SpecLabelContext {
    let category =
        classify_product_category(&lookup_record_text(record, EnumSourceColumn::ProductType));
    let mut l_issues = Vec::new();

    let c_weight = compose_weight(
        &lookup_record_text(record, EnumSourceColumn::WeightUnits),
        &lookup_record_text(record, EnumSourceColumn::Weight),
        &lookup_record_text(record, EnumSourceColumn::Units),
    );
    let c_description = compose_description(
        &lookup_record_text(record, EnumSourceColumn::Description),
        &c_weight,
    );
    let c_price_raw = lookup_record_text(record, EnumSourceColumn::Price);
    let c_brand = lookup_record_text(record, EnumSourceColumn::Brand);
    let c_lineage_raw = lookup_record_text(record, EnumSourceColumn::Lineage);
    let c_strain = lookup_record_text(record, EnumSourceColumn::Strain);
    let c_vendor = lookup_record_text(record, EnumSourceColumn::Vendor);
    let c_doh_raw = lookup_record_text(record, EnumSourceColumn::Doh);
    let c_potency = compose_potency(
        &lookup_record_text(record, EnumSourceColumn::Ratio),
        lookup_record_number(record, EnumSourceColumn::Thc),
        lookup_record_number(record, EnumSourceColumn::Cbd),
        category,
    );

    if c_description.is_empty() {
        l_issues.push(format!("record {idx_record}: missing description"));
    }
    if c_price_raw.is_empty() {
        l_issues.push(format!("record {idx_record}: missing price"));
    }

    let c_lineage_display = canonicalize_lineage_text(&c_lineage_raw)
        .map(str::to_string)
        .unwrap_or_else(|| c_lineage_raw.to_uppercase());

    let mut ctx = SpecLabelContext {
        idx_record,
        category,
        ..Default::default()
    };
    let dict_values = &mut ctx.dict_values;
    dict_values.insert(EnumLabelField::Description, c_description);
    dict_values.insert(EnumLabelField::Brand, c_brand.clone());
    dict_values.insert(EnumLabelField::Price, format_price(&c_price_raw));

    if category == EnumProductCategory::Paraphernalia {
        dict_values.insert(
            EnumLabelField::Lineage,
            EnumLineageCategory::Paraphernalia.label().to_string(),
        );
    } else {
        dict_values.insert(EnumLabelField::Ratio, c_potency);
        dict_values.insert(EnumLabelField::Strain, c_strain);
        dict_values.insert(EnumLabelField::Weight, c_weight);

        let if_lineage_kept = matches!(
            classify_lineage_text(&c_lineage_display),
            Some(EnumLineageCategory::CbdBlend | EnumLineageCategory::Mixed)
        );
        if category.is_milligram_potency() && !if_lineage_kept {
            dict_values.insert(EnumLabelField::Lineage, c_brand);
            ctx.lineage_source = Some(c_lineage_raw);
        } else {
            dict_values.insert(EnumLabelField::Lineage, c_lineage_display);
        }

        if category.is_percentage_potency() {
            dict_values.insert(EnumLabelField::Vendor, c_vendor);
        }
        if matches!(
            category,
            EnumProductCategory::Flower | EnumProductCategory::PreRoll
        ) && TUP_DOH_TRUTHY_VALUES.contains(&c_doh_raw.to_ascii_lowercase().as_str())
        {
            dict_values.insert(EnumLabelField::Doh, C_DOH_DISPLAY.to_string());
        }
    }
    ctx.dict_values.retain(|_, c_value| !c_value.is_empty());

    for (c_key, field) in TUP_TEMPLATE_KEYS {
        let c_value = if c_key == "DescAndWeight" {
            compose_desc_and_weight(ctx.value(field), ctx.value(EnumLabelField::Weight))
        } else {
            ctx.value(field).to_string()
        };
        ctx.dict_template
            .insert(c_key.to_string(), wrap(&c_value, field));
    }

    for c_issue in &l_issues {
        warn!(idx_record, issue = %c_issue, "label record issue");
    }
    ctx.l_issues = l_issues;
    ctx
}

/// Build contexts for every record, in input order.
pub fn build_label_contexts(l_records: &[SpecRecord]) -> Vec<SpecLabelContext> {
    l_records
        .iter()
        .enumerate()
        .map(|(idx_record, record)| build_label_context(idx_record, record))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::unwrap;

    fn derive_flower_record() -> SpecRecord {
        SpecRecord::from_pairs([
            ("Product Name*", "Blue Dream Flower 3.5g"),
            ("Product Type*", "Flower"),
            ("Product Brand", "Acme Farms"),
            ("Vendor/Supplier*", "Acme Farms LLC"),
            ("Lineage", "sativa"),
            ("Ratio_or_THC_CBD", "THC: 25% CBD: 2%"),
            ("Weight*", "3.5"),
            ("Units", "g"),
            ("Price", "25"),
            ("DOH", "Yes"),
        ])
    }

    #[test]
    fn test_build_label_context_flower() {
        let ctx = build_label_context(0, &derive_flower_record());
        assert_eq!(ctx.category, EnumProductCategory::Flower);
        assert_eq!(ctx.value(EnumLabelField::Description), "Blue Dream Flower");
        assert_eq!(ctx.value(EnumLabelField::Weight), "3.5g");
        assert_eq!(ctx.value(EnumLabelField::Ratio), "THC: 25%|BR|CBD: 2%");
        assert_eq!(ctx.value(EnumLabelField::Lineage), "SATIVA");
        assert_eq!(ctx.value(EnumLabelField::Price), "$25");
        assert_eq!(ctx.value(EnumLabelField::Vendor), "Acme Farms LLC");
        assert_eq!(ctx.value(EnumLabelField::Doh), "DOH");
        assert!(ctx.l_issues.is_empty());

        let c_desc_weight = ctx.template_value("DescAndWeight").unwrap();
        assert_eq!(
            unwrap(c_desc_weight, EnumLabelField::Description),
            "Blue Dream Flower -\u{a0}3.5g"
        );
    }

    #[test]
    fn test_build_label_context_edible_gates_fields() {
        let record = SpecRecord::from_pairs([
            ("Description", "Sour Gummies"),
            ("ProductType", "Edible (Solid)"),
            ("ProductBrand", "Chewy Co"),
            ("Vendor", "Chewy Distribution"),
            ("Lineage", "Hybrid"),
            ("Ratio", "100mg THC 10mg CBD"),
            ("Price", "$18.50"),
            ("DOH", "yes"),
        ]);
        let ctx = build_label_context(3, &record);
        assert_eq!(ctx.category, EnumProductCategory::Edible);
        assert_eq!(ctx.value(EnumLabelField::Lineage), "Chewy Co");
        assert_eq!(ctx.lineage_source.as_deref(), Some("Hybrid"));
        assert_eq!(ctx.value(EnumLabelField::Ratio), "100mg THC|BR|10mg CBD");
        assert_eq!(ctx.value(EnumLabelField::Vendor), "");
        assert_eq!(ctx.value(EnumLabelField::Doh), "");
        assert_eq!(ctx.value(EnumLabelField::Price), "$18.50");
        assert_eq!(ctx.template_value("ProductVendor"), Some(""));
    }

    #[test]
    fn test_build_label_context_cbd_edible_keeps_lineage() {
        let record = SpecRecord::from_pairs([
            ("Description", "Calm Tincture"),
            ("ProductType", "Tincture"),
            ("ProductBrand", "Drops Inc"),
            ("Lineage", "cbd"),
        ]);
        let ctx = build_label_context(0, &record);
        assert_eq!(ctx.value(EnumLabelField::Lineage), "CBD");
        assert_eq!(ctx.lineage_source, None);
        assert_eq!(ctx.l_issues, vec!["record 0: missing price".to_string()]);
    }

    #[test]
    fn test_build_label_context_paraphernalia() {
        let record = SpecRecord::from_pairs([
            ("Description", "Glass Pipe"),
            ("ProductType", "Paraphernalia"),
            ("Ratio", "THC: 25%"),
            ("Vendor", "Glassworks"),
            ("Weight", "1"),
            ("Price", "12"),
        ]);
        let ctx = build_label_context(0, &record);
        assert_eq!(ctx.category, EnumProductCategory::Paraphernalia);
        assert_eq!(ctx.value(EnumLabelField::Lineage), "PARAPHERNALIA");
        assert_eq!(ctx.value(EnumLabelField::Ratio), "");
        assert_eq!(ctx.value(EnumLabelField::Vendor), "");
        assert_eq!(ctx.value(EnumLabelField::Weight), "");
    }

    #[test]
    fn test_normalize_record_value_drops_nan_like_and_markers() {
        assert_eq!(
            normalize_record_value(&EnumRecordValue::String(" NaN ".to_string())),
            ""
        );
        assert_eq!(
            normalize_record_value(&EnumRecordValue::String(
                "Blue\nDREAMSTRAINENDMK  Kush".to_string()
            )),
            "Blue DREAM Kush"
        );
        assert_eq!(normalize_record_value(&EnumRecordValue::Number(3.0)), "3");
    }

    #[test]
    fn test_normalize_pack_notation() {
        assert_eq!(normalize_pack_notation("1g x 1 Pack"), "1g");
        assert_eq!(normalize_pack_notation("1g x 2 pack"), "1g x 2 Pack");
        assert_eq!(
            normalize_pack_notation("Infused Pre-Roll 0.5G x 1 pk"),
            "Infused Pre-Roll 0.5g"
        );
    }

    #[test]
    fn test_compose_potency_from_numeric_columns() {
        assert_eq!(
            compose_potency("", Some(22.5), Some(0.0), EnumProductCategory::Flower),
            "THC: 22.5%|BR|CBD: 0%"
        );
        assert_eq!(
            compose_potency("1:1", Some(5.0), None, EnumProductCategory::Flower),
            "1:1"
        );
        assert_eq!(
            compose_potency("", Some(10.0), None, EnumProductCategory::Edible),
            "10mg THC"
        );
    }

    #[test]
    fn test_compose_potency_milligram_in_either_order() {
        assert_eq!(
            compose_potency("THC: 10mg CBD: 5mg", None, None, EnumProductCategory::Edible),
            "10mg THC|BR|5mg CBD"
        );
        assert_eq!(
            compose_potency("100mg THC 10mg CBD", None, None, EnumProductCategory::Edible),
            "100mg THC|BR|10mg CBD"
        );
        assert_eq!(
            compose_potency("CBD 20mg", None, None, EnumProductCategory::Tincture),
            "20mg CBD"
        );
    }

    #[test]
    fn test_compose_potency_keeps_unparsed_cannabinoids() {
        assert_eq!(
            compose_potency("THC: 25% CBD: <1%", None, None, EnumProductCategory::Flower),
            "THC: 25%|BR|CBD: <1%"
        );
        assert_eq!(
            compose_potency("thc 25%, CBD: ND", None, None, EnumProductCategory::Flower),
            "THC: 25%|BR|CBD: ND"
        );
    }

    #[test]
    fn test_classify_product_category_matches_whole_words() {
        assert_eq!(
            classify_product_category("Concentrate - Budder"),
            EnumProductCategory::Concentrate
        );
        assert_eq!(
            classify_product_category("Live Budder"),
            EnumProductCategory::Concentrate
        );
        assert_eq!(
            classify_product_category("Flower - Smalls"),
            EnumProductCategory::Flower
        );
        assert_eq!(
            classify_product_category("Infused Pre-Rolls"),
            EnumProductCategory::PreRoll
        );
        assert_eq!(
            classify_product_category("Vape Cartridges"),
            EnumProductCategory::Concentrate
        );
        assert_eq!(classify_product_category("Gift Card"), EnumProductCategory::Other);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price("25"), "$25");
        assert_eq!(format_price("$1,025.5"), "$1025.50");
        assert_eq!(format_price("call"), "call");
    }
}
