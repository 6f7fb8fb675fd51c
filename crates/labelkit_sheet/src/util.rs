//! Stateless helpers shared by the label pipeline stages.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::conf::C_LINE_BREAK_TOKEN;

////////////////////////////////////////////////////////////////////////////////
// #region TextUtils

/// Compile a built-in pattern held in a static.
pub fn compile_static_regex(pattern: &str, desc: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid {desc} regex: {err}"))
}

/// Collapse every whitespace run (newlines included) into one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a number without a trailing `.0` (`25.0` -> `25`, `2.50` -> `2.5`).
pub fn format_number_compact(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let c_txt = format!("{value:.4}");
    c_txt.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Split on soft break tokens and real line breaks.
pub fn split_display_lines(text: &str) -> Vec<&str> {
    text.split(C_LINE_BREAK_TOKEN)
        .flat_map(|part| part.split('\n'))
        .collect()
}

/// Layout complexity of display text.
///
/// Longest line length, plus every character beyond `n_len_long_word` in each word,
/// plus `n_per_extra_line` for every line after the first.
pub fn calculate_text_complexity(
    text: &str,
    n_len_long_word: usize,
    n_per_extra_line: usize,
) -> usize {
    let l_lines: Vec<&str> = split_display_lines(text)
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if l_lines.is_empty() {
        return 0;
    }
    let n_len_longest = l_lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let n_long_word_penalty: usize = l_lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .map(|word| word.chars().count().saturating_sub(n_len_long_word))
        .sum();
    n_len_longest + n_long_word_penalty + (l_lines.len() - 1) * n_per_extra_line
}

/// Whether `keyword` appears in `text` delimited by non-alphanumeric characters.
pub fn contains_keyword_word(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    text.match_indices(keyword).any(|(n_start, _)| {
        let n_end = n_start + keyword.len();
        let if_left_ok = text[..n_start]
            .chars()
            .next_back()
            .is_none_or(|ch| !ch.is_alphanumeric());
        let if_right_ok = text[n_end..]
            .chars()
            .next()
            .is_none_or(|ch| !ch.is_alphanumeric());
        if_left_ok && if_right_ok
    })
}

/// Upper-case, turn `-`/`_` into spaces, tighten slashes and collapse whitespace.
pub fn normalize_lineage_text(text: &str) -> String {
    let c_txt = text.to_uppercase().replace(['-', '_'], " ");
    let c_txt = collapse_whitespace(&c_txt);
    c_txt.replace(" / ", "/").replace("/ ", "/").replace(" /", "/")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChunkUtils

/// Split `n_records_total` into `(start, len)` chunks of at most `size_chunk`.
pub fn generate_record_chunks(n_records_total: usize, size_chunk: usize) -> Vec<(usize, usize)> {
    let size_chunk = usize::max(1, size_chunk);
    let mut l_chunks = Vec::new();
    let mut n_record_cursor = 0;
    while n_record_cursor < n_records_total {
        let n_records_per_chunk = usize::min(size_chunk, n_records_total - n_record_cursor);
        l_chunks.push((n_record_cursor, n_records_per_chunk));
        n_record_cursor += n_records_per_chunk;
    }
    l_chunks
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {l_pos:?}", l_pos.len()))
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_record_chunks_keeps_input_order() {
        assert_eq!(
            generate_record_chunks(25, 9),
            vec![(0, 9), (9, 9), (18, 7)]
        );
        assert!(generate_record_chunks(0, 9).is_empty());
    }

    #[test]
    fn test_calculate_text_complexity_penalizes_lines_and_long_words() {
        assert_eq!(calculate_text_complexity("", 10, 4), 0);
        assert_eq!(calculate_text_complexity("Blue Dream", 10, 4), 10);
        assert_eq!(calculate_text_complexity("THC: 25%|BR|CBD: 2%", 10, 4), 8 + 4);
        assert_eq!(calculate_text_complexity("Supercalifragilistic", 10, 4), 20 + 10);
    }

    #[test]
    fn test_contains_keyword_word_respects_boundaries() {
        assert!(contains_keyword_word("HYBRID/INDICA", "INDICA"));
        assert!(contains_keyword_word("SATIVA DOMINANT", "SATIVA"));
        assert!(!contains_keyword_word("CBDX", "CBD"));
        assert!(!contains_keyword_word("", "CBD"));
    }

    #[test]
    fn test_normalize_lineage_text() {
        assert_eq!(normalize_lineage_text(" hybrid / indica "), "HYBRID/INDICA");
        assert_eq!(normalize_lineage_text("Sativa-Dominant"), "SATIVA DOMINANT");
    }

    #[test]
    fn test_format_number_compact() {
        assert_eq!(format_number_compact(25.0), "25");
        assert_eq!(format_number_compact(2.50), "2.5");
        assert_eq!(format_number_compact(f64::NAN), "");
    }

    #[test]
    fn test_validate_unique_columns_reports_duplicates() {
        let l_cols = vec!["Price".to_string(), "Price".to_string()];
        let err = validate_unique_columns(&l_cols).unwrap_err();
        assert!(err.contains("\"Price\" x2"));
    }
}
