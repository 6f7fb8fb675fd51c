//! Marker protocol: field-specific sentinels that survive template substitution.
//!
//! A wrapped value reads `<TAG>STARTMK<value><TAG>ENDMK`. Sentinels are
//! alphanumeric so the substitution engine copies them verbatim, and raw input
//! is stripped of them before wrapping.

use std::sync::LazyLock;

use regex::Regex;

use crate::conf::{C_MARKER_END_SUFFIX, C_MARKER_START_SUFFIX};
use crate::spec::EnumLabelField;
use crate::util::compile_static_regex;

static RE_MARKER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    let c_tags = EnumLabelField::ALL
        .iter()
        .map(EnumLabelField::tag)
        .collect::<Vec<_>>()
        .join("|");
    compile_static_regex(
        &format!("({c_tags})({C_MARKER_START_SUFFIX}|{C_MARKER_END_SUFFIX})"),
        "marker token",
    )
});

/// Start sentinel of `field`.
pub fn derive_start_token(field: EnumLabelField) -> String {
    format!("{}{C_MARKER_START_SUFFIX}", field.tag())
}

/// End sentinel of `field`.
pub fn derive_end_token(field: EnumLabelField) -> String {
    format!("{}{C_MARKER_END_SUFFIX}", field.tag())
}

/// Wrap `value` between the sentinels of `field`.
///
/// Empty stays empty and already wrapped values are returned unchanged.
pub fn wrap(value: &str, field: EnumLabelField) -> String {
    if value.is_empty() || is_wrapped(value, field) {
        return value.to_string();
    }
    format!(
        "{}{value}{}",
        derive_start_token(field),
        derive_end_token(field)
    )
}

/// Remove one enclosing sentinel pair of `field`, if present.
pub fn unwrap(value: &str, field: EnumLabelField) -> String {
    let c_start = derive_start_token(field);
    let c_end = derive_end_token(field);
    value
        .strip_prefix(c_start.as_str())
        .and_then(|rest| rest.strip_suffix(c_end.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// Whether `value` is enclosed by the sentinels of `field`.
pub fn is_wrapped(value: &str, field: EnumLabelField) -> bool {
    let c_start = derive_start_token(field);
    let c_end = derive_end_token(field);
    value.len() >= c_start.len() + c_end.len()
        && value.starts_with(&c_start)
        && value.ends_with(&c_end)
}

/// Whether `text` holds any sentinel token.
pub fn contains_marker(text: &str) -> bool {
    RE_MARKER_TOKEN.is_match(text)
}

/// Number of sentinel tokens in `text`.
pub fn count_marker_tokens(text: &str) -> usize {
    RE_MARKER_TOKEN.find_iter(text).count()
}

/// Remove every sentinel token, keeping the enclosed text.
pub fn strip_marker_tokens(text: &str) -> String {
    RE_MARKER_TOKEN.replace_all(text, "").into_owned()
}

/// Text recovered between a matching sentinel pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFieldSpan {
    pub field: EnumLabelField,
    pub text: String,
}

/// Typed piece of rendered paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumTextSpan {
    /// Text outside any marker pair.
    Literal(String),
    /// Marker-delimited field value.
    Field(SpecFieldSpan),
}

enum EnumMarkerKind {
    Start,
    End,
}

fn derive_field_from_tag(tag: &str) -> Option<EnumLabelField> {
    EnumLabelField::ALL
        .into_iter()
        .find(|field| field.tag() == tag)
}

fn push_literal(l_spans: &mut Vec<EnumTextSpan>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(EnumTextSpan::Literal(c_prev)) = l_spans.last_mut() {
        c_prev.push_str(text);
    } else {
        l_spans.push(EnumTextSpan::Literal(text.to_string()));
    }
}

/// Tokenize rendered text into typed spans.
///
/// Returns the spans and the number of orphan sentinels dropped: end tokens
/// without an open start, start tokens never closed, or closes of another field.
/// The text of a dropped span is kept as literal.
pub fn derive_text_spans(text: &str) -> (Vec<EnumTextSpan>, usize) {
    let mut l_spans = Vec::new();
    let mut n_orphans = 0;
    let mut open: Option<(EnumLabelField, String)> = None;
    let mut n_cursor = 0;

    for caps in RE_MARKER_TOKEN.captures_iter(text) {
        let (Some(m_all), Some(m_tag), Some(m_kind)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let Some(field) = derive_field_from_tag(m_tag.as_str()) else {
            continue;
        };
        let kind = if m_kind.as_str() == C_MARKER_START_SUFFIX {
            EnumMarkerKind::Start
        } else {
            EnumMarkerKind::End
        };
        let c_between = &text[n_cursor..m_all.start()];
        n_cursor = m_all.end();

        match (kind, open.take()) {
            (EnumMarkerKind::Start, None) => {
                push_literal(&mut l_spans, c_between);
                open = Some((field, String::new()));
            }
            (EnumMarkerKind::Start, Some((_, mut c_buf))) => {
                // Unclosed start: its text falls back to literal.
                n_orphans += 1;
                c_buf.push_str(c_between);
                push_literal(&mut l_spans, &c_buf);
                open = Some((field, String::new()));
            }
            (EnumMarkerKind::End, None) => {
                n_orphans += 1;
                push_literal(&mut l_spans, c_between);
            }
            (EnumMarkerKind::End, Some((field_open, mut c_buf))) => {
                c_buf.push_str(c_between);
                if field_open == field {
                    l_spans.push(EnumTextSpan::Field(SpecFieldSpan {
                        field,
                        text: c_buf,
                    }));
                } else {
                    n_orphans += 2;
                    push_literal(&mut l_spans, &c_buf);
                }
            }
        }
    }

    let c_tail = &text[n_cursor..];
    if let Some((_, mut c_buf)) = open.take() {
        n_orphans += 1;
        c_buf.push_str(c_tail);
        push_literal(&mut l_spans, &c_buf);
    } else {
        push_literal(&mut l_spans, c_tail);
    }
    (l_spans, n_orphans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_roundtrip_and_idempotence() {
        for field in EnumLabelField::ALL {
            let c_wrapped = wrap("Blue Dream", field);
            assert!(is_wrapped(&c_wrapped, field));
            assert_eq!(wrap(&c_wrapped, field), c_wrapped);
            assert_eq!(unwrap(&c_wrapped, field), "Blue Dream");
        }
        assert_eq!(wrap("", EnumLabelField::Price), "");
        assert_eq!(unwrap("$25", EnumLabelField::Price), "$25");
    }

    #[test]
    fn test_derive_text_spans_recovers_fields() {
        let c_text = format!(
            "{} {}",
            wrap("SATIVA", EnumLabelField::Lineage),
            wrap("ACME", EnumLabelField::Vendor)
        );
        let (l_spans, n_orphans) = derive_text_spans(&c_text);
        assert_eq!(n_orphans, 0);
        assert_eq!(
            l_spans,
            vec![
                EnumTextSpan::Field(SpecFieldSpan {
                    field: EnumLabelField::Lineage,
                    text: "SATIVA".to_string(),
                }),
                EnumTextSpan::Literal(" ".to_string()),
                EnumTextSpan::Field(SpecFieldSpan {
                    field: EnumLabelField::Vendor,
                    text: "ACME".to_string(),
                }),
            ]
        );
    }

    #[test]
    fn test_derive_text_spans_drops_orphans() {
        let (l_spans, n_orphans) = derive_text_spans("PRICEENDMK$25 DESCSTARTMKGummies");
        assert_eq!(n_orphans, 2);
        assert_eq!(
            l_spans,
            vec![EnumTextSpan::Literal("$25 Gummies".to_string())]
        );

        let (l_spans, n_orphans) = derive_text_spans("BRANDSTARTMKAcmePRICEENDMK");
        assert_eq!(n_orphans, 2);
        assert_eq!(l_spans, vec![EnumTextSpan::Literal("Acme".to_string())]);
    }

    #[test]
    fn test_strip_marker_tokens_leaves_content() {
        let c_text = wrap("HYBRID", EnumLabelField::Lineage);
        assert!(contains_marker(&c_text));
        assert_eq!(strip_marker_tokens(&c_text), "HYBRID");
        assert!(!contains_marker("WEEKENDMK special"));
    }
}
