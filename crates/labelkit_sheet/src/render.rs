//! Template render: double-brace substitution of label placeholders.

use std::sync::LazyLock;

use labelkit_io_docx::{SpecDocument, collapse_paragraph_runs};
use regex::Regex;
use tracing::debug;

use crate::spec::{LabelError, SpecLabelContext};
use crate::util::compile_static_regex;

static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"\{\{\s*Label(\d+)\.(\w+)\s*\}\}", "label placeholder")
});

fn render_text(
    text: &str,
    l_contexts: &[SpecLabelContext],
    n_cells: usize,
) -> Result<String, LabelError> {
    let mut c_out = String::with_capacity(text.len());
    let mut n_cursor = 0;
    for caps in RE_PLACEHOLDER.captures_iter(text) {
        let (Some(m_all), Some(m_idx), Some(m_key)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let idx_label = m_idx.as_str().parse::<usize>().unwrap_or(0);
        if idx_label == 0 || idx_label > n_cells {
            return Err(LabelError::Template(format!(
                "Label index out of range 1..={n_cells}: {:?}",
                m_all.as_str()
            )));
        }
        c_out.push_str(&text[n_cursor..m_all.start()]);
        n_cursor = m_all.end();

        let Some(ctx) = l_contexts.get(idx_label - 1) else {
            continue;
        };
        match ctx.template_value(m_key.as_str()) {
            Some(c_value) => c_out.push_str(c_value),
            None => debug!(key = m_key.as_str(), "unknown template key rendered empty"),
        }
    }
    c_out.push_str(&text[n_cursor..]);
    Ok(c_out)
}

/// Substitute every `{{Label<i>.<Key>}}` with context `i`'s wrapped value.
///
/// Placeholders of labels beyond `l_contexts` and unknown keys render empty.
/// An index of `0` or above `n_cells` is a [`LabelError::Template`].
pub fn render_label_grid(
    doc_grid: &SpecDocument,
    l_contexts: &[SpecLabelContext],
    n_cells: usize,
) -> Result<SpecDocument, LabelError> {
    let mut doc = doc_grid.clone();
    for para in doc.paragraphs_mut() {
        let if_split_placeholder = para.runs.len() > 1 && {
            let n_in_runs: usize = para
                .runs
                .iter()
                .map(|run| RE_PLACEHOLDER.find_iter(&run.text).count())
                .sum();
            RE_PLACEHOLDER.find_iter(&para.text()).count() > n_in_runs
        };
        if if_split_placeholder {
            collapse_paragraph_runs(para);
        }
        for run in para.runs.iter_mut() {
            if RE_PLACEHOLDER.is_match(&run.text) {
                run.text = render_text(&run.text, l_contexts, n_cells)?;
            }
        }
    }
    Ok(doc)
}
