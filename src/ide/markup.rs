//! Doc text cleanup and hover markdown.

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::StructuredDoc;

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

/// Strip markup tags and collapse whitespace.
pub fn clean(text: &str) -> String {
    let stripped = match &*TAG {
        Some(re) => re.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cleaned(text: Option<&str>) -> Option<String> {
    text.map(clean).filter(|t| !t.is_empty())
}

/// Hover text: the declaration in a code fence, then each doc section that
/// has content, in a fixed order.
pub fn hover_markdown(language: &str, declaration: &str, doc: Option<&StructuredDoc>) -> String {
    let mut sections = vec![format!("```{language}\n{declaration}\n```")];
    let Some(doc) = doc else {
        return sections.remove(0);
    };

    if let Some(summary) = cleaned(doc.summary.as_deref()) {
        sections.push(format!("**Summary**\n\n{summary}"));
    }
    let params: Vec<String> = doc
        .params
        .iter()
        .filter_map(|(name, text)| cleaned(Some(text)).map(|t| format!("- `{name}`: {t}")))
        .collect();
    if !params.is_empty() {
        sections.push(format!("**Parameters**\n\n{}", params.join("\n")));
    }
    if let Some(returns) = cleaned(doc.returns.as_deref()) {
        sections.push(format!("**Returns**\n\n{returns}"));
    }
    if let Some(remarks) = cleaned(doc.remarks.as_deref()) {
        sections.push(format!("**Remarks**\n\n{remarks}"));
    }
    sections.join("\n\n")
}

/// Summary of a doc, cleaned, for signature help.
pub fn summary(doc: Option<&StructuredDoc>) -> Option<String> {
    cleaned(doc?.summary.as_deref())
}

/// One parameter's description, cleaned.
pub fn param(doc: Option<&StructuredDoc>, name: &str) -> Option<String> {
    cleaned(doc?.param(name))
}
