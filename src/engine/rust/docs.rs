//! Doc comment extraction and sectioning.
//!
//! Two layouts are understood: rustdoc headings (`# Arguments`, `# Returns`,
//! `# Remarks`) and XML-style tags (`<summary>`, `<param name="..">`,
//! `<returns>`, `<remarks>`). Section text is returned raw.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::engine::StructuredDoc;

static XML_SUMMARY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<summary>(.*?)</summary>").ok());
static XML_PARAM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<param\s+name\s*=\s*"([^"]*)"\s*>(.*?)</param>"#).ok()
});
static XML_RETURNS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<returns>(.*?)</returns>").ok());
static XML_REMARKS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<remarks>(.*?)</remarks>").ok());
static HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#+\s*(.+?)\s*$").ok());
static LIST_ITEM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[*-]\s+`?([A-Za-z_][A-Za-z0-9_]*)`?\s*(?:-|:|–)\s*(.*)$").ok()
});

/// Body text of a run of doc comments, markers stripped.
///
/// `comments` are the raw comment texts in source order. Plain comments are
/// skipped; `None` when no doc comment remains.
pub fn doc_text<'a>(comments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut lines = Vec::new();
    for comment in comments {
        if let Some(rest) = comment.strip_prefix("///") {
            if rest.starts_with('/') {
                continue;
            }
            lines.push(strip_one_space(rest.trim_end_matches(['\r', '\n'])).to_string());
        } else if let Some(body) = comment
            .strip_prefix("/**")
            .filter(|b| !b.starts_with('*'))
            .and_then(|b| b.strip_suffix("*/"))
        {
            for line in body.lines() {
                let line = line.trim_start();
                let line = line.strip_prefix('*').unwrap_or(line);
                lines.push(strip_one_space(line).to_string());
            }
        }
    }
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

/// Split a doc body into the sections hover renders.
pub fn parse(text: &str) -> StructuredDoc {
    if find(&XML_SUMMARY, text).is_some()
        || find(&XML_PARAM, text).is_some()
        || find(&XML_RETURNS, text).is_some()
    {
        parse_xml(text)
    } else {
        parse_rustdoc(text)
    }
}

fn find<'t>(re: &Option<Regex>, text: &'t str) -> Option<Captures<'t>> {
    re.as_ref()?.captures(text)
}

fn capture(re: &Option<Regex>, text: &str) -> Option<String> {
    find(re, text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_xml(text: &str) -> StructuredDoc {
    StructuredDoc {
        summary: capture(&XML_SUMMARY, text),
        params: params_of(&XML_PARAM, text),
        returns: capture(&XML_RETURNS, text),
        remarks: capture(&XML_REMARKS, text),
    }
}

fn params_of(re: &Option<Regex>, text: &str) -> Vec<(String, String)> {
    match re {
        Some(re) => re
            .captures_iter(text)
            .map(|c| (c[1].to_string(), c[2].trim().to_string()))
            .collect(),
        None => Vec::new(),
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Section {
    Summary,
    Params,
    Returns,
    Remarks,
    Ignored,
}

fn parse_rustdoc(text: &str) -> StructuredDoc {
    let mut doc = StructuredDoc::default();
    let mut summary = Vec::new();
    let mut returns = Vec::new();
    let mut remarks = Vec::new();
    let mut section = Section::Summary;
    let mut in_code = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        if let Some(heading) = find(&HEADING, line) {
            section = match heading[1].to_ascii_lowercase().as_str() {
                "arguments" | "parameters" | "params" => Section::Params,
                "returns" | "return value" => Section::Returns,
                "remarks" | "notes" => Section::Remarks,
                _ => Section::Ignored,
            };
            continue;
        }
        match section {
            Section::Summary => summary.push(line),
            Section::Returns => returns.push(line),
            Section::Remarks => remarks.push(line),
            Section::Params => {
                if let Some(item) = find(&LIST_ITEM, line.trim()) {
                    doc.params.push((item[1].to_string(), item[2].trim().to_string()));
                } else if let Some((_, last)) = doc.params.last_mut() {
                    // Continuation line of the previous item.
                    if !line.trim().is_empty() {
                        last.push(' ');
                        last.push_str(line.trim());
                    }
                }
            }
            Section::Ignored => {}
        }
    }

    doc.summary = joined(&summary);
    doc.returns = joined(&returns);
    doc.remarks = joined(&remarks);
    doc
}

fn joined(lines: &[&str]) -> Option<String> {
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_markers() {
        let text = doc_text(["/// Adds two numbers.\n", "///\n", "/// More."]).unwrap();
        assert_eq!(text, "Adds two numbers.\n\nMore.");
    }

    #[test]
    fn plain_comments_are_not_docs() {
        assert_eq!(doc_text(["// nothing", "//// banner"]), None);
    }

    #[test]
    fn block_docs_drop_stars() {
        let text = doc_text(["/**\n * Hello.\n * World.\n */"]).unwrap();
        assert_eq!(text, "Hello.\nWorld.");
    }

    #[test]
    fn rustdoc_sections() {
        let doc = parse(
            "Looks up a user.\n\n# Arguments\n\n* `id` - The ID.\n* `name` - The name,\n  if any.\n\n# Returns\n\nThe user.\n\n# Examples\n\n```\nfind(1);\n```\n\n# Remarks\n\nSlow.",
        );
        assert_eq!(doc.summary.as_deref(), Some("Looks up a user."));
        assert_eq!(doc.param("id"), Some("The ID."));
        assert_eq!(doc.param("name"), Some("The name, if any."));
        assert_eq!(doc.returns.as_deref(), Some("The user."));
        assert_eq!(doc.remarks.as_deref(), Some("Slow."));
    }

    #[test]
    fn xml_sections() {
        let doc = parse(
            "<summary>\nGets it.\n</summary>\n<param name=\"id\">The ID.</param>\n<returns>A thing.</returns>",
        );
        assert_eq!(doc.summary.as_deref(), Some("Gets it."));
        assert_eq!(doc.param("id"), Some("The ID."));
        assert_eq!(doc.returns.as_deref(), Some("A thing."));
        assert_eq!(doc.remarks, None);
    }
}
