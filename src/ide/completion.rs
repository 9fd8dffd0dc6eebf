//! Completion and completion-resolve.

use lsp_types::CompletionItemKind;
use tokio_util::sync::CancellationToken;

use crate::api::TabCompletionResult;
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, CompletionCandidate, EngineResult};

/// Editor tag for a completion category.
pub fn tag(kind: CompletionItemKind) -> &'static str {
    match kind {
        CompletionItemKind::METHOD | CompletionItemKind::FUNCTION => "Method",
        CompletionItemKind::VARIABLE => "Local",
        CompletionItemKind::FIELD => "Field",
        CompletionItemKind::PROPERTY => "Property",
        CompletionItemKind::STRUCT => "Structure",
        CompletionItemKind::ENUM => "Enum",
        CompletionItemKind::INTERFACE => "Interface",
        CompletionItemKind::CLASS => "Class",
        CompletionItemKind::ENUM_MEMBER => "EnumMember",
        CompletionItemKind::CONSTANT => "Constant",
        CompletionItemKind::MODULE => "Namespace",
        CompletionItemKind::KEYWORD => "Keyword",
        _ => "Text",
    }
}

fn to_result(
    doc: &DocumentSnapshot,
    candidate: CompletionCandidate,
    with_description: bool,
) -> TabCompletionResult {
    let description = if with_description {
        doc.model().describe(&candidate)
    } else {
        None
    };
    TabCompletionResult {
        tag: Some(tag(candidate.category).to_string()),
        suggestion: candidate.label,
        description,
    }
}

/// Candidates at `offset`. Descriptions are only filled in when `eager`.
pub fn complete(
    doc: &DocumentSnapshot,
    offset: usize,
    eager: bool,
    cancel: &CancellationToken,
) -> EngineResult<Vec<TabCompletionResult>> {
    let candidates = doc.model().completions(offset, cancel)?;
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if eager {
            check_cancelled(cancel)?;
        }
        out.push(to_result(doc, candidate, eager));
    }
    Ok(out)
}

/// Describe one earlier suggestion. `None` when it is no longer offered.
pub fn resolve(
    doc: &DocumentSnapshot,
    offset: usize,
    suggestion: &str,
    cancel: &CancellationToken,
) -> EngineResult<Option<TabCompletionResult>> {
    let found = doc
        .model()
        .completions(offset, cancel)?
        .into_iter()
        .find(|c| c.label == suggestion);
    Ok(found.map(|c| to_result(doc, c, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::snapshot;

    const SOURCE: &str = "/// Sums things.\nfn total(a: i32) -> i32 { a }\nfn main() {\n    let value = 1;\n    \n}\n";

    fn cursor() -> usize {
        SOURCE.find("    \n}").unwrap() + 4
    }

    #[test]
    fn deferred_completion_has_no_descriptions() {
        let doc = snapshot(SOURCE);
        let items = complete(&doc, cursor(), false, &CancellationToken::new()).unwrap();
        let total = items.iter().find(|i| i.suggestion == "total").unwrap();
        assert_eq!(total.tag.as_deref(), Some("Method"));
        assert!(items.iter().all(|i| i.description.is_none()));
        let value = items.iter().find(|i| i.suggestion == "value").unwrap();
        assert_eq!(value.tag.as_deref(), Some("Local"));
    }

    #[test]
    fn eager_completion_describes_items() {
        let doc = snapshot(SOURCE);
        let items = complete(&doc, cursor(), true, &CancellationToken::new()).unwrap();
        let kw = items.iter().find(|i| i.suggestion == "while").unwrap();
        assert_eq!(kw.description.as_deref(), Some("while Keyword"));
        assert_eq!(kw.tag.as_deref(), Some("Keyword"));
    }

    #[test]
    fn members_after_self() {
        let source = "struct S { n: i32 }\nimpl S {\n    fn go(&self) {}\n    fn m(&self) -> i32 {\n        self.n\n    }\n}\n";
        let doc = snapshot(source);
        let offset = source.find("self.n").unwrap() + 5;
        let items = complete(&doc, offset, false, &CancellationToken::new()).unwrap();
        assert!(items.iter().any(|i| i.suggestion == "n"));
        assert!(items.iter().any(|i| i.suggestion == "go"));
    }

    #[test]
    fn resolve_finds_by_exact_label() {
        let doc = snapshot(SOURCE);
        let cancel = CancellationToken::new();
        let item = resolve(&doc, cursor(), "total", &cancel).unwrap().unwrap();
        assert_eq!(
            item.description.as_deref(),
            Some("fn total(a: i32) -> i32\nSums things.")
        );
        assert!(resolve(&doc, cursor(), "Total", &cancel).unwrap().is_none());
    }
}
