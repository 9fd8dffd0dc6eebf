//! Formatting as a code action.

use tokio_util::sync::CancellationToken;

use crate::api::{CodeActionChange, CodeActionResult};
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, EngineError, EngineResult};
use crate::text::{edit, TextSpan};

pub const FORMAT_TITLE: &str = "Format Document";

/// Format the whole buffer, or only `span` (bytes). Always a single action,
/// possibly with no changes.
pub fn format(
    doc: &DocumentSnapshot,
    span: Option<TextSpan>,
    cancel: &CancellationToken,
) -> EngineResult<Vec<CodeActionResult>> {
    let edits = doc.model().format_edits(span, cancel)?;
    check_cancelled(cancel)?;
    let edits = edit::normalize(edits, doc.text().len())
        .map_err(|e| EngineError::internal(e.to_string()))?;

    let changes_in_document = edits
        .into_iter()
        .map(|e| {
            let (offset_from, offset_to) = doc.utf16_range(e.span);
            CodeActionChange {
                offset_from,
                offset_to,
                new_text: e.new_text,
            }
        })
        .collect();
    Ok(vec![CodeActionResult {
        title: FORMAT_TITLE.to_string(),
        id: None,
        changes_in_document,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::snapshot;

    const MESSY: &str = "fn main() {\nlet a = 1;   \n        let b = 2;\n}\n";

    fn apply_changes(source: &str, changes: &[CodeActionChange]) -> String {
        let mut out = source.to_string();
        for change in changes.iter().rev() {
            out.replace_range(change.offset_from..change.offset_to, &change.new_text);
        }
        out
    }

    #[test]
    fn whole_document() {
        let doc = snapshot(MESSY);
        let actions = format(&doc, None, &CancellationToken::new()).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].title, FORMAT_TITLE);
        assert_eq!(
            apply_changes(MESSY, &actions[0].changes_in_document),
            "fn main() {\n    let a = 1;\n    let b = 2;\n}\n"
        );
    }

    #[test]
    fn span_edits_stay_inside_the_span() {
        let doc = snapshot(MESSY);
        let start = MESSY.find("        let b").unwrap();
        let span = TextSpan::new(start, MESSY.len());
        let actions = format(&doc, Some(span), &CancellationToken::new()).unwrap();
        let changes = &actions[0].changes_in_document;
        assert!(!changes.is_empty());
        assert!(changes.iter().all(|c| c.offset_from >= start && c.offset_to <= MESSY.len()));
        assert!(apply_changes(MESSY, changes).starts_with("fn main() {\nlet a = 1;   \n"));
    }

    #[test]
    fn formatting_twice_changes_nothing() {
        let messy = "fn main() {\nlet v = vec![\n1,\n        2,\n];\n  let s = \"first\n   second\";   \n    println!(\"{:?} {}\", v, s);\n}\n";
        let cancel = CancellationToken::new();
        let before = snapshot(messy);
        let actions = format(&before, None, &cancel).unwrap();
        let formatted = apply_changes(messy, &actions[0].changes_in_document);
        assert!(formatted.contains("    let v = vec![\n        1,\n        2,\n    ];\n"));
        assert!(formatted.contains("\n   second\";\n"));

        let after = snapshot(&formatted);
        let again = format(&after, None, &cancel).unwrap();
        assert!(again[0].changes_in_document.is_empty(), "{formatted}");

        let ids = |doc: &DocumentSnapshot| -> Vec<String> {
            crate::ide::code_check(doc, &cancel)
                .unwrap()
                .into_iter()
                .map(|m| m.id)
                .collect()
        };
        assert_eq!(ids(&after), ids(&before));
    }

    #[test]
    fn formatted_source_has_no_changes() {
        let clean = "fn main() {\n    let a = 1;\n}\n";
        let doc = snapshot(clean);
        let actions = format(&doc, None, &CancellationToken::new()).unwrap();
        assert!(actions[0].changes_in_document.is_empty());
    }
}
