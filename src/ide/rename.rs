//! Rename as a code action.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{CodeActionChange, CodeActionResult};
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, DocumentId, EngineError, EngineResult};
use crate::text::{edit, TextIndex};

/// Rename the symbol at `offset`. Changes from every affected document are
/// reported together, each as a diff against that document's text.
pub fn rename(
    doc: &DocumentSnapshot,
    offset: usize,
    new_name: &str,
    cancel: &CancellationToken,
) -> EngineResult<Option<CodeActionResult>> {
    check_cancelled(cancel)?;
    let model = doc.model();
    let Some(symbol) = model.symbol_at(offset) else {
        return Ok(None);
    };

    let mut changes_in_document = Vec::new();
    for (document, edits) in model.rename(&symbol, new_name, cancel)? {
        check_cancelled(cancel)?;
        let before: Arc<str> = match document {
            DocumentId::Source => doc.text().into(),
            other => model.document_text(other).ok_or_else(|| {
                EngineError::internal(format!("rename touched unknown document {other:?}"))
            })?,
        };
        let edits = edit::normalize(edits, before.len())
            .map_err(|e| EngineError::internal(e.to_string()))?;
        let after = edit::apply(&before, &edits);

        let index = match document {
            DocumentId::Source => None,
            _ => Some(TextIndex::new(&before)),
        };
        let index = index.as_ref().unwrap_or(doc.index());
        changes_in_document.extend(edit::diff(&before, &after).into_iter().map(|change| {
            let (offset_from, offset_to) = index.span_to_utf16(change.span);
            CodeActionChange {
                offset_from,
                offset_to,
                new_text: change.new_text,
            }
        }));
    }

    Ok(Some(CodeActionResult {
        title: format!("Rename to {new_name}"),
        id: None,
        changes_in_document,
    }))
}
