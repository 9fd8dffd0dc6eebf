//! Hover text for the symbol under the cursor.

use tokio_util::sync::CancellationToken;

use crate::api::HoverInfoResult;
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, display, EngineResult, SymbolDescriptor, SymbolKind};
use crate::syntax::{NodeId, Role, SyntaxKind};

use super::markup;

/// Hover at `offset`, or `None` when nothing resolvable is there.
pub fn hover(
    doc: &DocumentSnapshot,
    offset: usize,
    cancel: &CancellationToken,
) -> EngineResult<Option<HoverInfoResult>> {
    check_cancelled(cancel)?;
    let Some(token) = doc.tree().token_touching(offset) else {
        return Ok(None);
    };
    let Some(mut symbol) = resolve(doc, token) else {
        return Ok(None);
    };
    if symbol.ty.is_none() && matches!(symbol.kind, SymbolKind::Local | SymbolKind::Parameter) {
        symbol.ty = doc.model().type_of(token);
    }
    let Some(declaration) = display::render_declaration(&symbol) else {
        return Ok(None);
    };

    let model = doc.model();
    let docs = model.doc_comment(&symbol);
    let information = markup::hover_markdown(model.language_id(), &declaration, docs.as_ref());
    let (offset_from, offset_to) = doc.utf16_range(doc.tree().span(token));
    Ok(Some(HoverInfoResult {
        information,
        offset_from,
        offset_to,
    }))
}

/// Declared symbol when the token names a declaration, else the bound
/// symbol, else the named type of the expression.
fn resolve(doc: &DocumentSnapshot, token: NodeId) -> Option<SymbolDescriptor> {
    let tree = doc.tree();
    let model = doc.model();

    if let Some(decl) = tree.find_ancestor(token, |n| tree.kind(n).is_declaration()) {
        let naming = tree
            .ancestors(token)
            .take_while(|&n| n != decl)
            .last()
            .and_then(|n| tree.role(n));
        match naming {
            Some(Role::Name) => return model.declared_symbol(decl),
            Some(Role::Pattern) => {
                if let Some(symbol) = model.bound_symbol(token) {
                    return Some(symbol);
                }
            }
            _ => {}
        }
    }

    if let Some(symbol) = model.bound_symbol(token) {
        return Some(symbol);
    }
    if tree.kind(token) != SyntaxKind::Identifier {
        return None;
    }
    let ty = model.type_of(token)?;
    model.type_symbol(&ty)
}
