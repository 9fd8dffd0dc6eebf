//! Signature help: which callable is being invoked, its overloads, and which
//! parameter the cursor is on.

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::api::{ParameterHelp, Signature, SignatureHelpResult};
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, display, EngineResult, SymbolDescriptor, TypeRef};
use crate::syntax::{NodeId, Role, SyntaxKind, SyntaxTree};

use super::markup;

/// The invocation enclosing a cursor.
struct Invocation {
    /// Callee expression, or the construct itself when there is no callee.
    target: NodeId,
    arguments: NodeId,
}

pub fn signature_help(
    doc: &DocumentSnapshot,
    offset: usize,
    cancel: &CancellationToken,
) -> EngineResult<Option<SignatureHelpResult>> {
    check_cancelled(cancel)?;
    let tree = doc.tree();
    let Some(invocation) = find_invocation(tree, offset) else {
        return Ok(None);
    };
    let model = doc.model();

    let active_parameter = tree
        .children_of_kind(invocation.arguments, SyntaxKind::Separator)
        .take_while(|&comma| tree.span(comma).start <= offset)
        .count();

    let argument_types: Vec<Option<TypeRef>> = arguments(tree, invocation.arguments)
        .map(|arg| model.type_of(arg))
        .collect();

    let candidates = candidates(doc, &invocation);
    check_cancelled(cancel)?;

    let mut signatures: IndexMap<String, Signature> = IndexMap::new();
    let mut best_score = i64::MIN;
    let mut best_label: Option<String> = None;
    for candidate in &candidates {
        let signature = build_signature(doc, candidate);
        let label = signature.label.clone();
        signatures.entry(label.clone()).or_insert(signature);

        let score = invocation_score(candidate, &argument_types);
        if score > best_score {
            best_score = score;
            best_label = Some(label);
        }
    }

    let active_signature = best_label
        .and_then(|label| signatures.get_index_of(&label))
        .unwrap_or(0);
    Ok(Some(SignatureHelpResult {
        signatures: signatures.into_values().collect(),
        active_parameter,
        active_signature,
    }))
}

/// Nearest call, construction or attribute whose argument list holds `offset`.
fn find_invocation(tree: &SyntaxTree, offset: usize) -> Option<Invocation> {
    let start = tree.covering_node(offset)?;
    tree.ancestors(start).find_map(|node| {
        if !tree.kind(node).is_argument_bearing() {
            return None;
        }
        let arguments = tree.child_with_role(node, Role::Arguments)?;
        if !argument_list_holds(tree, arguments, offset) {
            return None;
        }
        let target = tree.child_with_role(node, Role::Target).unwrap_or(node);
        Some(Invocation { target, arguments })
    })
}

/// `start <= offset < end`, or at the end of a list missing its closer.
fn argument_list_holds(tree: &SyntaxTree, arguments: NodeId, offset: usize) -> bool {
    let span = tree.span(arguments);
    if span.contains(offset) {
        return true;
    }
    let unclosed = tree
        .children(arguments)
        .last()
        .is_some_and(|&last| tree.node(last).missing);
    unclosed && offset == span.end
}

fn arguments(tree: &SyntaxTree, list: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    tree.children(list).iter().copied().filter(move |&c| {
        !matches!(
            tree.kind(c),
            SyntaxKind::Punctuation | SyntaxKind::Separator | SyntaxKind::Comment
        ) && !tree.node(c).missing
    })
}

/// Overloads the target may name, filtered by how it is reached.
fn candidates(doc: &DocumentSnapshot, invocation: &Invocation) -> Vec<SymbolDescriptor> {
    let tree = doc.tree();
    let model = doc.model();
    let group = model.member_group(invocation.target);

    match tree.kind(invocation.target) {
        SyntaxKind::MemberAccess => {
            let Some(through) = tree.child_with_role(invocation.target, Role::Receiver) else {
                return group;
            };
            let through_symbol = model.bind_as_expression(through);
            let through_type = model.bind_as_type(through);
            let through_kind = tree.kind(through);

            let mut include_instance = through_symbol.as_ref().is_some_and(|s| !s.is_type())
                || matches!(through_kind, SyntaxKind::Literal | SyntaxKind::TypeOf);
            let include_static =
                through_symbol.as_ref().is_some_and(|s| s.is_type()) || through_type.is_some();
            if through_type.is_none() {
                include_instance = true;
            }
            group
                .into_iter()
                .filter(|m| {
                    let is_static = m.modifiers.is_static;
                    (is_static && include_static) || (!is_static && include_instance)
                })
                .collect()
        }
        SyntaxKind::Identifier if model.is_static_context(invocation.target) => group
            .into_iter()
            .filter(|m| m.modifiers.is_static || m.modifiers.is_local_function)
            .collect(),
        _ => group,
    }
}

fn build_signature(doc: &DocumentSnapshot, symbol: &SymbolDescriptor) -> Signature {
    let docs = doc.model().doc_comment(symbol);
    Signature {
        label: display::signature_label(symbol),
        documentation: markup::summary(docs.as_ref()),
        parameters: symbol
            .parameters
            .iter()
            .map(|p| ParameterHelp {
                label: display::parameter_label(&p.name, p.ty.as_ref().map(TypeRef::as_str)),
                documentation: markup::param(docs.as_ref(), &p.name),
            })
            .collect(),
    }
}

/// Fewer declared parameters than supplied arguments disqualifies. Otherwise
/// an unknown argument type scores 1 and an exact type match 2.
fn invocation_score(symbol: &SymbolDescriptor, argument_types: &[Option<TypeRef>]) -> i64 {
    if symbol.parameters.len() < argument_types.len() {
        return i64::MIN;
    }
    argument_types
        .iter()
        .zip(&symbol.parameters)
        .map(|(arg, param)| match arg {
            None => 1,
            Some(ty) if param.ty.as_ref() == Some(ty) => 2,
            Some(_) => 0,
        })
        .sum()
}
