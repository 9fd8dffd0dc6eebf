//! Lowering tree-sitter trees into [`SyntaxTree`]s.

use tree_sitter::{Node, Parser, Tree};

use crate::engine::{EngineError, EngineResult};
use crate::syntax::{DeclKind, Role, SyntaxKind, SyntaxTree, TreeBuilder};
use crate::text::TextSpan;

/// A parser bound to the Rust grammar.
pub fn new_parser() -> EngineResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_rust::LANGUAGE.into())
        .map_err(|e| EngineError::HostInit(format!("rust grammar: {e}")))?;
    Ok(parser)
}

/// Parse and lower in one go. Tree-sitter only gives up on a parse when
/// cancelled or timed out, neither of which we configure.
pub fn parse(parser: &mut Parser, source: &str) -> EngineResult<SyntaxTree> {
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| EngineError::internal("parser returned no tree"))?;
    Ok(lower(&tree))
}

/// Pre-order walk with a cursor, one neutral node per tree-sitter node.
pub fn lower(tree: &Tree) -> SyntaxTree {
    let mut builder = TreeBuilder::new();
    let mut cursor = tree.walk();
    let mut parents: Vec<&'static str> = Vec::new();

    loop {
        let node = cursor.node();
        let parent = parents.last().copied();
        let kind = classify(&node, &parents);
        let role = cursor.field_name().map(|field| role_for(parent, field));
        let span = TextSpan::new(node.start_byte(), node.end_byte());
        let id = builder.enter(kind, node.kind(), span, role);
        if node.is_missing() {
            builder.mark_missing(id);
        }

        if cursor.goto_first_child() {
            parents.push(node.kind());
            continue;
        }
        builder.exit();

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
            parents.pop();
            builder.exit();
        }
    }
}

fn role_for(parent: Option<&'static str>, field: &'static str) -> Role {
    match (parent.unwrap_or(""), field) {
        ("call_expression", "function") => Role::Target,
        (_, "arguments") => Role::Arguments,
        ("field_expression", "value") | ("scoped_identifier", "path") => Role::Receiver,
        ("field_expression", "field") | ("scoped_identifier", "name") => Role::Member,
        (_, "name") => Role::Name,
        (_, "pattern") => Role::Pattern,
        (_, "type") => Role::Type,
        (_, "parameters") => Role::Parameters,
        (_, "return_type") => Role::ReturnType,
        (_, "body") => Role::Body,
        (_, "value") => Role::Value,
        (_, other) => Role::Field(other),
    }
}

fn classify(node: &Node<'_>, parents: &[&'static str]) -> SyntaxKind {
    let parent = parents.last().copied().unwrap_or("");
    if parents
        .iter()
        .rev()
        .take(2)
        .any(|p| matches!(*p, "line_comment" | "block_comment"))
    {
        return SyntaxKind::Comment;
    }
    if matches!(
        parent,
        "string_literal" | "raw_string_literal" | "char_literal" | "boolean_literal"
    ) {
        return SyntaxKind::Literal;
    }

    match node.kind() {
        "source_file" => SyntaxKind::Root,
        "function_item" | "function_signature_item" => SyntaxKind::Declaration(DeclKind::Method),
        "struct_item" | "union_item" | "trait_item" | "type_item" => {
            SyntaxKind::Declaration(DeclKind::Type)
        }
        "enum_item" => SyntaxKind::Declaration(DeclKind::Enum),
        "enum_variant" => SyntaxKind::Declaration(DeclKind::EnumMember),
        "field_declaration" => SyntaxKind::Declaration(DeclKind::Field),
        "let_declaration" | "const_item" | "static_item" => {
            SyntaxKind::Declaration(DeclKind::Variable)
        }
        "parameter" | "self_parameter" => SyntaxKind::Declaration(DeclKind::Parameter),
        "mod_item" => SyntaxKind::Declaration(DeclKind::Module),
        "call_expression" => SyntaxKind::Invocation,
        "attribute" => SyntaxKind::Attribute,
        "arguments" => SyntaxKind::ArgumentList,
        "token_tree" if parent == "attribute" => SyntaxKind::ArgumentList,
        "field_expression" | "scoped_identifier" => SyntaxKind::MemberAccess,
        "identifier" | "field_identifier" | "type_identifier" | "primitive_type"
        | "shorthand_field_identifier" | "self" | "super" | "crate" => SyntaxKind::Identifier,
        "integer_literal" | "float_literal" | "string_literal" | "raw_string_literal"
        | "char_literal" | "boolean_literal" => SyntaxKind::Literal,
        "block" | "declaration_list" | "field_declaration_list" | "enum_variant_list"
        | "match_block" => SyntaxKind::Block,
        "line_comment" | "block_comment" => SyntaxKind::Comment,
        "ERROR" => SyntaxKind::Error,
        "," => SyntaxKind::Separator,
        kind if !node.is_named() => {
            if kind.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
                SyntaxKind::Keyword
            } else {
                SyntaxKind::Punctuation
            }
        }
        _ => SyntaxKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_str(source: &str) -> SyntaxTree {
        let mut parser = new_parser().unwrap();
        parse(&mut parser, source).unwrap()
    }

    #[test]
    fn calls_get_target_and_arguments() {
        let source = "fn main() { add(1, 2); }";
        let tree = lower_str(source);
        let call = tree
            .iter()
            .find(|&n| tree.kind(n) == SyntaxKind::Invocation)
            .unwrap();
        let target = tree.child_with_role(call, Role::Target).unwrap();
        assert_eq!(tree.text(target, source), "add");
        let args = tree.child_with_role(call, Role::Arguments).unwrap();
        assert_eq!(tree.kind(args), SyntaxKind::ArgumentList);
        assert_eq!(tree.children_of_kind(args, SyntaxKind::Separator).count(), 1);
    }

    #[test]
    fn method_calls_are_member_access() {
        let source = "fn main() { v.push(1); }";
        let tree = lower_str(source);
        let access = tree
            .iter()
            .find(|&n| tree.kind(n) == SyntaxKind::MemberAccess)
            .unwrap();
        let receiver = tree.child_with_role(access, Role::Receiver).unwrap();
        let member = tree.child_with_role(access, Role::Member).unwrap();
        assert_eq!(tree.text(receiver, source), "v");
        assert_eq!(tree.text(member, source), "push");
    }

    #[test]
    fn broken_source_still_lowers() {
        let source = "fn main( { let = ; }";
        let tree = lower_str(source);
        assert_eq!(tree.kind(tree.root()), SyntaxKind::Root);
        assert!(tree
            .iter()
            .any(|n| tree.kind(n) == SyntaxKind::Error || tree.node(n).missing));
    }

    #[test]
    fn declarations_have_names() {
        let source = "struct Point { x: i32 }";
        let tree = lower_str(source);
        let decl = tree
            .iter()
            .find(|&n| tree.kind(n) == SyntaxKind::Declaration(DeclKind::Type))
            .unwrap();
        let name = tree.child_with_role(decl, Role::Name).unwrap();
        assert_eq!(tree.text(name, source), "Point");
    }

    #[test]
    fn empty_source_has_root() {
        let tree = lower_str("");
        assert_eq!(tree.kind(tree.root()), SyntaxKind::Root);
    }
}
