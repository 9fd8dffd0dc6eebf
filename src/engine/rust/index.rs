//! Declaration index: every symbol a file declares, with its scope.

use std::collections::HashMap;

use crate::engine::{
    Accessibility, DocumentId, Modifiers, ParameterInfo, SourceLocation, SymbolDescriptor,
    SymbolId, SymbolKind, TypeKind, TypeRef,
};
use crate::syntax::{NodeId, Role, SyntaxKind, SyntaxTree};
use crate::text::TextSpan;

use super::docs;

/// A declared symbol plus what the model needs to resolve against it.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub desc: SymbolDescriptor,
    /// Raw doc comment body.
    pub doc: Option<String>,
    pub name_span: TextSpan,
    /// Declaring node, in the tree of the declaring document.
    pub decl: Option<NodeId>,
    /// Visible range for locals, parameters and local functions.
    pub scope: Option<TextSpan>,
    /// Initializer of a `let` binding.
    pub init: Option<NodeId>,
    /// Member of an `impl Trait for Type` block.
    pub trait_impl: bool,
}

impl Symbol {
    pub fn id(&self) -> SymbolId {
        self.desc.id
    }

    /// A `let`-bound local, the only kind checked for use.
    pub fn is_let_binding(&self, tree: &SyntaxTree) -> bool {
        self.desc.kind == SymbolKind::Local
            && self
                .decl
                .is_some_and(|d| tree.raw_kind(d) == "let_declaration")
    }
}

/// Symbols from one or more documents, with name lookups.
#[derive(Debug, Default)]
pub struct SymbolTable {
    base: u32,
    symbols: Vec<Symbol>,
    /// Free items by name.
    globals: HashMap<String, Vec<SymbolId>>,
    /// Associated items, fields and variants by container name.
    members: HashMap<String, Vec<SymbolId>>,
    /// Symbols with a lexical scope.
    locals: Vec<SymbolId>,
    /// Name token of a declaration, to its symbol. Source documents only.
    names: HashMap<NodeId, SymbolId>,
    /// Declaration node, to the first symbol it declares. Source documents only.
    decls: HashMap<NodeId, SymbolId>,
}

impl SymbolTable {
    /// An empty table whose ids start at `base`.
    pub fn new(base: u32) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        let idx = id.0.checked_sub(self.base)?;
        self.symbols.get(idx as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn globals(&self, name: &str) -> &[SymbolId] {
        self.globals.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_globals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.globals.values().flatten().copied()
    }

    pub fn members(&self, container: &str) -> &[SymbolId] {
        self.members.get(container).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn locals(&self) -> &[SymbolId] {
        &self.locals
    }

    pub fn declared_by_name(&self, token: NodeId) -> Option<SymbolId> {
        self.names.get(&token).copied()
    }

    pub fn declared_by(&self, decl: NodeId) -> Option<SymbolId> {
        self.decls.get(&decl).copied()
    }

    /// Whether `token` is the name of a declaration.
    pub fn is_declaration_name(&self, token: NodeId) -> bool {
        self.names.contains_key(&token)
    }

    /// Index every declaration in `tree`.
    pub fn add_document(&mut self, tree: &SyntaxTree, source: &str, document: DocumentId) {
        let mut indexer = Indexer {
            table: self,
            tree,
            source,
            document,
        };
        for node in tree.iter() {
            indexer.visit(node);
        }
    }

    fn push(&mut self, mut symbol: Symbol, place: Place, names: Option<(NodeId, NodeId)>, track: bool) -> SymbolId {
        let id = SymbolId(self.base + self.symbols.len() as u32);
        symbol.desc.id = id;
        let name = symbol.desc.name.clone();
        match place {
            Place::Global => self.globals.entry(name).or_default().push(id),
            Place::Member(container) => self.members.entry(container).or_default().push(id),
            Place::Scoped => self.locals.push(id),
        }
        if let (Some((token, decl)), true) = (names, track) {
            self.names.insert(token, id);
            self.decls.entry(decl).or_insert(id);
        }
        self.symbols.push(symbol);
        id
    }
}

enum Place {
    Global,
    Member(String),
    Scoped,
}

/// What encloses a declaration.
enum Container {
    TopLevel,
    Module(String),
    Impl { ty: String, trait_impl: bool },
    Trait(String),
    /// Inside a function body.
    Body,
}

struct Indexer<'a> {
    table: &'a mut SymbolTable,
    tree: &'a SyntaxTree,
    source: &'a str,
    document: DocumentId,
}

impl Indexer<'_> {
    fn visit(&mut self, node: NodeId) {
        match self.tree.raw_kind(node) {
            "function_item" | "function_signature_item" => self.function(node),
            "struct_item" => self.named_type(node, TypeKind::Struct),
            "union_item" => self.named_type(node, TypeKind::Union),
            "enum_item" => self.named_type(node, TypeKind::Enum),
            "trait_item" => self.named_type(node, TypeKind::Trait),
            "type_item" => self.named_type(node, TypeKind::Alias),
            "field_declaration" => self.field(node),
            "enum_variant" => self.variant(node),
            "const_item" => self.constant(node, "const"),
            "static_item" => self.constant(node, "static"),
            "mod_item" => self.module(node),
            "let_declaration" => self.let_binding(node),
            "parameter" => self.parameter(node),
            "self_parameter" => self.self_parameter(node),
            "closure_expression" => self.closure(node),
            "for_expression" => self.scoped_pattern(node, Role::Pattern, Role::Body),
            "match_arm" => self.match_arm(node),
            "let_condition" => self.let_condition(node),
            _ => {}
        }
    }

    fn text(&self, node: NodeId) -> &str {
        self.tree.text(node, self.source)
    }

    fn role_text(&self, node: NodeId, role: Role) -> Option<String> {
        self.tree
            .child_with_role(node, role)
            .map(|c| self.text(c).to_string())
    }

    fn child_raw(&self, node: NodeId, raw: &str) -> Option<NodeId> {
        self.tree
            .children(node)
            .iter()
            .copied()
            .find(|&c| self.tree.raw_kind(c) == raw)
    }

    fn new_symbol(&self, name: &str, kind: SymbolKind, name_span: TextSpan, decl: NodeId) -> Symbol {
        Symbol {
            desc: SymbolDescriptor {
                id: SymbolId(0),
                name: name.to_string(),
                kind,
                accessibility: Accessibility::Private,
                modifiers: Modifiers::default(),
                ty: None,
                container: None,
                type_parameters: Vec::new(),
                receiver: None,
                parameters: Vec::new(),
                return_type: None,
                locations: vec![SourceLocation {
                    document: self.document,
                    span: name_span,
                }],
            },
            doc: None,
            name_span,
            decl: Some(decl),
            scope: None,
            init: None,
            trait_impl: false,
        }
    }

    fn push(&mut self, symbol: Symbol, place: Place, name_token: NodeId, decl: NodeId) -> SymbolId {
        let track = self.document == DocumentId::Source;
        self.table.push(symbol, place, Some((name_token, decl)), track)
    }

    fn container(&self, node: NodeId) -> Container {
        for ancestor in self.tree.ancestors(node).skip(1) {
            match self.tree.raw_kind(ancestor) {
                "impl_item" => {
                    let ty = self
                        .role_text(ancestor, Role::Type)
                        .map(|t| type_base(&t))
                        .unwrap_or_default();
                    let trait_impl = self
                        .tree
                        .child_with_role(ancestor, Role::Field("trait"))
                        .is_some();
                    return Container::Impl { ty, trait_impl };
                }
                "trait_item" => {
                    return Container::Trait(self.role_text(ancestor, Role::Name).unwrap_or_default())
                }
                "mod_item" => {
                    return Container::Module(self.role_text(ancestor, Role::Name).unwrap_or_default())
                }
                "function_item" | "closure_expression" => return Container::Body,
                _ => {}
            }
        }
        Container::TopLevel
    }

    fn enclosing_block(&self, node: NodeId) -> Option<TextSpan> {
        self.tree
            .ancestors(node)
            .skip(1)
            .find(|&a| self.tree.raw_kind(a) == "block")
            .map(|a| self.tree.span(a))
    }

    fn visibility(&self, node: NodeId) -> Accessibility {
        let Some(vis) = self.child_raw(node, "visibility_modifier") else {
            return Accessibility::Private;
        };
        let text: String = self.text(vis).split_whitespace().collect::<Vec<_>>().join(" ");
        match text.as_str() {
            "pub" => Accessibility::Public,
            "pub(crate)" => Accessibility::Internal,
            "pub(self)" => Accessibility::Private,
            other => {
                let inner = other
                    .trim_start_matches("pub")
                    .trim()
                    .trim_start_matches('(')
                    .trim_end_matches(')')
                    .trim();
                Accessibility::Restricted(inner.to_string())
            }
        }
    }

    /// Doc comments directly above `node`, looking through attributes.
    fn docs(&self, node: NodeId) -> Option<String> {
        let parent = self.tree.parent(node)?;
        let siblings = self.tree.children(parent);
        let idx = siblings.iter().position(|&s| s == node)?;
        let mut comments = Vec::new();
        for &sibling in siblings[..idx].iter().rev() {
            match self.tree.raw_kind(sibling) {
                "line_comment" | "block_comment" => comments.push(self.text(sibling)),
                "attribute_item" => {}
                _ => break,
            }
        }
        comments.reverse();
        docs::doc_text(comments)
    }

    fn type_parameters(&self, node: NodeId) -> Vec<String> {
        let Some(params) = self.tree.child_with_role(node, Role::Field("type_parameters")) else {
            return Vec::new();
        };
        self.tree
            .children(params)
            .iter()
            .filter(|&&c| {
                !matches!(
                    self.tree.kind(c),
                    SyntaxKind::Punctuation | SyntaxKind::Separator | SyntaxKind::Comment
                )
            })
            .map(|&c| self.text(c).to_string())
            .collect()
    }

    /// Where a non-local item goes, its container name and accessibility.
    fn placement(&self, node: NodeId) -> (Place, Option<String>, Accessibility, bool) {
        let declared = self.visibility(node);
        match self.container(node) {
            Container::TopLevel | Container::Body => (Place::Global, None, declared, false),
            Container::Module(m) => (Place::Member(m.clone()), Some(m), declared, false),
            Container::Impl { ty, trait_impl } => {
                let access = if trait_impl {
                    Accessibility::Public
                } else {
                    declared
                };
                (Place::Member(ty.clone()), Some(ty), access, trait_impl)
            }
            Container::Trait(t) => (Place::Member(t.clone()), Some(t), Accessibility::Public, false),
        }
    }

    fn function(&mut self, node: NodeId) {
        let Some(name_node) = self.tree.child_with_role(node, Role::Name) else {
            return;
        };
        let name = self.text(name_node).to_string();
        let mut sym = self.new_symbol(&name, SymbolKind::Method, self.tree.span(name_node), node);
        sym.doc = self.docs(node);
        sym.desc.type_parameters = self.type_parameters(node);
        sym.desc.return_type = self
            .role_text(node, Role::ReturnType)
            .map(|t| TypeRef::new(&t));

        if let Some(params) = self.tree.child_with_role(node, Role::Parameters) {
            for &p in self.tree.children(params) {
                match self.tree.raw_kind(p) {
                    "parameter" => sym.desc.parameters.push(ParameterInfo {
                        name: self.role_text(p, Role::Pattern).unwrap_or_default(),
                        ty: self.role_text(p, Role::Type).map(|t| TypeRef::new(&t)),
                        default_value: None,
                    }),
                    "self_parameter" => {
                        sym.desc.receiver = Some(collapse_ws(self.text(p)));
                    }
                    _ => {}
                }
            }
        }

        if let Some(mods) = self.child_raw(node, "function_modifiers") {
            let text = self.text(mods);
            let has = |word: &str| text.split_whitespace().any(|w| w == word);
            sym.desc.modifiers.is_async = has("async");
            sym.desc.modifiers.is_const = has("const");
            sym.desc.modifiers.is_unsafe = has("unsafe");
        }
        sym.desc.modifiers.is_static = sym.desc.receiver.is_none();

        let place = if let Container::Body = self.container(node) {
            sym.desc.modifiers.is_local_function = true;
            sym.scope = self.enclosing_block(node);
            Place::Scoped
        } else {
            let (place, container, access, trait_impl) = self.placement(node);
            sym.desc.container = container;
            sym.desc.accessibility = access;
            sym.trait_impl = trait_impl;
            place
        };
        self.push(sym, place, name_node, node);
    }

    fn named_type(&mut self, node: NodeId, kind: TypeKind) {
        let Some(name_node) = self.tree.child_with_role(node, Role::Name) else {
            return;
        };
        let name = self.text(name_node).to_string();
        let mut sym = self.new_symbol(
            &name,
            SymbolKind::NamedType(kind),
            self.tree.span(name_node),
            node,
        );
        sym.doc = self.docs(node);
        sym.desc.type_parameters = self.type_parameters(node);
        if kind == TypeKind::Alias {
            sym.desc.ty = self.role_text(node, Role::Type).map(|t| TypeRef::new(&t));
        }
        let (place, container, access, _) = match self.container(node) {
            Container::Module(m) => (Place::Member(m.clone()), Some(m), self.visibility(node), false),
            Container::Impl { ty, .. } => (Place::Member(ty.clone()), Some(ty), self.visibility(node), true),
            _ => (Place::Global, None, self.visibility(node), false),
        };
        sym.desc.container = container;
        sym.desc.accessibility = access;
        self.push(sym, place, name_node, node);

        // Tuple struct fields are positional.
        if let Some(body) = self.tree.child_with_role(node, Role::Body) {
            if self.tree.raw_kind(body) == "ordered_field_declaration_list" {
                self.tuple_fields(body, &name);
            }
        }
    }

    fn tuple_fields(&mut self, body: NodeId, owner: &str) {
        let types: Vec<NodeId> = self
            .tree
            .children(body)
            .iter()
            .copied()
            .filter(|&c| self.tree.role(c) == Some(Role::Type))
            .collect();
        for (i, ty) in types.into_iter().enumerate() {
            let mut sym = self.new_symbol(&i.to_string(), SymbolKind::Field, self.tree.span(ty), body);
            sym.desc.ty = Some(TypeRef::new(self.text(ty)));
            sym.desc.container = Some(owner.to_string());
            sym.desc.accessibility = Accessibility::Public;
            self.table
                .push(sym, Place::Member(owner.to_string()), None, false);
        }
    }

    fn owner_name(&self, node: NodeId, kinds: &[&str]) -> Option<String> {
        let owner = self
            .tree
            .ancestors(node)
            .skip(1)
            .find(|&a| kinds.contains(&self.tree.raw_kind(a)))?;
        self.role_text(owner, Role::Name)
    }

    fn field(&mut self, node: NodeId) {
        let Some(name_node) = self.tree.child_with_role(node, Role::Name) else {
            return;
        };
        let Some(owner) = self.owner_name(node, &["struct_item", "union_item"]) else {
            return;
        };
        let name = self.text(name_node).to_string();
        let mut sym = self.new_symbol(&name, SymbolKind::Field, self.tree.span(name_node), node);
        sym.doc = self.docs(node);
        sym.desc.ty = self.role_text(node, Role::Type).map(|t| TypeRef::new(&t));
        sym.desc.container = Some(owner.clone());
        sym.desc.accessibility = self.visibility(node);
        self.push(sym, Place::Member(owner), name_node, node);
    }

    fn variant(&mut self, node: NodeId) {
        let Some(name_node) = self.tree.child_with_role(node, Role::Name) else {
            return;
        };
        let Some(owner) = self.owner_name(node, &["enum_item"]) else {
            return;
        };
        let name = self.text(name_node).to_string();
        let mut sym = self.new_symbol(&name, SymbolKind::Other(""), self.tree.span(name_node), node);
        sym.doc = self.docs(node);
        sym.desc.container = Some(owner.clone());
        sym.desc.ty = Some(TypeRef::new(&owner));
        self.push(sym, Place::Member(owner), name_node, node);
    }

    fn constant(&mut self, node: NodeId, keyword: &'static str) {
        let Some(name_node) = self.tree.child_with_role(node, Role::Name) else {
            return;
        };
        let name = self.text(name_node).to_string();
        let mut sym = self.new_symbol(&name, SymbolKind::Other(keyword), self.tree.span(name_node), node);
        sym.doc = self.docs(node);
        sym.desc.ty = self.role_text(node, Role::Type).map(|t| TypeRef::new(&t));
        let mutable = self.child_raw(node, "mutable_specifier").is_some();
        sym.desc.modifiers = Modifiers {
            is_static: true,
            is_const: keyword == "const",
            is_readonly: !mutable,
            ..Modifiers::default()
        };
        let place = if let Container::Body = self.container(node) {
            sym.scope = self.enclosing_block(node);
            Place::Scoped
        } else {
            let (place, container, access, trait_impl) = self.placement(node);
            sym.desc.container = container;
            sym.desc.accessibility = access;
            sym.trait_impl = trait_impl;
            place
        };
        self.push(sym, place, name_node, node);
    }

    fn module(&mut self, node: NodeId) {
        let Some(name_node) = self.tree.child_with_role(node, Role::Name) else {
            return;
        };
        let name = self.text(name_node).to_string();
        let mut sym = self.new_symbol(&name, SymbolKind::Other("mod"), self.tree.span(name_node), node);
        sym.doc = self.docs(node);
        sym.desc.accessibility = self.visibility(node);
        let place = match self.container(node) {
            Container::Module(m) => {
                sym.desc.container = Some(m.clone());
                Place::Member(m)
            }
            _ => Place::Global,
        };
        self.push(sym, place, name_node, node);
    }

    /// Bind every name in `pattern` as a local visible in `scope`.
    fn bind_pattern(
        &mut self,
        pattern: NodeId,
        decl: NodeId,
        scope: Option<TextSpan>,
        ty: Option<TypeRef>,
        init: Option<NodeId>,
        kind: SymbolKind,
    ) {
        let decl_mutable = self.child_raw(decl, "mutable_specifier").is_some();
        let bindings = pattern_bindings(self.tree, self.source, pattern);
        // Types and initializers only carry over to a lone binding.
        let single = bindings.len() == 1 && self.tree.span(bindings[0]) == self.tree.span(pattern);
        for token in bindings {
            let name = self.text(token).to_string();
            let mut sym = self.new_symbol(&name, kind.clone(), self.tree.span(token), decl);
            let mutable = decl_mutable
                || self
                    .tree
                    .parent(token)
                    .is_some_and(|p| self.tree.raw_kind(p) == "mut_pattern");
            sym.desc.modifiers.is_readonly = !mutable;
            sym.scope = scope;
            if single {
                sym.desc.ty = ty.clone();
                sym.init = init;
            }
            self.push(sym, Place::Scoped, token, decl);
        }
    }

    fn let_binding(&mut self, node: NodeId) {
        let Some(pattern) = self.tree.child_with_role(node, Role::Pattern) else {
            return;
        };
        let end = self.tree.span(node).end;
        let scope = self
            .enclosing_block(node)
            .map(|block| TextSpan::new(end.min(block.end), block.end));
        let ty = self.role_text(node, Role::Type).map(|t| TypeRef::new(&t));
        let init = self.tree.child_with_role(node, Role::Value);
        self.bind_pattern(pattern, node, scope, ty, init, SymbolKind::Local);
    }

    /// Scope of a parameter: the function or closure owning the list.
    fn parameter_scope(&self, node: NodeId) -> Option<TextSpan> {
        let list = self.tree.parent(node)?;
        let owner = self.tree.parent(list)?;
        Some(self.tree.span(owner))
    }

    fn parameter(&mut self, node: NodeId) {
        let Some(pattern) = self.tree.child_with_role(node, Role::Pattern) else {
            return;
        };
        let scope = self.parameter_scope(node);
        let ty = self.role_text(node, Role::Type).map(|t| TypeRef::new(&t));
        self.bind_pattern(pattern, node, scope, ty, None, SymbolKind::Parameter);
    }

    fn self_parameter(&mut self, node: NodeId) {
        let Some(token) = self.child_raw(node, "self") else {
            return;
        };
        let receiver = collapse_ws(self.text(node));
        let function = self
            .tree
            .ancestors(node)
            .find(|&a| self.tree.raw_kind(a) == "function_item")
            .unwrap_or(node);
        let owner = match self.container(function) {
            Container::Impl { ty, .. } => Some(ty),
            Container::Trait(t) => Some(t),
            _ => None,
        };
        let mut sym = self.new_symbol("self", SymbolKind::Parameter, self.tree.span(token), node);
        sym.scope = self.parameter_scope(node);
        sym.desc.modifiers.is_readonly = !receiver.starts_with("mut ");
        sym.desc.ty = owner.map(|owner| {
            let prefix = receiver
                .strip_suffix("self")
                .unwrap_or("")
                .trim_start_matches("mut ");
            TypeRef::new(&format!("{prefix}{owner}"))
        });
        self.push(sym, Place::Scoped, token, node);
    }

    fn closure(&mut self, node: NodeId) {
        let Some(params) = self.tree.child_with_role(node, Role::Parameters) else {
            return;
        };
        let scope = Some(self.tree.span(node));
        let bare: Vec<NodeId> = self
            .tree
            .children(params)
            .iter()
            .copied()
            .filter(|&c| self.tree.raw_kind(c) != "parameter")
            .filter(|&c| self.tree.kind(c) != SyntaxKind::Punctuation)
            .collect();
        for p in bare {
            self.bind_pattern(p, params, scope, None, None, SymbolKind::Parameter);
        }
    }

    fn scoped_pattern(&mut self, node: NodeId, pattern: Role, body: Role) {
        let (Some(pattern), Some(body)) = (
            self.tree.child_with_role(node, pattern),
            self.tree.child_with_role(node, body),
        ) else {
            return;
        };
        let scope = Some(self.tree.span(body));
        self.bind_pattern(pattern, node, scope, None, None, SymbolKind::Local);
    }

    fn match_arm(&mut self, node: NodeId) {
        let Some(pattern) = self.tree.child_with_role(node, Role::Pattern) else {
            return;
        };
        let scope = Some(self.tree.span(node));
        self.bind_pattern(pattern, node, scope, None, None, SymbolKind::Local);
    }

    fn let_condition(&mut self, node: NodeId) {
        let Some(pattern) = self.tree.child_with_role(node, Role::Pattern) else {
            return;
        };
        let owner = self
            .tree
            .ancestors(node)
            .skip(1)
            .find(|&a| matches!(self.tree.raw_kind(a), "if_expression" | "while_expression"));
        let scope = owner.map(|o| TextSpan::new(self.tree.span(node).end, self.tree.span(o).end));
        self.bind_pattern(pattern, node, scope, None, None, SymbolKind::Local);
    }
}

/// Identifier tokens a pattern binds.
///
/// Paths, struct names and capitalized bare names (unit variants such as
/// `None`) are not bindings.
pub fn pattern_bindings(tree: &SyntaxTree, source: &str, pattern: NodeId) -> Vec<NodeId> {
    let span = tree.span(pattern);
    tree.tokens()
        .iter()
        .copied()
        .filter(|&t| span.contains_span(tree.span(t)))
        .filter(|&t| tree.is_within(t, pattern))
        .filter(|&t| {
            let raw = tree.raw_kind(t);
            if !matches!(raw, "identifier" | "shorthand_field_identifier") {
                return false;
            }
            if tree.role(t) == Some(Role::Type) {
                return false;
            }
            if tree
                .parent(t)
                .is_some_and(|p| tree.raw_kind(p) == "scoped_identifier")
            {
                return false;
            }
            let name = tree.text(t, source);
            !name.starts_with(|c: char| c.is_ascii_uppercase())
        })
        .collect()
}

/// `&'a mut foo::Bar<T>` to `Bar`.
pub fn type_base(ty: &str) -> String {
    let mut rest = ty.trim();
    loop {
        let before = rest;
        rest = rest.trim_start_matches('&').trim_start();
        if rest.starts_with('\'') {
            rest = rest
                .split_once(char::is_whitespace)
                .map(|(_, r)| r)
                .unwrap_or("");
        }
        for prefix in ["mut ", "dyn ", "impl "] {
            rest = rest.strip_prefix(prefix).unwrap_or(rest).trim_start();
        }
        if rest == before {
            break;
        }
    }
    let head = rest.split('<').next().unwrap_or(rest);
    head.rsplit("::").next().unwrap_or(head).trim().to_string()
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rust::lower;

    fn table(source: &str) -> (SyntaxTree, SymbolTable) {
        let mut parser = lower::new_parser().unwrap();
        let tree = lower::parse(&mut parser, source).unwrap();
        let mut table = SymbolTable::new(0);
        table.add_document(&tree, source, DocumentId::Source);
        (tree, table)
    }

    fn find<'a>(table: &'a SymbolTable, name: &str) -> &'a Symbol {
        table.iter().find(|s| s.desc.name == name).unwrap()
    }

    #[test]
    fn type_base_strips_references_and_generics() {
        assert_eq!(type_base("&'a mut std::vec::Vec<T>"), "Vec");
        assert_eq!(type_base("&str"), "str");
        assert_eq!(type_base("Point"), "Point");
        assert_eq!(type_base("dyn Shape"), "Shape");
    }

    #[test]
    fn impl_methods_are_members() {
        let source = "struct Point { x: i32 }\nimpl Point {\n    /// Makes one.\n    pub fn new(x: i32) -> Self { Point { x } }\n    fn get(&self) -> i32 { self.x }\n}\n";
        let (_, table) = table(source);
        let new = find(&table, "new");
        assert_eq!(new.desc.container.as_deref(), Some("Point"));
        assert!(new.desc.modifiers.is_static);
        assert_eq!(new.desc.accessibility, Accessibility::Public);
        assert_eq!(new.doc.as_deref(), Some("Makes one."));
        let get = find(&table, "get");
        assert_eq!(get.desc.receiver.as_deref(), Some("&self"));
        assert!(!get.desc.modifiers.is_static);
        let members: Vec<_> = table
            .members("Point")
            .iter()
            .filter_map(|&id| table.get(id))
            .map(|s| s.desc.name.as_str())
            .collect();
        assert_eq!(members, vec!["x", "new", "get"]);
    }

    #[test]
    fn let_bindings_are_scoped() {
        let source = "fn main() {\n    let mut total: i64 = 0;\n    let (a, b) = (1, 2);\n}\n";
        let (_, table) = table(source);
        let total = find(&table, "total");
        assert_eq!(total.desc.kind, SymbolKind::Local);
        assert!(!total.desc.modifiers.is_readonly);
        assert_eq!(total.desc.ty.as_ref().map(|t| t.as_str()), Some("i64"));
        let scope = total.scope.unwrap();
        assert!(scope.start > source.find("total").unwrap());
        let a = find(&table, "a");
        assert!(a.desc.modifiers.is_readonly);
        assert!(a.desc.ty.is_none());
        assert!(table.globals("main").len() == 1);
    }

    #[test]
    fn parameters_and_self_get_types() {
        let source = "struct S;\nimpl S {\n    fn f(&mut self, n: usize) {}\n}\n";
        let (_, table) = table(source);
        let this = find(&table, "self");
        assert_eq!(this.desc.ty.as_ref().map(|t| t.as_str()), Some("&mut S"));
        let n = find(&table, "n");
        assert_eq!(n.desc.kind, SymbolKind::Parameter);
        assert_eq!(n.desc.ty.as_ref().map(|t| t.as_str()), Some("usize"));
    }

    #[test]
    fn enum_variants_belong_to_enum() {
        let source = "pub enum Color { Red, Green }\n";
        let (_, table) = table(source);
        let red = find(&table, "Red");
        assert_eq!(red.desc.container.as_deref(), Some("Color"));
        assert_eq!(table.members("Color").len(), 2);
    }

    #[test]
    fn pattern_bindings_skip_paths_and_variants() {
        let source = "fn f(o: Option<i32>) { match o { Some(x) => {}, None => {} } }";
        let (_, table) = table(source);
        assert!(table.iter().any(|s| s.desc.name == "x"));
        assert!(!table.iter().any(|s| s.desc.name == "Some" || s.desc.name == "None"));
    }
}
