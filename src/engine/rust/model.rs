//! Name binding and type inference over one compiled buffer.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::{
    check_cancelled, display, CompletionCandidate, DocumentId, EngineDiagnostic, EngineResult,
    OutputKind, SemanticModel, StructuredDoc, SymbolDescriptor, SymbolId, SymbolKind, TypeRef,
};
use crate::syntax::{NodeId, Role, SyntaxKind, SyntaxTree};
use crate::text::{Edit, TextSpan};

use super::index::{type_base, Symbol, SymbolTable};
use super::{docs, format, Library};

/// Inference gives up past this many nested lookups.
const MAX_INFER_DEPTH: usize = 16;

#[derive(Copy, Clone, PartialEq)]
pub(super) enum Prefer {
    Method,
    Field,
    Any,
}

pub(crate) struct RustModel {
    pub(super) source: Arc<str>,
    pub(super) tree: Arc<SyntaxTree>,
    pub(super) library: Arc<Library>,
    pub(super) table: SymbolTable,
    /// Identifier token to the symbol it names.
    pub(super) bindings: HashMap<NodeId, SymbolId>,
    pub(super) output: OutputKind,
    indent_width: usize,
}

impl RustModel {
    pub fn new(
        source: Arc<str>,
        tree: Arc<SyntaxTree>,
        library: Arc<Library>,
        table: SymbolTable,
        output: OutputKind,
        indent_width: usize,
    ) -> Self {
        let mut model = Self {
            source,
            tree,
            library,
            table,
            bindings: HashMap::new(),
            output,
            indent_width,
        };
        model.bindings = model.bind_all();
        model
    }

    fn bind_all(&self) -> HashMap<NodeId, SymbolId> {
        self.tree
            .tokens()
            .iter()
            .copied()
            .filter(|&t| self.tree.kind(t) == SyntaxKind::Identifier)
            .filter_map(|t| self.resolve_token(t).map(|id| (t, id)))
            .collect()
    }

    pub(super) fn text(&self, node: NodeId) -> &str {
        self.tree.text(node, &self.source)
    }

    pub(super) fn symbol_ref(&self, id: SymbolId) -> Option<&Symbol> {
        if id.0 < self.table.base() {
            self.library.table.get(id)
        } else {
            self.table.get(id)
        }
    }

    fn desc(&self, id: SymbolId) -> Option<SymbolDescriptor> {
        self.symbol_ref(id).map(|s| s.desc.clone())
    }

    fn is_source_symbol(&self, id: SymbolId) -> bool {
        id.0 >= self.table.base()
    }

    /// Free items named `name`, source first.
    pub(super) fn globals<'a>(&'a self, name: &str) -> impl Iterator<Item = SymbolId> + 'a {
        self.table
            .globals(name)
            .iter()
            .chain(self.library.table.globals(name))
            .copied()
    }

    /// Members of `container`, source first.
    pub(super) fn members<'a>(&'a self, container: &str) -> impl Iterator<Item = SymbolId> + 'a {
        self.table
            .members(container)
            .iter()
            .chain(self.library.table.members(container))
            .copied()
    }

    /// Locals, parameters and local functions visible at `offset`.
    pub(super) fn visible_locals(&self, offset: usize) -> impl Iterator<Item = &Symbol> + '_ {
        self.table
            .locals()
            .iter()
            .filter_map(|&id| self.table.get(id))
            .filter(move |s| s.scope.is_some_and(|scope| scope.touches(offset)))
    }

    /// Innermost local named `name`, else a free item.
    pub(super) fn resolve_name(&self, name: &str, offset: usize) -> Option<SymbolId> {
        let local = self
            .visible_locals(offset)
            .filter(|s| s.desc.name == name)
            .max_by_key(|s| s.scope.map(|sc| sc.start).unwrap_or(0));
        local
            .map(Symbol::id)
            .or_else(|| self.globals(name).next())
    }

    fn is_type_like(symbol: &Symbol) -> bool {
        matches!(
            symbol.desc.kind,
            SymbolKind::NamedType(_) | SymbolKind::Other("mod")
        )
    }

    pub(super) fn resolve_type_name(&self, name: &str, offset: usize) -> Option<SymbolId> {
        if name == "Self" {
            let ty = self.self_type_at(offset)?;
            return self.resolve_type_name(&ty, offset);
        }
        self.globals(name)
            .find(|&id| self.symbol_ref(id).is_some_and(Self::is_type_like))
    }

    fn variant_named(&self, name: &str) -> Option<SymbolId> {
        self.table
            .iter()
            .chain(self.library.table.iter())
            .find(|s| s.desc.kind == SymbolKind::Other("") && s.desc.name == name)
            .map(Symbol::id)
    }

    /// Type named by the enclosing `impl` or `trait` block.
    pub(super) fn self_type_at(&self, offset: usize) -> Option<String> {
        let node = self.tree.covering_node(offset)?;
        let owner = self
            .tree
            .ancestors(node)
            .find(|&a| matches!(self.tree.raw_kind(a), "impl_item" | "trait_item"))?;
        let role = if self.tree.raw_kind(owner) == "impl_item" {
            Role::Type
        } else {
            Role::Name
        };
        let ty = self.tree.child_with_role(owner, role)?;
        Some(type_base(self.text(ty)))
    }

    /// Container name a path expression denotes, if it is a type or module.
    pub(super) fn container_of_path(&self, path: NodeId) -> Option<String> {
        let offset = self.tree.span(path).start;
        let name = match self.tree.raw_kind(path) {
            "identifier" | "type_identifier" | "primitive_type" => self.text(path).to_string(),
            "scoped_identifier" => self.text(self.tree.child_with_role(path, Role::Member)?).to_string(),
            "scoped_type_identifier" => self.text(self.tree.child_with_role(path, Role::Name)?).to_string(),
            "generic_type" => return self.container_of_path(self.tree.child_with_role(path, Role::Type)?),
            _ => return None,
        };
        if name == "Self" {
            return self.self_type_at(offset);
        }
        let known = self.resolve_type_name(&name, offset).is_some()
            || self.members(&name).next().is_some();
        known.then_some(name)
    }

    pub(super) fn member_named(&self, container: &str, name: &str, prefer: Prefer) -> Option<SymbolId> {
        let candidates: Vec<&Symbol> = self
            .members(container)
            .filter_map(|id| self.symbol_ref(id))
            .filter(|s| s.desc.name == name)
            .collect();
        let preferred = candidates.iter().find(|s| match prefer {
            Prefer::Method => s.desc.kind == SymbolKind::Method,
            Prefer::Field => s.desc.kind != SymbolKind::Method,
            Prefer::Any => true,
        });
        preferred.or(candidates.first()).map(|s| s.id())
    }

    /// The symbol an identifier token names.
    fn resolve_token(&self, token: NodeId) -> Option<SymbolId> {
        if let Some(id) = self.table.declared_by_name(token) {
            return Some(id);
        }
        let tree = &*self.tree;
        let name = self.text(token);
        let offset = tree.span(token).start;
        let parent = tree.parent(token);
        let parent_raw = parent.map(|p| tree.raw_kind(p)).unwrap_or("");
        let role = tree.role(token);

        match tree.raw_kind(token) {
            "self" => self.resolve_name("self", offset),
            "primitive_type" => self.resolve_type_name(name, offset),
            "type_identifier" => {
                if parent_raw == "scoped_type_identifier" && role == Some(Role::Name) {
                    let path = parent.and_then(|p| tree.child_with_role(p, Role::Field("path")));
                    if let Some(container) = path.and_then(|p| self.container_of_path(p)) {
                        if let Some(id) = self.member_named(&container, name, Prefer::Any) {
                            return Some(id);
                        }
                    }
                }
                self.resolve_type_name(name, offset)
            }
            "field_identifier" => match parent_raw {
                "field_expression" => self.resolve_field_access(parent?),
                "field_initializer" => {
                    let ty = self.struct_name_above(token, "struct_expression", Role::Name)?;
                    self.member_named(&ty, name, Prefer::Field)
                }
                "field_pattern" => {
                    let ty = self.struct_name_above(token, "struct_pattern", Role::Type)?;
                    self.member_named(&ty, name, Prefer::Field)
                }
                _ => None,
            },
            "shorthand_field_identifier" => self.resolve_name(name, offset),
            "identifier" => {
                if parent_raw == "scoped_identifier" {
                    let scoped = parent?;
                    if role == Some(Role::Member) {
                        return match tree.child_with_role(scoped, Role::Receiver) {
                            Some(path) => {
                                let container = self.container_of_path(path)?;
                                self.member_named(&container, name, Prefer::Any)
                            }
                            None => self.resolve_name(name, offset),
                        };
                    }
                    return self
                        .resolve_type_name(name, offset)
                        .or_else(|| self.globals(name).next());
                }
                if parent_raw == "macro_invocation" {
                    return None;
                }
                if role == Some(Role::Type) {
                    return self
                        .resolve_type_name(name, offset)
                        .or_else(|| self.variant_named(name));
                }
                self.resolve_name(name, offset)
                    .or_else(|| self.variant_named(name))
            }
            _ => None,
        }
    }

    fn struct_name_above(&self, token: NodeId, raw: &str, role: Role) -> Option<String> {
        let owner = self
            .tree
            .ancestors(token)
            .find(|&a| self.tree.raw_kind(a) == raw)?;
        let name = self.text(self.tree.child_with_role(owner, role)?);
        if name == "Self" {
            self.self_type_at(self.tree.span(owner).start)
        } else {
            Some(type_base(name))
        }
    }

    fn resolve_field_access(&self, access: NodeId) -> Option<SymbolId> {
        let receiver = self.tree.child_with_role(access, Role::Receiver)?;
        let member = self.tree.child_with_role(access, Role::Member)?;
        let ty = self.infer(receiver, 0)?;
        let is_call = self.tree.role(access) == Some(Role::Target);
        let prefer = if is_call { Prefer::Method } else { Prefer::Field };
        self.member_named(&type_base(ty.as_str()), self.text(member), prefer)
    }

    /// Symbol bound at `node`: the token binding, or the binding of the
    /// node's naming child.
    pub(super) fn bound_id(&self, node: NodeId) -> Option<SymbolId> {
        if let Some(&id) = self.bindings.get(&node) {
            return Some(id);
        }
        let tree = &*self.tree;
        if tree.kind(node) == SyntaxKind::Identifier {
            return self.resolve_token(node);
        }
        let child = match tree.raw_kind(node) {
            "field_expression" | "scoped_identifier" => tree.child_with_role(node, Role::Member),
            "call_expression" => tree.child_with_role(node, Role::Target),
            "generic_function" => tree.child_with_role(node, Role::Field("function")),
            "scoped_type_identifier" => tree.child_with_role(node, Role::Name),
            "generic_type" => tree.child_with_role(node, Role::Type),
            _ => None,
        }?;
        self.bound_id(child)
    }

    /// Type of a symbol used as a value.
    pub(super) fn symbol_type(&self, id: SymbolId, depth: usize) -> Option<TypeRef> {
        let symbol = self.symbol_ref(id)?;
        match &symbol.desc.kind {
            SymbolKind::Local | SymbolKind::Parameter => symbol.desc.ty.clone().or_else(|| {
                let init = symbol.init.filter(|_| self.is_source_symbol(id))?;
                self.infer(init, depth + 1)
            }),
            SymbolKind::Field | SymbolKind::Property | SymbolKind::Other(_) => symbol.desc.ty.clone(),
            SymbolKind::NamedType(_) => Some(TypeRef::new(&symbol.desc.name)),
            SymbolKind::Method => None,
        }
    }

    /// Type produced by calling `id`: a function's return type, a tuple
    /// struct, or the enum of a tuple variant.
    pub(super) fn return_type(&self, id: SymbolId) -> Option<TypeRef> {
        let symbol = self.symbol_ref(id)?;
        match &symbol.desc.kind {
            SymbolKind::Method => {
                let ret = symbol.desc.return_type.as_ref()?;
                Some(match &symbol.desc.container {
                    Some(container) => TypeRef::new(&replace_word(ret.as_str(), "Self", container)),
                    None => ret.clone(),
                })
            }
            SymbolKind::NamedType(_) => Some(TypeRef::new(&symbol.desc.name)),
            SymbolKind::Other("") => symbol.desc.ty.clone(),
            _ => None,
        }
    }

    /// Static type of an expression node.
    pub(super) fn infer(&self, node: NodeId, depth: usize) -> Option<TypeRef> {
        if depth > MAX_INFER_DEPTH {
            return None;
        }
        let tree = &*self.tree;
        let text = self.text(node);
        match tree.raw_kind(node) {
            "integer_literal" => Some(TypeRef::new(literal_suffix(text, INT_SUFFIXES).unwrap_or("i32"))),
            "float_literal" => Some(TypeRef::new(literal_suffix(text, &["f32", "f64"]).unwrap_or("f64"))),
            "string_literal" | "raw_string_literal" => Some(TypeRef::new("&str")),
            "char_literal" => Some(TypeRef::new("char")),
            "boolean_literal" => Some(TypeRef::new("bool")),
            "identifier" | "self" | "shorthand_field_identifier" | "field_identifier"
            | "scoped_identifier" | "field_expression" => {
                let id = self.bound_id(node)?;
                self.symbol_type(id, depth + 1)
            }
            "call_expression" => {
                let target = tree.child_with_role(node, Role::Target)?;
                self.return_type(self.bound_id(target)?)
            }
            "struct_expression" => {
                let name = self.text(tree.child_with_role(node, Role::Name)?);
                if name == "Self" {
                    self.self_type_at(tree.span(node).start).map(|t| TypeRef::new(&t))
                } else {
                    Some(TypeRef::new(&type_base(name)))
                }
            }
            "reference_expression" => {
                let inner = self.infer(tree.child_with_role(node, Role::Value)?, depth + 1)?;
                let mutable = tree
                    .children(node)
                    .iter()
                    .any(|&c| tree.raw_kind(c) == "mutable_specifier");
                let prefix = if mutable { "&mut " } else { "&" };
                Some(TypeRef::new(&format!("{prefix}{inner}")))
            }
            "parenthesized_expression" => {
                let inner = tree
                    .children(node)
                    .iter()
                    .copied()
                    .find(|&c| tree.kind(c) != SyntaxKind::Punctuation)?;
                self.infer(inner, depth + 1)
            }
            "type_cast_expression" => tree
                .child_with_role(node, Role::Type)
                .map(|t| TypeRef::new(self.text(t))),
            "binary_expression" => {
                let op = tree
                    .child_with_role(node, Role::Field("operator"))
                    .map(|o| self.text(o))
                    .unwrap_or("");
                if matches!(op, "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||") {
                    Some(TypeRef::new("bool"))
                } else {
                    self.infer(tree.child_with_role(node, Role::Field("left"))?, depth + 1)
                }
            }
            "unary_expression" => {
                let children = tree.children(node);
                let op = children.first().map(|&c| self.text(c)).unwrap_or("");
                let operand = *children.last()?;
                let ty = self.infer(operand, depth + 1)?;
                if op == "*" {
                    let inner = ty.as_str().trim_start_matches('&');
                    Some(TypeRef::new(inner.strip_prefix("mut ").unwrap_or(inner)))
                } else {
                    Some(ty)
                }
            }
            "macro_invocation" => {
                let name = tree
                    .child_with_role(node, Role::Field("macro"))
                    .map(|m| self.text(m))?;
                (name == "format").then(|| TypeRef::new("String"))
            }
            _ => {
                // A token inside a literal.
                let parent = tree.parent(node)?;
                (tree.kind(node) == SyntaxKind::Literal && tree.kind(parent) == SyntaxKind::Literal)
                    .then(|| self.infer(parent, depth + 1))
                    .flatten()
            }
        }
    }

    fn function_has_receiver(&self, function: NodeId) -> bool {
        self.tree
            .child_with_role(function, Role::Parameters)
            .is_some_and(|params| {
                self.tree
                    .children(params)
                    .iter()
                    .any(|&p| self.tree.raw_kind(p) == "self_parameter")
            })
    }

    /// A field name that also names a local: `P { x }` in an initializer
    /// or a pattern.
    fn is_shorthand(&self, token: NodeId) -> bool {
        match self.tree.raw_kind(token) {
            "shorthand_field_identifier" => true,
            "identifier" => self
                .tree
                .parent(token)
                .is_some_and(|p| self.tree.raw_kind(p) == "shorthand_field_initializer"),
            _ => false,
        }
    }

    /// The field a shorthand token names.
    fn shorthand_field(&self, token: NodeId) -> Option<SymbolId> {
        let ty = if self.tree.raw_kind(token) == "shorthand_field_identifier" {
            self.struct_name_above(token, "struct_pattern", Role::Type)?
        } else {
            self.struct_name_above(token, "struct_expression", Role::Name)?
        };
        self.member_named(&ty, self.text(token), Prefer::Field)
    }

    /// Every in-document token bound to `id`, declaration names included.
    pub(super) fn references_to(&self, id: SymbolId) -> Vec<NodeId> {
        let mut tokens: Vec<NodeId> = self
            .bindings
            .iter()
            .filter(|(_, &bound)| bound == id)
            .map(|(&token, _)| token)
            .collect();
        tokens.sort_by_key(|&t| self.tree.span(t).start);
        tokens
    }
}

const INT_SUFFIXES: &[&str] = &[
    "u128", "i128", "usize", "isize", "u64", "i64", "u32", "i32", "u16", "i16", "u8", "i8",
];

fn literal_suffix<'a>(text: &str, suffixes: &[&'a str]) -> Option<&'a str> {
    suffixes.iter().copied().find(|s| text.ends_with(s))
}

/// Replace whole-word occurrences of `word`.
fn replace_word(text: &str, word: &str, with: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(word) {
        let before = rest[..pos].chars().last();
        let after = rest[pos + word.len()..].chars().next();
        let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        out.push_str(&rest[..pos]);
        if is_word(before) || is_word(after) {
            out.push_str(word);
        } else {
            out.push_str(with);
        }
        rest = &rest[pos + word.len()..];
    }
    out.push_str(rest);
    out
}

impl SemanticModel for RustModel {
    fn language_id(&self) -> &'static str {
        "rust"
    }

    fn document_text(&self, document: DocumentId) -> Option<Arc<str>> {
        match document {
            DocumentId::Source => Some(Arc::clone(&self.source)),
            DocumentId::Reference(i) => self
                .library
                .documents
                .get(i as usize)
                .map(|d| Arc::clone(&d.text)),
        }
    }

    fn diagnostics(&self, cancel: &CancellationToken) -> EngineResult<Vec<EngineDiagnostic>> {
        self.check(cancel)
    }

    fn symbol(&self, id: SymbolId) -> Option<SymbolDescriptor> {
        self.desc(id)
    }

    fn symbol_at(&self, offset: usize) -> Option<SymbolDescriptor> {
        let token = self.tree.token_touching(offset)?;
        self.bound_id(token).and_then(|id| self.desc(id))
    }

    fn declared_symbol(&self, node: NodeId) -> Option<SymbolDescriptor> {
        self.table.declared_by(node).and_then(|id| self.desc(id))
    }

    fn bound_symbol(&self, node: NodeId) -> Option<SymbolDescriptor> {
        self.bound_id(node).and_then(|id| self.desc(id))
    }

    fn type_of(&self, node: NodeId) -> Option<TypeRef> {
        self.infer(node, 0)
    }

    fn type_symbol(&self, ty: &TypeRef) -> Option<SymbolDescriptor> {
        let base = type_base(ty.as_str());
        self.globals(&base)
            .find(|&id| {
                self.symbol_ref(id)
                    .is_some_and(|s| matches!(s.desc.kind, SymbolKind::NamedType(_)))
            })
            .and_then(|id| self.desc(id))
    }

    fn find_declaration(&self, symbol: &SymbolDescriptor) -> Option<SymbolDescriptor> {
        // Bindings already point at declarations.
        self.desc(symbol.id)
    }

    fn doc_comment(&self, symbol: &SymbolDescriptor) -> Option<StructuredDoc> {
        let text = self.symbol_ref(symbol.id)?.doc.as_deref()?;
        let doc = docs::parse(text);
        (!doc.is_empty()).then_some(doc)
    }

    fn member_group(&self, node: NodeId) -> Vec<SymbolDescriptor> {
        let tree = &*self.tree;
        let ids: Vec<SymbolId> = match tree.raw_kind(node) {
            "identifier" => {
                let name = self.text(node);
                let offset = tree.span(node).start;
                self.visible_locals(offset)
                    .filter(|s| s.desc.name == name && s.desc.kind == SymbolKind::Method)
                    .map(Symbol::id)
                    .chain(self.globals(name))
                    .collect()
            }
            "field_expression" => {
                let (Some(receiver), Some(member)) = (
                    tree.child_with_role(node, Role::Receiver),
                    tree.child_with_role(node, Role::Member),
                ) else {
                    return Vec::new();
                };
                let Some(ty) = self.infer(receiver, 0) else {
                    return Vec::new();
                };
                let name = self.text(member);
                self.members(&type_base(ty.as_str()))
                    .filter(|&id| self.symbol_ref(id).is_some_and(|s| s.desc.name == name))
                    .collect()
            }
            "scoped_identifier" => {
                let (Some(path), Some(member)) = (
                    tree.child_with_role(node, Role::Receiver),
                    tree.child_with_role(node, Role::Member),
                ) else {
                    return Vec::new();
                };
                let Some(container) = self.container_of_path(path) else {
                    return Vec::new();
                };
                let name = self.text(member);
                self.members(&container)
                    .filter(|&id| self.symbol_ref(id).is_some_and(|s| s.desc.name == name))
                    .collect()
            }
            "generic_function" => {
                return tree
                    .child_with_role(node, Role::Field("function"))
                    .map(|f| self.member_group(f))
                    .unwrap_or_default();
            }
            _ => Vec::new(),
        };
        ids.into_iter()
            .filter_map(|id| self.desc(id))
            .filter(|d| d.kind == SymbolKind::Method)
            .collect()
    }

    fn bind_as_expression(&self, node: NodeId) -> Option<SymbolDescriptor> {
        if self.tree.kind(node) == SyntaxKind::Literal {
            return None;
        }
        self.bound_id(node).and_then(|id| self.desc(id))
    }

    fn bind_as_type(&self, node: NodeId) -> Option<TypeRef> {
        self.container_of_path(node).map(|name| TypeRef::new(&name))
    }

    fn is_static_context(&self, node: NodeId) -> bool {
        match self
            .tree
            .ancestors(node)
            .find(|&a| self.tree.raw_kind(a) == "function_item")
        {
            Some(function) => !self.function_has_receiver(function),
            None => true,
        }
    }

    fn completions(
        &self,
        offset: usize,
        cancel: &CancellationToken,
    ) -> EngineResult<Vec<CompletionCandidate>> {
        check_cancelled(cancel)?;
        Ok(self.complete(offset))
    }

    fn describe(&self, candidate: &CompletionCandidate) -> Option<String> {
        let Some(id) = candidate.symbol else {
            return Some(format!("{} Keyword", candidate.label));
        };
        let symbol = self.symbol_ref(id)?;
        let mut text = display::render_declaration(&symbol.desc)?;
        let summary = symbol
            .doc
            .as_deref()
            .map(docs::parse)
            .and_then(|d| d.summary);
        if let Some(summary) = summary {
            text.push('\n');
            text.push_str(&summary.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        Some(text)
    }

    fn format_edits(
        &self,
        span: Option<TextSpan>,
        cancel: &CancellationToken,
    ) -> EngineResult<Vec<Edit>> {
        check_cancelled(cancel)?;
        Ok(format::format_edits(&self.source, span, self.indent_width))
    }

    fn rename(
        &self,
        symbol: &SymbolDescriptor,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<BTreeMap<DocumentId, Vec<Edit>>> {
        check_cancelled(cancel)?;
        let references = self.references_to(symbol.id);
        let mut edits: Vec<Edit> = references
            .iter()
            .map(|&token| {
                let span = self.tree.span(token);
                // `P { x }` keeps naming the field.
                let text = if self.is_shorthand(token) {
                    format!("{}: {new_name}", self.text(token))
                } else {
                    new_name.to_string()
                };
                Edit::new(span, text)
            })
            .collect();

        if symbol.kind == SymbolKind::Field {
            for &token in self.tree.tokens() {
                if references.contains(&token) || !self.is_shorthand(token) {
                    continue;
                }
                if self.shorthand_field(token) == Some(symbol.id) {
                    let local = self.text(token);
                    edits.push(Edit::new(self.tree.span(token), format!("{new_name}: {local}")));
                }
            }
            edits.sort_by_key(|e| e.span.start);
        }

        let mut changes = BTreeMap::new();
        if !edits.is_empty() {
            changes.insert(DocumentId::Source, edits);
        }
        Ok(changes)
    }
}
