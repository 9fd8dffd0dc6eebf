//! Symbols as the engine reports them.
//!
//! These are read-only descriptions. Providers consume them to render hover
//! text and signatures; nothing here is stored past the request.

use std::fmt;
use std::sync::Arc;

use crate::text::TextSpan;

/// Engine-assigned identity of a symbol within one semantic model.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolId(pub u32);

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// Which document a location lives in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum DocumentId {
    /// The buffer that came with the request.
    Source,
    /// A loaded reference, by its position in the reference set.
    Reference(u32),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SourceLocation {
    pub document: DocumentId,
    pub span: TextSpan,
}

/// A type as written, whitespace-normalized so equal types compare equal.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    pub fn new(text: &str) -> Self {
        Self(normalize_type(text).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drop whitespace except between two word characters, and put one space
/// after each comma that is not trailing.
fn normalize_type(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut after_comma = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if after_comma {
            if !matches!(c, ')' | '>' | ']') {
                out.push(' ');
            }
        } else if pending_space {
            let prev_word = out.chars().last().is_some_and(is_word_char);
            if prev_word && is_word_char(c) {
                out.push(' ');
            }
        }
        pending_space = false;
        after_comma = c == ',';
        out.push(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    /// Visible in the defining crate or assembly.
    Internal,
    /// Visible only to a named path.
    Restricted(String),
    #[default]
    Private,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Struct,
    Enum,
    Trait,
    Union,
    Alias,
}

/// Closed set of symbol kinds the providers know how to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Method,
    Local,
    Field,
    Property,
    NamedType(TypeKind),
    Parameter,
    /// Anything else, labelled with the keyword that introduces it.
    Other(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_const: bool,
    pub is_readonly: bool,
    pub is_async: bool,
    pub is_unsafe: bool,
    /// A function declared inside another function body.
    pub is_local_function: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub default_value: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SymbolDescriptor {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub accessibility: Accessibility,
    pub modifiers: Modifiers,
    /// Declared type of a variable, field, parameter or constant; target of an alias.
    pub ty: Option<TypeRef>,
    /// Display name of the containing type or module, if any.
    pub container: Option<String>,
    pub type_parameters: Vec<String>,
    /// `self`, `&self` or `&mut self` for methods taking a receiver.
    pub receiver: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: Option<TypeRef>,
    pub locations: Vec<SourceLocation>,
}

impl SymbolDescriptor {
    pub fn is_type(&self) -> bool {
        matches!(self.kind, SymbolKind::NamedType(_))
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }

    /// Locations inside the request buffer.
    pub fn source_locations(&self) -> impl Iterator<Item = &SourceLocation> {
        self.locations
            .iter()
            .filter(|l| l.document == DocumentId::Source)
    }

    /// The symbol as a type reference, for symbols that are types.
    pub fn as_type_ref(&self) -> Option<TypeRef> {
        self.is_type().then(|| TypeRef::new(&self.name))
    }
}

/// A doc comment split into the sections hover knows about. Text is raw:
/// markup is left for the renderer to strip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuredDoc {
    pub summary: Option<String>,
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
    pub remarks: Option<String>,
}

impl StructuredDoc {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.params.is_empty()
            && self.returns.is_none()
            && self.remarks.is_none()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }
}
