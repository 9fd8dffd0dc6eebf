//! Language-neutral syntax trees.
//!
//! Engines lower whatever concrete tree they produce into a [`SyntaxTree`]:
//! a flat arena of nodes, each with a parent link, a byte span, a coarse
//! [`SyntaxKind`] and the [`Role`] it plays in its parent. The query
//! providers only ever look at this shape, so "walk up from the token under
//! the cursor until something interesting shows up" is written once, here.

mod walk;

use std::fmt;

use crate::text::TextSpan;

pub use walk::Ancestors;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// What kind of declaration a node introduces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Variable,
    Field,
    Property,
    Parameter,
    Method,
    Type,
    Enum,
    EnumMember,
    Module,
}

/// Coarse classification of a node, shared by every engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Root,
    Declaration(DeclKind),
    /// A call: target expression plus argument list.
    Invocation,
    /// Object construction with an argument list.
    ObjectCreation,
    /// Attribute application with an argument list.
    Attribute,
    ArgumentList,
    /// `receiver.member` or `Path::member`.
    MemberAccess,
    /// `typeof(T)`-style expressions.
    TypeOf,
    Literal,
    Block,
    Identifier,
    /// Argument separator (a comma).
    Separator,
    Punctuation,
    Keyword,
    Comment,
    Error,
    Other,
}

impl SyntaxKind {
    pub fn is_declaration(self) -> bool {
        matches!(self, SyntaxKind::Declaration(_))
    }

    /// Nodes that own an argument list.
    pub fn is_argument_bearing(self) -> bool {
        matches!(
            self,
            SyntaxKind::Invocation | SyntaxKind::ObjectCreation | SyntaxKind::Attribute
        )
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Comment)
    }
}

/// The slot a node fills in its parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Callee of an invocation.
    Target,
    /// Argument list of an invocation, construction or attribute.
    Arguments,
    /// Left-hand side of a member access.
    Receiver,
    /// Right-hand side of a member access.
    Member,
    /// Declared name of a declaration.
    Name,
    /// Binding pattern of a variable or parameter declaration.
    Pattern,
    Type,
    Parameters,
    ReturnType,
    Body,
    Value,
    /// Any other named slot, by the engine's own field name.
    Field(&'static str),
}

#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: SyntaxKind,
    /// The engine's own node kind name (e.g. `call_expression`).
    pub raw_kind: &'static str,
    pub span: TextSpan,
    pub parent: Option<NodeId>,
    pub role: Option<Role>,
    pub children: Vec<NodeId>,
    /// Inserted by error recovery, zero width.
    pub missing: bool,
}

/// A lowered syntax tree over one source buffer.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    /// Leaves in source order.
    tokens: Vec<NodeId>,
}

impl SyntaxTree {
    /// The root node. A tree always has one.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.nodes[id.index()].kind
    }

    pub fn raw_kind(&self, id: NodeId) -> &'static str {
        self.nodes[id.index()].raw_kind
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.nodes[id.index()].role
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Leaves in source order.
    pub fn tokens(&self) -> &[NodeId] {
        &self.tokens
    }

    /// First child filling `role`.
    pub fn child_with_role(&self, id: NodeId, role: Role) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.role(c) == Some(role))
    }

    pub fn children_of_kind(&self, id: NodeId, kind: SyntaxKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    /// Text of a node, given the buffer the tree was built from.
    pub fn text<'a>(&self, id: NodeId, source: &'a str) -> &'a str {
        let span = self.span(id);
        source.get(span.start..span.end).unwrap_or("")
    }

    /// `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }
}

/// Builds a [`SyntaxTree`] in pre-order.
///
/// Engines call [`enter`](Self::enter) for every node (the first call creates
/// the root) and [`exit`](Self::exit) once its children are done.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(
        &mut self,
        kind: SyntaxKind,
        raw_kind: &'static str,
        span: TextSpan,
        role: Option<Role>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            raw_kind,
            span,
            parent,
            role,
            children: Vec::new(),
            missing: false,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.stack.push(id);
        id
    }

    pub fn mark_missing(&mut self, id: NodeId) {
        self.nodes[id.index()].missing = true;
    }

    pub fn exit(&mut self) {
        self.stack.pop();
    }

    /// Enter and immediately exit a leaf.
    pub fn leaf(
        &mut self,
        kind: SyntaxKind,
        raw_kind: &'static str,
        span: TextSpan,
        role: Option<Role>,
    ) -> NodeId {
        let id = self.enter(kind, raw_kind, span, role);
        self.exit();
        id
    }

    /// Finish the tree. An empty builder yields a lone zero-width root.
    pub fn finish(mut self) -> SyntaxTree {
        if self.nodes.is_empty() {
            self.enter(SyntaxKind::Root, "root", TextSpan::empty(0), None);
        }
        let tokens = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.children.is_empty())
            .map(|(i, _)| NodeId(i as u32))
            .collect();
        SyntaxTree {
            nodes: self.nodes,
            tokens,
        }
    }
}
