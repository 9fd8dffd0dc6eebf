//! The analysis engine contract.
//!
//! Everything above this module (cache, document builder, providers) talks to
//! an engine only through these traits. An engine turns a reference set into
//! an [`AnalysisContext`], and a context turns one source buffer into a
//! [`Compilation`]: a lowered [`SyntaxTree`] plus a [`SemanticModel`] that
//! answers symbol, type, completion and edit queries over it.
//!
//! All offsets crossing this boundary are byte offsets into the source.

pub mod display;
pub mod error;
pub mod rust;
pub mod symbols;

use std::collections::BTreeMap;
use std::sync::Arc;

use lsp_types::{CompletionItemKind, DiagnosticSeverity};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::syntax::{NodeId, SyntaxTree};
use crate::text::{Edit, TextSpan};

pub use error::{EngineError, EngineResult};
pub use symbols::{
    Accessibility, DocumentId, Modifiers, ParameterInfo, SourceLocation, StructuredDoc,
    SymbolDescriptor, SymbolId, SymbolKind, TypeKind, TypeRef,
};

/// What the compiled buffer is meant to become.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    #[default]
    #[serde(alias = "library")]
    Library,
    /// A program with an entry point.
    #[serde(alias = "executable")]
    Executable,
}

/// Builds analysis contexts. One engine instance serves the whole process.
pub trait AnalysisEngine: Send + Sync {
    /// Language id used for code fences in hover text.
    fn language_id(&self) -> &'static str;

    /// Load `references` into a new context.
    ///
    /// A reference that cannot be loaded does not fail the call; it shows up
    /// in [`ContextBuild::failed_references`]. Only a host that cannot start
    /// at all returns [`EngineError::HostInit`].
    fn create_context(
        &self,
        references: &[String],
        cancel: &CancellationToken,
    ) -> EngineResult<ContextBuild>;
}

/// Result of [`AnalysisEngine::create_context`].
pub struct ContextBuild {
    pub context: Arc<dyn AnalysisContext>,
    /// `(reference, reason)` for every reference that was skipped.
    pub failed_references: Vec<(String, String)>,
}

/// Compiled references for one reference set. Immutable and shared by every
/// request with the same set.
pub trait AnalysisContext: Send + Sync {
    /// References that loaded, in load order.
    fn references(&self) -> Vec<String>;

    /// Compile one buffer against this context. Syntax errors never fail
    /// this call; they show up as diagnostics.
    fn compile(
        &self,
        source: &str,
        output: OutputKind,
        cancel: &CancellationToken,
    ) -> EngineResult<Compilation>;
}

pub struct Compilation {
    pub tree: Arc<SyntaxTree>,
    pub model: Arc<dyn SemanticModel>,
}

/// A diagnostic as the engine reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineDiagnostic {
    /// Stable code, e.g. `RS1001`.
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub span: TextSpan,
}

/// One completion candidate. The description is computed on demand through
/// [`SemanticModel::describe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    pub category: CompletionItemKind,
    pub symbol: Option<SymbolId>,
}

/// Queries over one compiled buffer.
pub trait SemanticModel: Send + Sync {
    fn language_id(&self) -> &'static str;

    /// Text of a document this model knows about.
    fn document_text(&self, document: DocumentId) -> Option<Arc<str>>;

    fn diagnostics(&self, cancel: &CancellationToken) -> EngineResult<Vec<EngineDiagnostic>>;

    fn symbol(&self, id: SymbolId) -> Option<SymbolDescriptor>;

    /// Symbol declared or referenced by the token at `offset`.
    fn symbol_at(&self, offset: usize) -> Option<SymbolDescriptor>;

    /// Symbol introduced by a declaration node.
    fn declared_symbol(&self, node: NodeId) -> Option<SymbolDescriptor>;

    /// Symbol an expression or name refers to.
    fn bound_symbol(&self, node: NodeId) -> Option<SymbolDescriptor>;

    /// Static type of an expression, after implicit conversions.
    fn type_of(&self, node: NodeId) -> Option<TypeRef>;

    /// The named type a type reference points at.
    fn type_symbol(&self, ty: &TypeRef) -> Option<SymbolDescriptor>;

    /// The declaration behind a symbol, if it lives elsewhere.
    fn find_declaration(&self, symbol: &SymbolDescriptor) -> Option<SymbolDescriptor>;

    fn doc_comment(&self, symbol: &SymbolDescriptor) -> Option<StructuredDoc>;

    /// Every callable the invocation target `node` could name.
    fn member_group(&self, node: NodeId) -> Vec<SymbolDescriptor>;

    /// Bind `node` as a value expression.
    fn bind_as_expression(&self, node: NodeId) -> Option<SymbolDescriptor>;

    /// Bind `node` as a type or module path.
    fn bind_as_type(&self, node: NodeId) -> Option<TypeRef>;

    /// `true` when no instance (`self`) is in scope at `node`.
    fn is_static_context(&self, node: NodeId) -> bool;

    fn completions(
        &self,
        offset: usize,
        cancel: &CancellationToken,
    ) -> EngineResult<Vec<CompletionCandidate>>;

    /// Short description of a candidate from [`completions`](Self::completions).
    fn describe(&self, candidate: &CompletionCandidate) -> Option<String>;

    /// Formatting edits for the whole buffer or for `span` only.
    fn format_edits(
        &self,
        span: Option<TextSpan>,
        cancel: &CancellationToken,
    ) -> EngineResult<Vec<Edit>>;

    /// Edits renaming `symbol` to `new_name`, per affected document.
    fn rename(
        &self,
        symbol: &SymbolDescriptor,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<BTreeMap<DocumentId, Vec<Edit>>>;
}

/// Bail out with [`EngineError::Cancelled`] once `cancel` fires.
pub fn check_cancelled(cancel: &CancellationToken) -> EngineResult<()> {
    if cancel.is_cancelled() {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}
