//! Per-request document snapshots.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{AnalysisContext, EngineDiagnostic, EngineResult, OutputKind, SemanticModel};
use crate::syntax::SyntaxTree;
use crate::text::{TextIndex, TextSpan};

/// One compiled view of one source buffer. Never shared between requests.
pub struct DocumentSnapshot {
    text: Arc<str>,
    index: TextIndex,
    tree: Arc<SyntaxTree>,
    model: Arc<dyn SemanticModel>,
    diagnostics: Option<Vec<EngineDiagnostic>>,
    output: OutputKind,
}

impl DocumentSnapshot {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn index(&self) -> &TextIndex {
        &self.index
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn model(&self) -> &dyn SemanticModel {
        &*self.model
    }

    /// Diagnostics, if the snapshot was built with them.
    pub fn diagnostics(&self) -> Option<&[EngineDiagnostic]> {
        self.diagnostics.as_deref()
    }

    pub fn output(&self) -> OutputKind {
        self.output
    }

    /// Byte offset of a UTF-16 position.
    pub fn offset(&self, position: usize) -> usize {
        self.index.to_byte(position)
    }

    /// UTF-16 range of a byte span.
    pub fn utf16_range(&self, span: TextSpan) -> (usize, usize) {
        self.index.span_to_utf16(span)
    }

    /// Text covered by a byte span, empty when out of range.
    pub fn slice(&self, span: TextSpan) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }
}

/// Turns source text into a [`DocumentSnapshot`] against a context.
pub struct DocumentBuilder<'a> {
    context: &'a dyn AnalysisContext,
    output: OutputKind,
    with_diagnostics: bool,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(context: &'a dyn AnalysisContext) -> Self {
        Self {
            context,
            output: OutputKind::default(),
            with_diagnostics: false,
        }
    }

    pub fn output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.with_diagnostics = enabled;
        self
    }

    /// Compile `source`. Syntax errors never fail this; only cancellation
    /// and engine faults do.
    pub fn build(self, source: &str, cancel: &CancellationToken) -> EngineResult<DocumentSnapshot> {
        let compilation = self.context.compile(source, self.output, cancel)?;
        let diagnostics = if self.with_diagnostics {
            Some(compilation.model.diagnostics(cancel)?)
        } else {
            None
        };
        debug!(
            source_len = source.len(),
            nodes = compilation.tree.len(),
            diagnostics = diagnostics.as_ref().map(Vec::len),
            "document built"
        );
        Ok(DocumentSnapshot {
            text: source.into(),
            index: TextIndex::new(source),
            tree: compilation.tree,
            model: compilation.model,
            diagnostics,
            output: self.output,
        })
    }
}
