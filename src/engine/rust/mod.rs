//! Rust analysis engine on tree-sitter.
//!
//! References are Rust source files (declarations only are used). The
//! bundled prelude describes common std types so that completions and
//! signature help work without any reference on disk.

mod check;
mod complete;
mod docs;
mod format;
mod index;
mod lower;
mod model;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::{
    check_cancelled, AnalysisContext, AnalysisEngine, Compilation, ContextBuild, DocumentId,
    EngineResult, OutputKind,
};

use index::SymbolTable;
use model::RustModel;

const STD_PRELUDE: &str = include_str!("../../../stubs/std_prelude.rs");
const PRELUDE_NAME: &str = "std_prelude";

/// Knobs for the Rust engine.
#[derive(Debug, Clone)]
pub struct RustEngineOptions {
    /// Directories searched for logical reference names (`<name>.rs`).
    pub search_paths: Vec<PathBuf>,
    /// Load the bundled std prelude into every context.
    pub bundled_prelude: bool,
    pub indent_width: usize,
}

impl Default for RustEngineOptions {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            bundled_prelude: true,
            indent_width: 4,
        }
    }
}

pub struct RustEngine {
    options: RustEngineOptions,
}

impl RustEngine {
    pub fn new(options: RustEngineOptions) -> Self {
        Self { options }
    }

    /// Resolve a reference identifier to file contents.
    ///
    /// Anything that looks like a path is read directly; other identifiers
    /// are looked up as `<name>.rs` in the search paths.
    fn read_reference(&self, reference: &str) -> Result<String, String> {
        let looks_like_path =
            reference.ends_with(".rs") || reference.contains('/') || reference.contains('\\');
        if looks_like_path {
            return std::fs::read_to_string(Path::new(reference)).map_err(|e| e.to_string());
        }
        let file = format!("{reference}.rs");
        for dir in &self.options.search_paths {
            let candidate = dir.join(&file);
            if candidate.is_file() {
                return std::fs::read_to_string(&candidate).map_err(|e| e.to_string());
            }
        }
        Err(format!(
            "not found in {} reference path(s)",
            self.options.search_paths.len()
        ))
    }
}

impl AnalysisEngine for RustEngine {
    fn language_id(&self) -> &'static str {
        "rust"
    }

    fn create_context(
        &self,
        references: &[String],
        cancel: &CancellationToken,
    ) -> EngineResult<ContextBuild> {
        let started = Instant::now();
        let mut parser = lower::new_parser()?;
        let mut library = Library::default();
        let mut failed_references = Vec::new();

        if self.options.bundled_prelude {
            library.add(&mut parser, PRELUDE_NAME, STD_PRELUDE.into())?;
        }
        for reference in references {
            check_cancelled(cancel)?;
            match self.read_reference(reference) {
                Ok(text) => library.add(&mut parser, reference, text.into())?,
                Err(reason) => failed_references.push((reference.clone(), reason)),
            }
        }

        info!(
            documents = library.documents.len(),
            symbols = library.table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rust context ready"
        );
        let context = RustContext {
            library: Arc::new(library),
            indent_width: self.options.indent_width,
        };
        Ok(ContextBuild {
            context: Arc::new(context),
            failed_references,
        })
    }
}

/// A loaded reference document.
#[derive(Debug)]
pub(crate) struct LoadedDocument {
    pub name: String,
    pub text: Arc<str>,
}

/// Declarations of every loaded reference.
#[derive(Debug, Default)]
pub(crate) struct Library {
    pub documents: Vec<LoadedDocument>,
    pub table: SymbolTable,
}

impl Library {
    fn add(&mut self, parser: &mut tree_sitter::Parser, name: &str, text: Arc<str>) -> EngineResult<()> {
        let tree = lower::parse(parser, &text)?;
        let document = DocumentId::Reference(self.documents.len() as u32);
        let before = self.table.len();
        self.table.add_document(&tree, &text, document);
        debug!(reference = name, symbols = self.table.len() - before, "reference indexed");
        self.documents.push(LoadedDocument {
            name: name.to_string(),
            text,
        });
        Ok(())
    }
}

pub struct RustContext {
    library: Arc<Library>,
    indent_width: usize,
}

impl AnalysisContext for RustContext {
    fn references(&self) -> Vec<String> {
        self.library
            .documents
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    fn compile(
        &self,
        source: &str,
        output: OutputKind,
        cancel: &CancellationToken,
    ) -> EngineResult<Compilation> {
        check_cancelled(cancel)?;
        let mut parser = lower::new_parser()?;
        let tree = Arc::new(lower::parse(&mut parser, source)?);
        check_cancelled(cancel)?;

        let mut table = SymbolTable::new(self.library.table.len() as u32);
        table.add_document(&tree, source, DocumentId::Source);
        check_cancelled(cancel)?;

        let model = RustModel::new(
            source.into(),
            Arc::clone(&tree),
            Arc::clone(&self.library),
            table,
            output,
            self.indent_width,
        );
        Ok(Compilation {
            tree,
            model: Arc::new(model),
        })
    }
}
