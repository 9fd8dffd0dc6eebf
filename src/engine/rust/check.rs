//! Diagnostics: syntax errors plus a handful of lints.

use lsp_types::DiagnosticSeverity;
use tokio_util::sync::CancellationToken;

use crate::engine::{check_cancelled, Accessibility, EngineDiagnostic, EngineResult, OutputKind, SymbolKind};
use crate::syntax::SyntaxKind;
use crate::text::TextSpan;

use super::model::RustModel;

pub const SYNTAX_ERROR: &str = "RS0001";
pub const MISSING_TOKEN: &str = "RS0002";
pub const UNUSED_LOCAL: &str = "RS1001";
pub const MISSING_MAIN: &str = "RS2001";
pub const MISSING_DOCS: &str = "RS3001";

const SNIPPET_CHARS: usize = 24;

impl RustModel {
    pub(super) fn check(&self, cancel: &CancellationToken) -> EngineResult<Vec<EngineDiagnostic>> {
        let mut out = Vec::new();
        self.syntax_errors(&mut out);
        check_cancelled(cancel)?;
        self.unused_locals(&mut out);
        check_cancelled(cancel)?;
        match self.output {
            OutputKind::Executable => self.missing_main(&mut out),
            OutputKind::Library => self.missing_docs(&mut out),
        }
        out.sort_by_key(|d| d.span.start);
        Ok(out)
    }

    fn syntax_errors(&self, out: &mut Vec<EngineDiagnostic>) {
        let tree = &*self.tree;
        for node in tree.iter() {
            let data = tree.node(node);
            if data.missing {
                let at = data.span.start;
                out.push(EngineDiagnostic {
                    code: MISSING_TOKEN.into(),
                    severity: DiagnosticSeverity::ERROR,
                    message: format!("Expected `{}`", data.raw_kind),
                    span: TextSpan::empty(at),
                });
                continue;
            }
            if data.kind != SyntaxKind::Error {
                continue;
            }
            // Only the outermost error node of a run is reported.
            let nested = tree
                .ancestors(node)
                .skip(1)
                .any(|a| tree.kind(a) == SyntaxKind::Error);
            if nested {
                continue;
            }
            let snippet: String = self
                .text(node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(SNIPPET_CHARS)
                .collect();
            let message = if snippet.is_empty() {
                "Syntax error".to_string()
            } else {
                format!("Syntax error: unexpected `{snippet}`")
            };
            out.push(EngineDiagnostic {
                code: SYNTAX_ERROR.into(),
                severity: DiagnosticSeverity::ERROR,
                message,
                span: data.span,
            });
        }
    }

    fn unused_locals(&self, out: &mut Vec<EngineDiagnostic>) {
        for symbol in self.table.iter() {
            if !symbol.is_let_binding(&self.tree) || symbol.desc.name.starts_with('_') {
                continue;
            }
            let used = self
                .references_to(symbol.id())
                .into_iter()
                .any(|token| !self.table.is_declaration_name(token));
            if !used {
                out.push(EngineDiagnostic {
                    code: UNUSED_LOCAL.into(),
                    severity: DiagnosticSeverity::WARNING,
                    message: format!("Unused variable `{}`", symbol.desc.name),
                    span: symbol.name_span,
                });
            }
        }
    }

    fn missing_main(&self, out: &mut Vec<EngineDiagnostic>) {
        let has_main = self.table.globals("main").iter().any(|&id| {
            self.table
                .get(id)
                .is_some_and(|s| s.desc.kind == SymbolKind::Method && s.desc.container.is_none())
        });
        if !has_main {
            out.push(EngineDiagnostic {
                code: MISSING_MAIN.into(),
                severity: DiagnosticSeverity::ERROR,
                message: "`main` function not found in executable".into(),
                span: TextSpan::empty(0),
            });
        }
    }

    fn missing_docs(&self, out: &mut Vec<EngineDiagnostic>) {
        for symbol in self.table.iter() {
            let documentable = !matches!(symbol.desc.kind, SymbolKind::Local | SymbolKind::Parameter);
            if symbol.desc.accessibility != Accessibility::Public
                || symbol.trait_impl
                || symbol.doc.is_some()
                || !documentable
            {
                continue;
            }
            out.push(EngineDiagnostic {
                code: MISSING_DOCS.into(),
                severity: DiagnosticSeverity::INFORMATION,
                message: format!("Missing documentation for public item `{}`", symbol.desc.name),
                span: symbol.name_span,
            });
        }
    }
}
