//! Code-check: engine diagnostics as editor markers.

use lsp_types::DiagnosticSeverity;
use tokio_util::sync::CancellationToken;

use crate::api::{CodeCheckResult, CodeCheckSeverity};
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, EngineDiagnostic, EngineResult};

pub fn severity(level: DiagnosticSeverity) -> CodeCheckSeverity {
    match level {
        DiagnosticSeverity::ERROR => CodeCheckSeverity::Error,
        DiagnosticSeverity::WARNING => CodeCheckSeverity::Warning,
        DiagnosticSeverity::INFORMATION => CodeCheckSeverity::Info,
        _ => CodeCheckSeverity::Hint,
    }
}

/// Every diagnostic in engine order. Uses the snapshot's precomputed list
/// when it has one.
pub fn code_check(
    doc: &DocumentSnapshot,
    cancel: &CancellationToken,
) -> EngineResult<Vec<CodeCheckResult>> {
    let computed;
    let diagnostics = match doc.diagnostics() {
        Some(list) => list,
        None => {
            computed = doc.model().diagnostics(cancel)?;
            &computed[..]
        }
    };
    check_cancelled(cancel)?;
    Ok(diagnostics.iter().map(|d| to_result(doc, d)).collect())
}

fn to_result(doc: &DocumentSnapshot, diagnostic: &EngineDiagnostic) -> CodeCheckResult {
    let severity = severity(diagnostic.severity);
    let (offset_from, offset_to) = doc.utf16_range(diagnostic.span);
    CodeCheckResult {
        id: diagnostic.code.clone(),
        keyword: doc.slice(diagnostic.span).to_string(),
        message: diagnostic.message.clone(),
        offset_from,
        offset_to,
        severity,
        severity_numeric: severity as u8,
    }
}
