//! Request orchestration.
//!
//! Every operation follows the same path: validate the request, fetch the
//! analysis context for its reference set, compile a fresh snapshot of its
//! code on a blocking thread, and hand the snapshot to one provider. Nothing
//! about a request outlives it except the cached context.

pub mod error;
pub mod validate;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, Instrument, Span};
use uuid::Uuid;

use crate::api::{
    CodeActionResult, CodeCheckRequest, CodeCheckResult, CodeFormatRequest,
    CompletionResolveRequest, GoToDefinitionResult, HoverInfoResult, PositionRequest,
    RenameRequest, RequestWithCode, SignatureHelpResult, TabCompletionResult,
};
use crate::cache::{CacheStats, ContextCache, ReferenceSet};
use crate::config::ServerConfig;
use crate::document::{DocumentBuilder, DocumentSnapshot};
use crate::engine::rust::RustEngine;
use crate::engine::{EngineError, EngineResult, OutputKind};
use crate::ide;
use crate::text::TextSpan;

pub use error::{ServiceError, ServiceResult};

/// The operations the HTTP layer exposes.
#[async_trait]
pub trait CodeIntelligence: Send + Sync {
    async fn complete(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Vec<TabCompletionResult>>;

    async fn resolve(
        &self,
        req: CompletionResolveRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<TabCompletionResult>>;

    async fn signature_help(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<SignatureHelpResult>>;

    async fn hover(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<HoverInfoResult>>;

    async fn code_check(
        &self,
        req: CodeCheckRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Vec<CodeCheckResult>>;

    async fn definition(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<GoToDefinitionResult>>;

    async fn rename(
        &self,
        req: RenameRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<CodeActionResult>>;

    async fn format(
        &self,
        req: CodeFormatRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Vec<CodeActionResult>>;

    fn stats(&self) -> CacheStats;

    /// Drop every cached context. Returns how many were dropped.
    fn reset(&self) -> usize;
}

pub struct CompletionService {
    cache: ContextCache,
    default_output: OutputKind,
    eager_descriptions: bool,
}

impl CompletionService {
    pub fn new(cache: ContextCache, default_output: OutputKind, eager_descriptions: bool) -> Self {
        Self {
            cache,
            default_output,
            eager_descriptions,
        }
    }

    /// A service over the Rust engine, configured from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let engine = Arc::new(RustEngine::new(config.engine_options()));
        let cache = ContextCache::new(engine, config.cache_options());
        Self::new(cache, config.default_output_kind, config.eager_descriptions)
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Build a snapshot of the request's code and run `provider` on it.
    async fn run<R, T, F>(
        &self,
        op: &'static str,
        req: &R,
        with_diagnostics: bool,
        cancel: CancellationToken,
        provider: F,
    ) -> ServiceResult<T>
    where
        R: RequestWithCode + Sync,
        T: Send + 'static,
        F: FnOnce(&DocumentSnapshot, &CancellationToken) -> EngineResult<T> + Send + 'static,
    {
        let span = info_span!("request", op, request_id = %Uuid::new_v4());
        let source_len = req.code().len();
        let started = Instant::now();

        let result = async move {
            let references = ReferenceSet::new(req.assemblies());
            let context = self.cache.get_or_create(&references, &cancel).await?;
            let output = req.output_kind().unwrap_or(self.default_output);
            let source = req.code().to_string();
            let span = Span::current();

            tokio::task::spawn_blocking(move || {
                let _entered = span.enter();
                let doc = DocumentBuilder::new(&*context)
                    .output(output)
                    .with_diagnostics(with_diagnostics)
                    .build(&source, &cancel)?;
                provider(&doc, &cancel)
            })
            .await
            .map_err(|e| EngineError::internal(format!("{op} task panicked: {e}")))?
            .map_err(ServiceError::from)
        }
        .instrument(span.clone())
        .await;

        let _entered = span.enter();
        match &result {
            Ok(_) => debug!(
                source_len,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request done"
            ),
            Err(ServiceError::Cancelled) => debug!(source_len, "request cancelled"),
            Err(e) => error!(source_len, error = %e, "request failed"),
        }
        result
    }
}

#[async_trait]
impl CodeIntelligence for CompletionService {
    async fn complete(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Vec<TabCompletionResult>> {
        let position = validate::position(req.position, &req.code)?;
        let eager = self.eager_descriptions;
        self.run("complete", &req, false, cancel, move |doc, cancel| {
            ide::complete(doc, doc.offset(position), eager, cancel)
        })
        .await
    }

    async fn resolve(
        &self,
        req: CompletionResolveRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<TabCompletionResult>> {
        let position = validate::position(req.position, &req.code)?;
        let suggestion = req.suggestion.clone();
        self.run("resolve", &req, false, cancel, move |doc, cancel| {
            ide::resolve(doc, doc.offset(position), &suggestion, cancel)
        })
        .await
    }

    async fn signature_help(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<SignatureHelpResult>> {
        let position = validate::position(req.position, &req.code)?;
        self.run("signature", &req, false, cancel, move |doc, cancel| {
            ide::signature_help(doc, doc.offset(position), cancel)
        })
        .await
    }

    async fn hover(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<HoverInfoResult>> {
        let position = validate::position(req.position, &req.code)?;
        self.run("hover", &req, false, cancel, move |doc, cancel| {
            ide::hover(doc, doc.offset(position), cancel)
        })
        .await
    }

    async fn code_check(
        &self,
        req: CodeCheckRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Vec<CodeCheckResult>> {
        self.run("codeCheck", &req, true, cancel, ide::code_check).await
    }

    async fn definition(
        &self,
        req: PositionRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<GoToDefinitionResult>> {
        let position = validate::position(req.position, &req.code)?;
        self.run("definition", &req, false, cancel, move |doc, cancel| {
            ide::definition(doc, doc.offset(position), cancel)
        })
        .await
    }

    async fn rename(
        &self,
        req: RenameRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Option<CodeActionResult>> {
        let position = validate::position(req.position, &req.code)?;
        let new_name = validate::new_name(&req.new_name)?.to_string();
        self.run("rename", &req, false, cancel, move |doc, cancel| {
            ide::rename(doc, doc.offset(position), &new_name, cancel)
        })
        .await
    }

    async fn format(
        &self,
        req: CodeFormatRequest,
        cancel: CancellationToken,
    ) -> ServiceResult<Vec<CodeActionResult>> {
        let range = validate::format_span(req.start, req.end, &req.code)?;
        self.run("format", &req, false, cancel, move |doc, cancel| {
            let span = range.map(|(start, end)| TextSpan::new(doc.offset(start), doc.offset(end)));
            ide::format(doc, span, cancel)
        })
        .await
    }

    fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn reset(&self) -> usize {
        self.cache.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CodeCheckSeverity;
    use crate::cache::CacheOptions;
    use crate::engine::{AnalysisEngine, ContextBuild};

    fn service() -> CompletionService {
        CompletionService::from_config(&ServerConfig::default())
    }

    fn position_request(code: &str, position: i64) -> PositionRequest {
        PositionRequest {
            code: code.into(),
            position,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn invalid_positions_are_rejected_before_engine_work() {
        let svc = service();
        let err = svc
            .hover(position_request("fn main() {}", -1), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = svc
            .complete(position_request("fn main() {}", 13), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.stats().misses, 0);
    }

    #[tokio::test]
    async fn completion_uses_one_cached_context() {
        let svc = service();
        let code = "fn main() {\n    let value = 1;\n    \n}\n";
        let position = code.find("    \n}").unwrap() as i64 + 4;
        let items = svc
            .complete(position_request(code, position), CancellationToken::new())
            .await
            .unwrap();
        assert!(items.iter().any(|i| i.suggestion == "value"));
        svc.complete(position_request(code, position), CancellationToken::new())
            .await
            .unwrap();
        let stats = svc.stats();
        assert_eq!((stats.builds, stats.hits, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn output_kind_is_per_request() {
        let svc = service();
        let mut req = CodeCheckRequest {
            code: "fn helper() {}\n".into(),
            ..Default::default()
        };
        let library = svc.code_check(req.clone(), CancellationToken::new()).await.unwrap();
        assert!(library.is_empty());

        req.output_kind = Some(OutputKind::Executable);
        let exe = svc.code_check(req, CancellationToken::new()).await.unwrap();
        assert_eq!(exe.len(), 1);
        assert_eq!(exe[0].severity, CodeCheckSeverity::Error);
        assert_eq!(svc.stats().builds, 1);
    }

    #[tokio::test]
    async fn format_range_and_rename() {
        let svc = service();
        let code = "fn main() {\nlet a = 1;\n}\n";
        let actions = svc
            .format(
                CodeFormatRequest {
                    code: code.into(),
                    ..Default::default()
                },
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(!actions[0].changes_in_document.is_empty());

        let bad = CodeFormatRequest {
            code: code.into(),
            start: 5,
            end: 2,
            ..Default::default()
        };
        assert!(matches!(
            svc.format(bad, CancellationToken::new()).await,
            Err(ServiceError::Validation(_))
        ));

        let rename = RenameRequest {
            code: code.into(),
            position: code.find("a =").unwrap() as i64,
            new_name: "b".into(),
            ..Default::default()
        };
        let action = svc.rename(rename, CancellationToken::new()).await.unwrap().unwrap();
        assert_eq!(action.title, "Rename to b");
    }

    #[tokio::test]
    async fn cancelled_requests_report_cancellation() {
        let svc = service();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = svc.hover(position_request("fn main() {}", 3), cancel).await;
        assert!(matches!(result, Err(ServiceError::Cancelled)));
    }

    struct BrokenHost;

    impl AnalysisEngine for BrokenHost {
        fn language_id(&self) -> &'static str {
            "rust"
        }

        fn create_context(
            &self,
            _references: &[String],
            _cancel: &CancellationToken,
        ) -> EngineResult<ContextBuild> {
            Err(EngineError::HostInit("grammar ABI mismatch".into()))
        }
    }

    #[tokio::test]
    async fn host_failure_makes_every_request_unavailable() {
        let cache = ContextCache::new(Arc::new(BrokenHost), CacheOptions::default());
        let svc = CompletionService::new(cache, OutputKind::Library, false);
        let first = svc
            .hover(position_request("fn main() {}", 0), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(first.is_unavailable());
        let mut other = position_request("fn main() {}", 0);
        other.assemblies = Some(vec!["other.rs".into()]);
        let second = svc.definition(other, CancellationToken::new()).await.unwrap_err();
        assert!(second.is_unavailable());
    }
}
