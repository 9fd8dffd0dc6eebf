//! HTTP surface.
//!
//! One POST route per operation under `/completion`, JSON in and out. A body
//! that fails to parse is a 400. A handler's cancellation token fires when
//! its future is dropped, so a client that disconnects stops the work.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{
    CodeCheckRequest, CodeFormatRequest, CompletionResolveRequest, PositionRequest, RenameRequest,
};
use crate::service::{CodeIntelligence, ServiceError, ServiceResult};

pub struct AppState {
    pub service: Arc<dyn CodeIntelligence>,
}

impl AppState {
    pub fn new(service: Arc<dyn CodeIntelligence>) -> Self {
        Self { service }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/completion/complete", post(complete))
        .route("/completion/resolve", post(resolve))
        .route("/completion/signature", post(signature))
        .route("/completion/hover", post(hover))
        .route("/completion/codeCheck", post(code_check))
        .route("/completion/definition", post(definition))
        .route("/completion/rename", post(rename))
        .route("/completion/format", post(format))
        // Administrative
        .route("/completion/stats", get(stats))
        .route("/completion/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            e if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_body(status, self.to_string())
    }
}

/// Unwrap the body, call the service with a fresh token, and serialize
/// whatever comes back.
async fn handle<Req, T, Fut>(
    body: Result<Json<Req>, JsonRejection>,
    call: impl FnOnce(Req, CancellationToken) -> Fut,
) -> Response
where
    Fut: Future<Output = ServiceResult<T>>,
    T: Serialize,
{
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected request body");
            return error_body(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    match call(req, cancel).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn complete(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.complete(req, cancel)).await
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CompletionResolveRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.resolve(req, cancel)).await
}

async fn signature(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.signature_help(req, cancel)).await
}

async fn hover(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.hover(req, cancel)).await
}

async fn code_check(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CodeCheckRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.code_check(req, cancel)).await
}

async fn definition(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.definition(req, cancel)).await
}

async fn rename(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.rename(req, cancel)).await
}

async fn format(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CodeFormatRequest>, JsonRejection>,
) -> Response {
    handle(body, |req, cancel| state.service.format(req, cancel)).await
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.stats())
}

async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dropped = state.service.reset();
    info!(dropped, "context cache reset");
    Json(serde_json::json!({ "dropped": dropped }))
}
