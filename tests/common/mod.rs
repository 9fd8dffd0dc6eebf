#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use codeassist::config::ServerConfig;
use codeassist::service::CompletionService;
use codeassist::{build_router, AppState};

pub fn test_app() -> Router {
    test_app_with(ServerConfig::default())
}

pub fn test_app_with(config: ServerConfig) -> Router {
    let service = CompletionService::from_config(&config);
    build_router(Arc::new(AppState::new(Arc::new(service))))
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    post_raw(app, uri, serde_json::to_string(&body).unwrap()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// UTF-16 offset of the first `needle` in `code`, plus `delta` units.
pub fn pos(code: &str, needle: &str, delta: usize) -> usize {
    let byte = code.find(needle).unwrap();
    code[..byte].encode_utf16().count() + delta
}
