//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use warden_api::{create_router, AppState};
use warden_testing::TestEnv;

/// State over the in-memory doubles, with no optional integrations.
pub fn state_for(env: &TestEnv) -> AppState {
    AppState::new(env.store.clone(), env.auth.clone(), Arc::new(env.clock.clone()))
}

/// Router with a short request timeout.
pub fn app(state: AppState) -> Router {
    create_router(state, Duration::from_secs(5))
}

/// Sends a request and decodes the JSON response body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("execute request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// POSTs a JSON value.
pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

/// POSTs raw bytes with no content type.
pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request =
        Request::builder().method("POST").uri(uri).body(body.into()).expect("build request");
    send(app, request).await
}

/// Issues a GET.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("build request");
    send(app, request).await
}
