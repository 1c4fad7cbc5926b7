//! Integration tests for the blast relay routes.

mod common;

use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use common::{app, get, post_json, post_raw, state_for};
use serde_json::json;
use warden_api::{AppState, RelayClient};
use warden_testing::TestEnv;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

fn with_relay(env: &TestEnv, server: &MockServer, timeout: Duration) -> AppState {
    let relay = RelayClient::new(server.uri(), timeout).unwrap();
    state_for(env).with_relay(Arc::new(relay))
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let env = TestEnv::new();

    let (status, body) = post_raw(app(state_for(&env)), "/api/blast/send", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");

    let (status, body) = post_json(app(state_for(&env)), "/api/blast/send", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No data provided");
}

#[tokio::test]
async fn recipients_are_validated_before_relaying() {
    let env = TestEnv::new();
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let state = with_relay(&env, &server, Duration::from_secs(5));

    let (status, body) =
        post_json(app(state.clone()), "/api/blast/send", &json!({ "subject": "Hello" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Recipients array is required");

    let (status, body) =
        post_json(app(state), "/api/blast/send", &json!({ "recipients": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least one recipient is required");
}

#[tokio::test]
async fn missing_relay_is_server_error() {
    let env = TestEnv::new();

    let (status, body) = post_json(
        app(state_for(&env)),
        "/api/blast/send",
        &json!({ "recipients": ["r@x.com"] }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Relay webhook URL not configured");
}

#[tokio::test]
async fn payload_is_forwarded_unchanged() {
    let env = TestEnv::new();
    let server = MockServer::start().await;
    let payload = json!({
        "recipients": ["a@x.com", "b@x.com", "c@x.com"],
        "resume_url": "https://files.example/resume.pdf",
        "candidate": { "name": "Jane" },
    });
    Mock::given(matchers::method("POST"))
        .and(matchers::body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_string("Accepted"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app(with_relay(&env, &server, Duration::from_secs(5))),
        "/api/blast/send",
        &payload,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blast sent successfully");
    assert_eq!(body["status"], 200);
    assert_eq!(body["response"], "Accepted");
    assert_eq!(body["recipients_count"], 3);
}

#[tokio::test]
async fn relay_error_status_is_bad_gateway() {
    let env = TestEnv::new();
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("scenario disabled"))
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app(with_relay(&env, &server, Duration::from_secs(5))),
        "/api/blast/send",
        &json!({ "recipients": ["r@x.com"] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Relay returned error: 500");
    assert_eq!(body["details"], "scenario disabled");
}

#[tokio::test]
async fn slow_relay_is_gateway_timeout() {
    let env = TestEnv::new();
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let (status, body) = post_json(
        app(with_relay(&env, &server, Duration::from_millis(100))),
        "/api/blast/send",
        &json!({ "recipients": ["r@x.com"] }),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "Request to relay webhook timed out");
}

#[tokio::test]
async fn unreachable_relay_is_bad_gateway() {
    let env = TestEnv::new();
    let relay = RelayClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let state = state_for(&env).with_relay(Arc::new(relay));

    let (status, body) =
        post_json(app(state), "/api/blast/send", &json!({ "recipients": ["r@x.com"] })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Failed to connect to relay webhook"));
}

#[tokio::test]
async fn blast_test_reports_relay_configuration() {
    let env = TestEnv::new();
    let server = MockServer::start().await;

    let (_, body) = get(app(state_for(&env)), "/api/blast/test").await;
    assert_eq!(body["message"], "Blast API is working");
    assert_eq!(body["webhook_configured"], false);

    let (_, body) =
        get(app(with_relay(&env, &server, Duration::from_secs(5))), "/api/blast/test").await;
    assert_eq!(body["webhook_configured"], true);
}
