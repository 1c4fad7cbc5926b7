//! End-to-end account lifecycle through the full router.
//!
//! A paying user is deleted by an admin, after which every sign-in path
//! reports the email as banned while unrelated accounts stay untouched.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use warden_api::{create_router, AppState};
use warden_core::models::{BLACKLIST_TABLE, PAYMENTS_TABLE, USERS_TABLE};
use warden_testing::{payment_row, TestEnv};

fn router(env: &TestEnv) -> Router {
    let state = AppState::new(env.store.clone(), env.auth.clone(), Arc::new(env.clock.clone()));
    create_router(state, Duration::from_secs(5))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    let response = app.oneshot(request).await.expect("execute request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn deleted_account_stays_banned() {
    let env = TestEnv::new();
    env.seed_account("user-paid", "paid@example.com");
    env.seed_account("user-other", "other@example.com");
    env.store.seed(
        PAYMENTS_TABLE,
        payment_row("user-paid", "paid@example.com", &TestEnv::epoch_rfc3339()),
    );

    let (status, before) =
        post(router(&env), "/api/auth/check-blacklist", json!({ "email": "paid@example.com" }))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["is_blacklisted"], false);

    let (status, deleted) = post(
        router(&env),
        "/api/admin/users/delete",
        json!({ "email": " paid@example.com ", "reason": "Refund issued" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["summary"]["user_id"], "user-paid");

    for uri in ["/api/auth/check-blacklist", "/api/auth/status"] {
        let (status, body) = post(router(&env), uri, json!({ "email": "PAID@example.com " })).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri} should refuse the deleted email");
        assert_eq!(body["reason"], "Refund issued");
    }

    let users = env.store.rows(USERS_TABLE);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], "user-other");
    assert!(env.store.rows(PAYMENTS_TABLE).is_empty());
    assert_eq!(env.store.rows(BLACKLIST_TABLE).len(), 1);
    assert!(env.auth.has_user("user-other"));
    assert!(!env.auth.has_user("user-paid"));
}

#[tokio::test]
async fn repeated_deletion_keeps_a_single_blacklist_entry() {
    let env = TestEnv::new();
    env.seed_account("user-1", "twice@example.com");

    for reason in ["First pass", "Second pass"] {
        let (status, _) = post(
            router(&env),
            "/api/admin/users/delete",
            json!({ "email": "twice@example.com", "reason": reason }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let blacklist = env.store.rows(BLACKLIST_TABLE);
    assert_eq!(blacklist.len(), 1);
    assert_eq!(blacklist[0]["reason"], "Second pass");
}
