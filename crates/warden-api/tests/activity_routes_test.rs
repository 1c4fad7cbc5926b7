//! Integration tests for the recruiter activity log.

mod common;

use axum::http::StatusCode;
use common::{app, get, post_json, state_for};
use serde_json::json;
use warden_core::models::RECRUITER_ACTIVITY_TABLE;
use warden_testing::{Operation, TestEnv};

fn seed_activity(env: &TestEnv, recruiter_id: &str, activity_type: &str, created_at: &str) {
    env.store.seed(
        RECRUITER_ACTIVITY_TABLE,
        json!({
            "recruiter_id": recruiter_id,
            "activity_type": activity_type,
            "activity_details": {},
            "created_at": created_at,
        }),
    );
}

#[tokio::test]
async fn log_requires_recruiter_and_type() {
    let env = TestEnv::new();

    let (status, body) = post_json(
        app(state_for(&env)),
        "/api/recruiter-activity/log",
        &json!({ "recruiter_id": "rec-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "recruiter_id and activity_type are required");
    assert!(env.store.rows(RECRUITER_ACTIVITY_TABLE).is_empty());
}

#[tokio::test]
async fn log_records_activity_with_timestamp() {
    let env = TestEnv::new();

    let (status, body) = post_json(
        app(state_for(&env)),
        "/api/recruiter-activity/log",
        &json!({
            "recruiter_id": 42,
            "activity_type": "resume_viewed",
            "activity_details": { "resume_id": "r-9" },
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity"]["recruiter_id"], "42");
    assert_eq!(body["activity"]["created_at"], "2025-01-15T12:00:00.000000Z");

    let rows = env.store.rows(RECRUITER_ACTIVITY_TABLE);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["activity_details"]["resume_id"], "r-9");
}

#[tokio::test]
async fn listing_is_newest_first_and_filtered() {
    let env = TestEnv::new();
    seed_activity(&env, "rec-1", "resume_viewed", "2025-01-10T00:00:00Z");
    seed_activity(&env, "rec-1", "resume_downloaded", "2025-01-12T00:00:00Z");
    seed_activity(&env, "rec-1", "resume_viewed", "2025-01-14T00:00:00Z");
    seed_activity(&env, "rec-2", "resume_viewed", "2025-01-15T00:00:00Z");

    let (status, body) = get(app(state_for(&env)), "/api/recruiter-activity/rec-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["activities"][0]["created_at"], "2025-01-14T00:00:00Z");

    let (_, body) = get(
        app(state_for(&env)),
        "/api/recruiter-activity/rec-1?activity_type=resume_viewed&limit=1",
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["activities"][0]["created_at"], "2025-01-14T00:00:00Z");
}

#[tokio::test]
async fn non_numeric_limit_uses_the_default() {
    let env = TestEnv::new();
    for day in 10..13 {
        seed_activity(&env, "rec-1", "resume_viewed", &format!("2025-01-{day}T00:00:00Z"));
    }

    let (status, body) =
        get(app(state_for(&env)), "/api/recruiter-activity/rec-1?limit=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);

    let (status, body) =
        get(app(state_for(&env)), "/api/recruiter-activity/admin/all?limit=lots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn admin_listing_covers_every_recruiter() {
    let env = TestEnv::new();
    seed_activity(&env, "rec-1", "resume_viewed", "2025-01-10T00:00:00Z");
    seed_activity(&env, "rec-2", "resume_viewed", "2025-01-11T00:00:00Z");

    let (status, body) = get(app(state_for(&env)), "/api/recruiter-activity/admin/all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["activities"][0]["recruiter_id"], "rec-2");
}

#[tokio::test]
async fn store_failure_is_server_error() {
    let env = TestEnv::new();
    env.store.fail_with_status(Operation::Select, RECRUITER_ACTIVITY_TABLE, 500);

    let (status, body) = get(app(state_for(&env)), "/api/recruiter-activity/rec-1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}
