//! Recruiter activity log.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use warden_core::models::RECRUITER_ACTIVITY_TABLE;

use super::{decode_body, text_field};
use crate::{error::ApiError, AppState};

/// Default page size for one recruiter's activity.
pub const DEFAULT_RECRUITER_LIMIT: usize = 50;

/// Default page size for the admin listing.
pub const DEFAULT_ADMIN_LIMIT: usize = 100;

/// Body of an activity log request.
#[derive(Debug, Default, Deserialize)]
pub struct LogActivityBody {
    /// Recruiter the activity belongs to
    #[serde(default)]
    pub recruiter_id: Option<Value>,
    /// Kind of activity, e.g. `resume_viewed`
    #[serde(default)]
    pub activity_type: Option<String>,
    /// Free-form details
    #[serde(default)]
    pub activity_details: Option<Value>,
}

/// Query parameters for activity listings.
///
/// `limit` is kept as text so a non-numeric value falls back to the
/// route's default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    /// Maximum rows to return
    pub limit: Option<String>,
    /// Only return this activity type
    pub activity_type: Option<String>,
}

impl ActivityParams {
    /// Parsed limit, or `default` when absent or not a number.
    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.as_deref().and_then(|limit| limit.trim().parse().ok()).unwrap_or(default)
    }
}

fn store_failure(e: impl std::fmt::Display) -> ApiError {
    ApiError::internal(e.to_string())
}

/// Records one recruiter activity.
#[instrument(name = "log_activity", skip(state, body))]
pub async fn log_activity(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: LogActivityBody = decode_body(&body);
    let recruiter_id = text_field(request.recruiter_id.as_ref());
    let activity_type = request.activity_type.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let (Some(recruiter_id), Some(activity_type)) = (recruiter_id, activity_type) else {
        return Err(ApiError::bad_request("recruiter_id and activity_type are required"));
    };

    let row = json!({
        "recruiter_id": recruiter_id,
        "activity_type": activity_type,
        "activity_details": request.activity_details.unwrap_or_else(|| json!({})),
        "created_at": state.clock.now_rfc3339(),
    });
    state.store.insert(RECRUITER_ACTIVITY_TABLE, row.clone()).await.map_err(store_failure)?;

    info!(recruiter_id = %recruiter_id, activity_type = %activity_type, "Activity logged");
    Ok(Json(json!({ "success": true, "message": "Activity logged", "activity": row })))
}

/// Lists one recruiter's activity, newest first.
#[instrument(name = "list_activities", skip(state))]
pub async fn list_activities(
    State(state): State<AppState>,
    Path(recruiter_id): Path<String>,
    Query(params): Query<ActivityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mut query = warden_core::Query::new().eq("recruiter_id", recruiter_id.as_str());
    if let Some(activity_type) = params.activity_type.as_deref().filter(|t| !t.is_empty()) {
        query = query.eq("activity_type", activity_type);
    }
    let query = query.order_desc("created_at").limit(params.limit_or(DEFAULT_RECRUITER_LIMIT));

    let activities =
        state.store.select(RECRUITER_ACTIVITY_TABLE, &query).await.map_err(store_failure)?;

    debug!(count = activities.len(), "Activities listed");
    Ok(Json(json!({ "success": true, "count": activities.len(), "activities": activities })))
}

/// Lists every recruiter's activity, newest first.
#[instrument(name = "list_all_activities", skip(state))]
pub async fn list_all_activities(
    State(state): State<AppState>,
    Query(params): Query<ActivityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = warden_core::Query::new()
        .order_desc("created_at")
        .limit(params.limit_or(DEFAULT_ADMIN_LIMIT));

    let activities =
        state.store.select(RECRUITER_ACTIVITY_TABLE, &query).await.map_err(store_failure)?;

    Ok(Json(json!({ "success": true, "count": activities.len(), "activities": activities })))
}
