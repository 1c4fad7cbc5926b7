//! Blacklist and account status checks.
//!
//! The front end calls these before sign-up and sign-in. Both fail open: a
//! blacklist lookup that errors reports the email as in good standing.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use warden_core::normalize_email;

use super::decode_body;
use crate::{error::ApiError, AppState};

const SUSPENDED_MESSAGE: &str =
    "Your account has been suspended. Please contact support@resumeblast.ai for assistance.";

const PERMANENTLY_SUSPENDED_MESSAGE: &str = "This account has been permanently suspended. If you \
                                             believe this is an error, please contact \
                                             support@resumeblast.ai with your account details.";

/// Body of a blacklist or status check.
#[derive(Debug, Default, Deserialize)]
pub struct EmailRequest {
    /// Email to check
    #[serde(default)]
    pub email: Option<String>,
}

fn required_email(body: &Bytes) -> Result<String, ApiError> {
    let request: EmailRequest = decode_body(body);
    let email = request.email.as_deref().map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    Ok(email)
}

/// Checks whether an email may sign up or sign in.
///
/// Returns 403 with the recorded reason when the email is blacklisted.
#[instrument(name = "check_blacklist", skip(state, body))]
pub async fn check_blacklist(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let email = required_email(&body)?;
    let (blacklisted, reason) = state.deletion.is_user_blacklisted(&email).await;

    if blacklisted {
        warn!(email = %email, "Blacklisted user attempted access");
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "success": false,
                "is_blacklisted": true,
                "reason": reason,
                "message": SUSPENDED_MESSAGE,
            })),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "is_blacklisted": false,
            "message": "Account is in good standing",
        })),
    ))
}

/// Reports blacklist and ban status, with entry details when banned.
#[instrument(name = "auth_status", skip(state, body))]
pub async fn auth_status(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let email = required_email(&body)?;
    let (blacklisted, reason) = state.deletion.is_user_blacklisted(&email).await;

    if !blacklisted {
        return Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "is_blacklisted": false,
                "is_banned": false,
                "message": "Account status: Active",
            })),
        ));
    }

    info!(email = %email, "Reporting banned account status");
    let entry = state.deletion.blacklist_info(&email).await;
    let details = json!({
        "deleted_at": entry.as_ref().and_then(|e| e.deleted_at),
        "deleted_by": entry.as_ref().and_then(|e| e.deleted_by.clone()),
        "original_user_id": entry.as_ref().and_then(|e| e.original_user_id.clone()),
    });

    Ok((
        StatusCode::FORBIDDEN,
        Json(json!({
            "success": false,
            "is_blacklisted": true,
            "is_banned": true,
            "reason": reason,
            "blacklist_details": details,
            "message": PERMANENTLY_SUSPENDED_MESSAGE,
        })),
    ))
}

/// Liveness of the auth routes.
#[instrument(name = "auth_test")]
pub async fn auth_test() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Auth API is online",
        "endpoints": ["/api/auth/check-blacklist", "/api/auth/status"],
    }))
}
