//! Admin account deletion.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use warden_core::{DeletionSummary, UserId};

use super::{decode_body, text_field};
use crate::{error::ApiError, AppState};

/// Body of a deletion request.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserRequest {
    /// Email of the account to delete
    #[serde(default)]
    pub email: Option<String>,
    /// Identifier, when the caller already knows it
    #[serde(default)]
    pub user_id: Option<Value>,
    /// Free-text reason recorded on the blacklist entry
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response from a completed deletion.
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    /// Always `true`; step failures are reported in the summary
    pub success: bool,
    /// Fixed confirmation message
    pub message: &'static str,
    /// What each step did
    pub summary: DeletionSummary,
}

/// Deletes an account and blacklists its email.
///
/// # Errors
///
/// Returns 400 when the email is missing. Individual step failures do not
/// fail the request; they are listed in `summary.step_failures`.
#[instrument(name = "delete_user", skip(state, body))]
pub async fn delete_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: DeleteUserRequest = decode_body(&body);

    let email = request.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email required"));
    }

    let user_id = text_field(request.user_id.as_ref()).and_then(UserId::parse);
    let reason = request.reason.unwrap_or_default();

    let summary = state.deletion.delete_user_data(email, user_id, &reason).await?;

    info!(
        email = %summary.email,
        blacklisted = summary.blacklisted,
        failures = summary.step_failures.len(),
        "Admin deletion handled"
    );

    Ok((
        StatusCode::OK,
        Json(DeleteUserResponse {
            success: true,
            message: "User deleted and blacklisted",
            summary,
        }),
    ))
}
