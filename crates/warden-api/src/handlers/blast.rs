//! Blast relay.
//!
//! Forwards the caller's payload unchanged to the outbound webhook after
//! checking it names at least one recipient.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, instrument};
use warden_core::WardenError;

use super::decode_body;
use crate::{error::ApiError, AppState};

/// Checks a blast payload and returns the number of recipients.
fn recipient_count(payload: &Value) -> Result<usize, ApiError> {
    match payload.get("recipients") {
        Some(Value::Array(recipients)) if recipients.is_empty() => {
            Err(ApiError::bad_request("At least one recipient is required"))
        },
        Some(Value::Array(recipients)) => Ok(recipients.len()),
        _ => Err(ApiError::bad_request("Recipients array is required")),
    }
}

/// Relays a blast to the outbound webhook.
///
/// # Errors
///
/// Returns 400 for a missing body or recipients, 500 when no relay is
/// configured, 502 when the webhook fails or answers with an error, and
/// 504 when it times out.
#[instrument(name = "send_blast", skip(state, body), fields(payload_size = body.len()))]
pub async fn send_blast(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: Value = match decode_body::<Option<Value>>(&body) {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map),
        _ => return Err(ApiError::bad_request("No data provided")),
    };
    let recipients = recipient_count(&payload)?;

    let Some(relay) = state.relay.clone() else {
        return Err(WardenError::NotConfigured("Relay webhook URL".to_string()).into());
    };

    let response = relay.send(&payload).await?;
    if response.is_error() {
        return Err(ApiError::new(
            StatusCode::BAD_GATEWAY,
            format!("Relay returned error: {}", response.status),
        )
        .with_field("details", response.body));
    }

    info!(recipients, status = response.status, "Blast relayed");
    Ok(Json(json!({
        "success": true,
        "message": "Blast sent successfully",
        "status": response.status,
        "response": response.body,
        "recipients_count": recipients,
    })))
}

/// Liveness of the blast routes.
#[instrument(name = "blast_test", skip(state))]
pub async fn blast_test(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Blast API is working",
        "webhook_configured": state.relay.is_some(),
        "timestamp": state.clock.now_rfc3339(),
    }))
}
