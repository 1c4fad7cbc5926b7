//! Signed payment gateway deliveries.
//!
//! Once the signature checks out the handler always answers 200, even if
//! processing the event fails, so the gateway does not redeliver forever.
//! Processing failures are logged.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use warden_core::{models::PAYMENTS_TABLE, Query};
use warden_payments::{construct_event, CHECKOUT_COMPLETED};

use super::payment::{complete_payment, payment_client};
use crate::{error::ApiError, AppState};

/// Header carrying the gateway signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Receives a gateway webhook.
///
/// # Errors
///
/// Returns 500 when no endpoint secret is configured, and 400 when the
/// signature or payload is invalid.
#[instrument(name = "stripe_webhook", skip(state, headers, body), fields(payload_size = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Err(ApiError::internal("Webhook secret missing"));
    };

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = construct_event(&body, signature, secret, state.clock.unix_seconds()).map_err(
        |e| {
            warn!(error = %e, "Rejected webhook delivery");
            if e.is_payload_error() {
                ApiError::bad_request("Invalid payload")
            } else {
                ApiError::bad_request("Invalid signature")
            }
        },
    )?;

    info!(event_id = %event.id, event_type = %event.event_type, "Webhook event received");

    if event.event_type == CHECKOUT_COMPLETED {
        match event.object_id() {
            Some(session_id) => {
                if let Err(e) = handle_checkout_completed(&state, session_id).await {
                    error!(session_id, error = %e.message(), "Failed to process completed checkout");
                }
            },
            None => warn!(event_id = %event.id, "Completed checkout event without a session id"),
        }
    } else {
        debug!(event_type = %event.event_type, "Ignoring event type");
    }

    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}

async fn handle_checkout_completed(state: &AppState, session_id: &str) -> Result<(), ApiError> {
    let payments = payment_client(state)?;
    let session = payments.retrieve_session(session_id).await?;

    let query = Query::new().eq("stripe_session_id", session_id).select("id").limit(1);
    let rows = state.store.select(PAYMENTS_TABLE, &query).await.map_err(|e| {
        ApiError::internal("Payment record lookup failed").with_field("details", e.to_string())
    })?;
    if rows.is_empty() {
        warn!(session_id, "Payment record not found, nothing to update");
        return Ok(());
    }

    complete_payment(state, &payments, &session).await
}
