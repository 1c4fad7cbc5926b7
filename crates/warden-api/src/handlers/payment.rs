//! Checkout sessions and payment verification.
//!
//! A checkout writes an `initiated` row to the payments table keyed by the
//! gateway session id. Verification, from the redirect or from the
//! gateway webhook, patches that row to `completed` with the card and
//! receipt details the gateway reports.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use warden_core::{models::PAYMENTS_TABLE, Query, WardenError};
use warden_payments::{
    models::{CURRENCY, PRICE_CENTS},
    CheckoutRequest, CheckoutSession, PaymentClient, PaymentCompletion,
};

use super::{decode_body, text_field};
use crate::{error::ApiError, AppState};

/// Body of a checkout request.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutBody {
    /// Buyer email
    #[serde(default)]
    pub email: Option<String>,
    /// Buyer account identifier
    #[serde(default)]
    pub user_id: Option<Value>,
}

/// Body of a verification request.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyBody {
    /// Gateway checkout session id
    #[serde(default)]
    pub session_id: Option<String>,
}

pub(crate) fn payment_client(state: &AppState) -> Result<Arc<PaymentClient>, ApiError> {
    state
        .payments
        .clone()
        .ok_or_else(|| WardenError::NotConfigured("Payment gateway".to_string()).into())
}

/// Creates a hosted checkout session and records the initiated payment.
///
/// A failed payment row insert is logged but does not fail the checkout;
/// the buyer can still pay and the webhook will find no row to complete.
#[instrument(name = "create_checkout_session", skip(state, body))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CheckoutBody = decode_body(&body);
    let email = request.email.as_deref().map(str::trim).unwrap_or_default().to_string();
    let user_id = text_field(request.user_id.as_ref());

    let Some(user_id) = user_id.filter(|_| !email.is_empty()) else {
        return Err(ApiError::bad_request("email and user_id are required"));
    };

    let payments = payment_client(&state)?;
    let checkout = CheckoutRequest::new(&email, &user_id, &state.frontend_url);
    let session = payments.create_checkout_session(&checkout).await?;

    let user_name = email.split('@').next().filter(|name| !name.is_empty()).unwrap_or("unknown");
    let record = json!({
        "user_id": user_id,
        "user_email": email,
        "user_name": user_name,
        "stripe_session_id": session.id,
        "amount": PRICE_CENTS,
        "currency": CURRENCY,
        "status": "initiated",
        "initiated_at": state.clock.now_rfc3339(),
    });
    if let Err(e) = state.store.insert(PAYMENTS_TABLE, record).await {
        warn!(session_id = %session.id, error = %e, "Failed to record initiated payment");
    }

    info!(session_id = %session.id, user_id = %user_id, "Checkout session started");
    Ok(Json(json!({ "success": true, "id": session.id, "url": session.url })))
}

/// Confirms a paid session and marks its payment row completed.
///
/// Unpaid sessions answer `{"success": false}` with status 200.
#[instrument(name = "verify_payment", skip(state, body))]
pub async fn verify_payment(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: VerifyBody = decode_body(&body);
    let Some(session_id) = request.session_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    else {
        return Err(ApiError::bad_request("session_id required"));
    };

    let payments = payment_client(&state)?;
    let session = payments.retrieve_session(session_id).await?;

    if !session.is_paid() {
        info!(session_id, status = ?session.payment_status, "Session not paid");
        return Ok(Json(json!({ "success": false })));
    }

    complete_payment(&state, &payments, &session).await?;
    Ok(Json(json!({ "success": true })))
}

/// Patches the payment row for a paid session.
///
/// # Errors
///
/// Returns a gateway error if related objects cannot be retrieved, or 500
/// if the row update is rejected.
pub(crate) async fn complete_payment(
    state: &AppState,
    payments: &PaymentClient,
    session: &CheckoutSession,
) -> Result<(), ApiError> {
    let Some(details) = payments.payment_details(session).await? else {
        warn!(session_id = %session.id, "No payment intent on paid session, nothing to record");
        return Ok(());
    };

    let patch = PaymentCompletion::new(details, state.clock.now_utc()).to_patch();
    let query = Query::new().eq("stripe_session_id", session.id.as_str());

    state.store.update(PAYMENTS_TABLE, &query, patch).await.map_err(|e| {
        ApiError::internal("Payment record update failed").with_field("details", e.to_string())
    })?;

    info!(session_id = %session.id, "Payment verified and stored");
    Ok(())
}
