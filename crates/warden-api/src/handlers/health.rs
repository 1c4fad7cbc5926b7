//! Service banner and configuration health.
//!
//! Neither endpoint touches a dependency. Health reports which optional
//! integrations are configured so a deploy with a missing key shows up
//! without sending a payment.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::AppState;

/// Health response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process answers
    pub status: &'static str,
    /// Whether the payment gateway key is set
    pub stripe_configured: bool,
    /// Whether the blast relay URL is set
    pub webhook_configured: bool,
    /// When the check ran
    pub timestamp: String,
}

/// Service banner.
#[instrument(name = "root")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "message": "ResumeBlast API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint handler.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        stripe_configured: state.payments.is_some(),
        webhook_configured: state.relay.is_some(),
        timestamp: state.clock.now_rfc3339(),
    };

    debug!(
        stripe_configured = response.stripe_configured,
        webhook_configured = response.webhook_configured,
        "Health check completed"
    );

    (StatusCode::OK, Json(response))
}
