//! Outbound relay for blast payloads.
//!
//! Forwards the caller's JSON unchanged to the configured webhook and hands
//! back whatever status and body the webhook produced. Error statuses are
//! not errors here; the handler decides how to report them.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};
use warden_core::{Result, WardenError};

/// Response from the relay webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    /// HTTP status returned
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl RelayResponse {
    /// Whether the webhook reported an error.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Client for the outbound relay webhook.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl RelayClient {
    /// Creates a relay client for `url`.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::NotConfigured` if the URL is blank, or
    /// `WardenError::Other` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(WardenError::NotConfigured("Relay webhook URL".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Warden/1.0")
            .build()
            .map_err(|e| WardenError::Other(e.into()))?;

        Ok(Self { client, url, timeout })
    }

    /// Posts `payload` to the webhook.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::RelayTimeout` when the webhook does not answer
    /// within the timeout, or `WardenError::Relay` when no response arrives
    /// at all.
    #[instrument(name = "relay_send", skip(self, payload))]
    pub async fn send(&self, payload: &Value) -> Result<RelayResponse> {
        let response = self.client.post(&self.url).json(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(timeout_seconds = self.timeout.as_secs(), "Relay timed out");
                WardenError::RelayTimeout { timeout_seconds: self.timeout.as_secs() }
            } else {
                warn!(error = %e, "Relay request failed");
                WardenError::Relay(format!("Failed to connect to relay webhook: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("[Failed to read response body: {e}]"));

        debug!(status, body_len = body.len(), "Relay responded");
        Ok(RelayResponse { status, body })
    }
}
