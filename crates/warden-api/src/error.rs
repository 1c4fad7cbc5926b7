//! Error responses for HTTP handlers.
//!
//! Every failure is rendered as `{"success": false, "error": "<message>"}`
//! plus any route-specific fields. The status comes from the error taxonomy
//! unless a handler picks one explicitly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use tracing::{error, warn};
use warden_core::WardenError;
use warden_payments::PaymentError;

/// An error ready to be sent to the caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<&'static str>,
    extra: Map<String, Value>,
}

impl ApiError {
    /// Creates an error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), code: None, extra: Map::new() }
    }

    /// 400 with a plain message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 500 with a plain message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Adds a field to the response body.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Maps an error category to a response status.
pub fn status_for(error: &WardenError) -> StatusCode {
    match error {
        WardenError::Validation(_) => StatusCode::BAD_REQUEST,
        WardenError::Relay(_) => StatusCode::BAD_GATEWAY,
        WardenError::RelayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        WardenError::Store(_)
        | WardenError::Payment(_)
        | WardenError::NotConfigured(_)
        | WardenError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<WardenError> for ApiError {
    fn from(error: WardenError) -> Self {
        Self {
            status: status_for(&error),
            message: error.message(),
            code: Some(error.code()),
            extra: Map::new(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(error: PaymentError) -> Self {
        match error {
            PaymentError::InvalidId(_) => WardenError::validation("Invalid session id").into(),
            other => WardenError::Payment(other.to_string()).into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), code = ?self.code, error = %self.message, "Request failed");
        } else {
            warn!(status = self.status.as_u16(), code = ?self.code, error = %self.message, "Request rejected");
        }

        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(self.message));
        body.extend(self.extra);

        (self.status, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use warden_core::StoreError;

    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(status_for(&WardenError::validation("Email required")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&WardenError::Store(StoreError::Transport("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for(&WardenError::Relay("bad".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&WardenError::RelayTimeout { timeout_seconds: 30 }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn unusable_gateway_ids_are_caller_errors() {
        let err = ApiError::from(PaymentError::InvalidId("..".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(PaymentError::api(402, "Card declined"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn message_has_no_code_prefix() {
        let err = ApiError::from(WardenError::validation("Email required"));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Email required");
    }
}
