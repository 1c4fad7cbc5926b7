//! Error types for payment gateway calls and webhook verification.
//!
//! Gateway failures are split by where they happened (transport, HTTP
//! status, body decoding) so the API layer can pick a status code. Webhook
//! failures distinguish a bad payload from a bad signature because the two
//! are reported differently to the sender.

use thiserror::Error;

/// Result type alias for payment gateway operations.
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Failure talking to the payment gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The gateway answered with a non-2xx status.
    #[error("payment gateway returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code returned by the gateway
        status: u16,
        /// Gateway error message, or the raw body when none was given
        message: String,
    },

    /// The request never produced a response.
    #[error("payment gateway request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("payment gateway response could not be decoded: {0}")]
    Decode(String),

    /// An object id could not be used as a URL path segment.
    #[error("refusing unsafe object id {0:?}")]
    InvalidId(String),

    /// The client was built with unusable settings.
    #[error("invalid payment gateway configuration: {0}")]
    Configuration(String),
}

impl PaymentError {
    /// Creates an API error from a status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api { status, message: message.into() }
    }

    /// Returns the HTTP status if the gateway produced one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_)
            | Self::Decode(_)
            | Self::InvalidId(_)
            | Self::Configuration(_) => None,
        }
    }
}

/// Webhook verification failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// No signature header was sent.
    #[error("signature header missing")]
    MissingSignature,

    /// The signature header could not be parsed.
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),

    /// No signature in the header matched the payload.
    #[error("signature verification failed")]
    VerificationFailed,

    /// The signed timestamp is outside the accepted window.
    #[error("timestamp outside tolerance: {age_seconds}s old, {tolerance_seconds}s allowed")]
    Stale {
        /// Distance between the signed timestamp and now
        age_seconds: i64,
        /// Accepted window
        tolerance_seconds: i64,
    },

    /// The endpoint secret cannot be used as an HMAC key.
    #[error("invalid secret key")]
    InvalidSecret,

    /// The signature matched but the body is not a valid event.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl WebhookError {
    /// Whether the failure is about the body rather than the signature.
    pub const fn is_payload_error(&self) -> bool {
        matches!(self, Self::InvalidPayload(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_api_errors() {
        assert_eq!(PaymentError::api(402, "card declined").status(), Some(402));
        assert_eq!(PaymentError::Transport("reset".into()).status(), None);
    }

    #[test]
    fn payload_errors_are_told_apart_from_signature_errors() {
        assert!(WebhookError::InvalidPayload("eof".into()).is_payload_error());
        assert!(!WebhookError::VerificationFailed.is_payload_error());
        assert!(!WebhookError::Stale { age_seconds: 400, tolerance_seconds: 300 }
            .is_payload_error());
    }
}
