//! Error types and result handling for account operations.
//!
//! Defines a structured error taxonomy with codes for client disambiguation.
//! Caller errors, dependency failures, and unexpected failures are kept apart
//! so the HTTP layer can map each to a status without inspecting messages.

use thiserror::Error;

/// Result type alias using `WardenError`.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Failure talking to the hosted data store or its auth admin API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store answered with a non-2xx status.
    #[error("store returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code returned by the store
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The request never produced a response.
    #[error("store request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("store response could not be decoded: {0}")]
    Decode(String),

    /// An identifier could not be used as a URL path segment.
    #[error("refusing unsafe path segment {0:?}")]
    InvalidPath(String),

    /// A patch or delete carried no filter and would touch every row.
    #[error("refusing unfiltered write to table {table}")]
    Unfiltered {
        /// Table the write targeted
        table: String,
    },
}

impl StoreError {
    /// Returns the HTTP status if the store produced one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_)
            | Self::Decode(_)
            | Self::InvalidPath(_)
            | Self::Unfiltered { .. } => None,
        }
    }
}

/// Warden error types with stable codes.
#[derive(Debug, Error)]
pub enum WardenError {
    // Caller errors (E1xxx)
    /// A required field was missing or malformed (E1001).
    #[error("[E1001] {0}")]
    Validation(String),

    // Dependency errors (E2xxx)
    /// Hosted data store call failed (E2001).
    #[error("[E2001] Data store error: {0}")]
    Store(#[from] StoreError),

    /// Payment gateway call failed (E2002).
    #[error("[E2002] Payment gateway error: {0}")]
    Payment(String),

    /// Outbound relay returned an error status (E2003).
    #[error("[E2003] Relay error: {0}")]
    Relay(String),

    /// Outbound relay did not answer in time (E2004).
    #[error("[E2004] Relay timed out after {timeout_seconds}s")]
    RelayTimeout {
        /// Timeout that was exceeded
        timeout_seconds: u64,
    },

    // System errors (E3xxx)
    /// A required setting is absent (E3001).
    #[error("[E3001] Not configured: {0}")]
    NotConfigured(String),

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WardenError {
    /// Convenience constructor for caller errors.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E1001",
            Self::Store(_) => "E2001",
            Self::Payment(_) => "E2002",
            Self::Relay(_) => "E2003",
            Self::RelayTimeout { .. } => "E2004",
            Self::NotConfigured(_) => "E3001",
            Self::Other(_) => "E9999",
        }
    }

    /// Message without the code prefix, suitable for response bodies.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Payment(msg) | Self::Relay(msg) => msg.clone(),
            Self::NotConfigured(what) => format!("{what} not configured"),
            Self::Store(err) => err.to_string(),
            Self::RelayTimeout { .. } => "Request to relay webhook timed out".to_string(),
            Self::Other(err) => err.to_string(),
        }
    }
}
