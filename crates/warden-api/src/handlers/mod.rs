//! HTTP request handlers for the Warden API.
//!
//! Handlers are grouped by functionality:
//! - `health` - Service banner and configuration health
//! - `users` - Admin account deletion
//! - `auth` - Blacklist and account status checks
//! - `payment` - Checkout sessions and payment verification
//! - `webhook` - Signed payment gateway deliveries
//! - `blast` - Blast relay
//! - `activity` - Recruiter activity log
//!
//! Request bodies are read as raw bytes and decoded here so a missing or
//! malformed body gets the route's own 400 message instead of a generic
//! extractor rejection.

pub mod activity;
pub mod auth;
pub mod blast;
pub mod health;
pub mod payment;
pub mod users;
pub mod webhook;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use activity::{list_activities, list_all_activities, log_activity};
pub use auth::{auth_status, auth_test, check_blacklist};
pub use blast::{blast_test, send_blast};
pub use health::{health_check, root};
pub use payment::{create_checkout_session, verify_payment};
pub use users::delete_user;
pub use webhook::stripe_webhook;

/// Decodes a JSON body, treating an empty or malformed body as absent.
pub(crate) fn decode_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_default()
}

/// Reads a string-or-number field as a trimmed, non-empty string.
pub(crate) fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn malformed_bodies_decode_to_default() {
        let decoded: Option<Value> = decode_body(&Bytes::from_static(b"{not json"));
        assert_eq!(decoded, None);

        let decoded: Option<Value> = decode_body(&Bytes::new());
        assert_eq!(decoded, None);
    }

    #[test]
    fn text_fields_accept_strings_and_numbers() {
        assert_eq!(text_field(Some(&json!(" abc "))), Some("abc".to_string()));
        assert_eq!(text_field(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(text_field(Some(&json!(""))), None);
        assert_eq!(text_field(Some(&json!(null))), None);
        assert_eq!(text_field(None), None);
    }
}
