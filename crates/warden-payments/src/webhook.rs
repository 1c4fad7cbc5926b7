//! Webhook signature verification.
//!
//! The gateway signs each delivery with HMAC-SHA256 over `"<t>.<payload>"`
//! using the endpoint secret, and sends the result in a header of the form
//! `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`. Several `v1` entries appear
//! while a secret is being rolled; any one of them may match. Other schemes
//! (`v0=...`) are ignored.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{error::WebhookError, models::WebhookEvent};

type HmacSha256 = Hmac<Sha256>;

/// Accepted distance between the signed timestamp and now.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signed timestamp in Unix seconds
    pub timestamp: i64,
    /// Candidate `v1` signatures, lowercase hex
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    /// Parses a `t=...,v1=...` header.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::InvalidFormat` when the timestamp is missing or
    /// not an integer, or when no `v1` signature is present.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.trim().split_once('=') else { continue };
            match key {
                "t" => {
                    let parsed = value.parse::<i64>().map_err(|_| {
                        WebhookError::InvalidFormat(format!("timestamp is not an integer: {value}"))
                    })?;
                    timestamp = Some(parsed);
                },
                "v1" => signatures.push(value.to_ascii_lowercase()),
                _ => {},
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::InvalidFormat("no timestamp in header".to_string()))?;
        if signatures.is_empty() {
            return Err(WebhookError::InvalidFormat("no v1 signature in header".to_string()));
        }

        Ok(Self { timestamp, signatures })
    }
}

/// Generates HMAC-SHA256 of `payload` as lowercase hex.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSecret` if the secret cannot key the HMAC.
pub fn generate_hmac_hex(payload: &[u8], secret: &str) -> Result<String, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::InvalidSecret)?;

    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Computes the signature the gateway would send for `payload` at
/// `timestamp`.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSecret` if the secret cannot key the HMAC.
pub fn compute_signature(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, WebhookError> {
    let mut signed = Vec::with_capacity(payload.len() + 12);
    signed.extend_from_slice(timestamp.to_string().as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(payload);
    generate_hmac_hex(&signed, secret)
}

/// Builds a complete signature header for `payload`.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSecret` if the secret cannot key the HMAC.
pub fn signature_header(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, WebhookError> {
    Ok(format!("t={timestamp},v1={}", compute_signature(payload, secret, timestamp)?))
}

/// Verifies a signature header against `payload`.
///
/// `now` is the current Unix time in seconds. Timestamps more than
/// `tolerance` seconds away from `now` in either direction are rejected.
///
/// # Errors
///
/// Returns the first reason the delivery could not be trusted.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
    tolerance: i64,
) -> Result<(), WebhookError> {
    let header = header.filter(|h| !h.trim().is_empty()).ok_or(WebhookError::MissingSignature)?;
    if secret.is_empty() {
        return Err(WebhookError::InvalidSecret);
    }

    let parsed = SignatureHeader::parse(header)?;
    let expected = compute_signature(payload, secret, parsed.timestamp)?;

    if !parsed.signatures.iter().any(|candidate| timing_safe_eq(candidate, &expected)) {
        return Err(WebhookError::VerificationFailed);
    }

    let age = now.saturating_sub(parsed.timestamp);
    if age.saturating_abs() > tolerance {
        return Err(WebhookError::Stale { age_seconds: age, tolerance_seconds: tolerance });
    }

    Ok(())
}

/// Verifies a delivery and decodes it into an event.
///
/// # Errors
///
/// Returns a signature error when verification fails, or
/// `WebhookError::InvalidPayload` when the verified body is not an event.
pub fn construct_event(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
) -> Result<WebhookEvent, WebhookError> {
    verify_signature(payload, header, secret, now, DEFAULT_TOLERANCE_SECONDS)?;
    serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
}

/// Constant-time string comparison.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.as_bytes().iter().zip(b.as_bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}
