//! Property-based tests for webhook signature verification.
//!
//! Verification is the only gate in front of payment record updates, so it
//! must accept every correctly signed delivery inside the window and
//! reject every altered one.

#![allow(clippy::unwrap_used)]

use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use warden_payments::{
    verify_signature,
    webhook::{signature_header, SignatureHeader},
    WebhookError, DEFAULT_TOLERANCE_SECONDS,
};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn secret_strategy() -> impl Strategy<Value = String> {
    "whsec_[a-zA-Z0-9]{8,32}"
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn signed_payloads_verify_within_window(
        payload in prop::collection::vec(any::<u8>(), 0..512),
        secret in secret_strategy(),
        timestamp in 1_500_000_000i64..2_000_000_000,
        skew in -DEFAULT_TOLERANCE_SECONDS..=DEFAULT_TOLERANCE_SECONDS,
    ) {
        let header = signature_header(&payload, &secret, timestamp).unwrap();

        prop_assert_eq!(
            verify_signature(&payload, Some(&header), &secret, timestamp + skew, DEFAULT_TOLERANCE_SECONDS),
            Ok(())
        );
    }

    #[test]
    fn flipping_any_byte_breaks_the_signature(
        payload in prop::collection::vec(any::<u8>(), 1..256),
        secret in secret_strategy(),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let timestamp = 1_700_000_000;
        let header = signature_header(&payload, &secret, timestamp).unwrap();

        let mut tampered = payload.clone();
        let at = index.index(tampered.len());
        tampered[at] ^= mask;

        prop_assert_eq!(
            verify_signature(&tampered, Some(&header), &secret, timestamp, DEFAULT_TOLERANCE_SECONDS),
            Err(WebhookError::VerificationFailed)
        );
    }

    #[test]
    fn other_secrets_never_verify(
        payload in prop::collection::vec(any::<u8>(), 0..256),
        secret in secret_strategy(),
        other in secret_strategy(),
    ) {
        prop_assume!(secret != other);
        let timestamp = 1_700_000_000;
        let header = signature_header(&payload, &secret, timestamp).unwrap();

        prop_assert_eq!(
            verify_signature(&payload, Some(&header), &other, timestamp, DEFAULT_TOLERANCE_SECONDS),
            Err(WebhookError::VerificationFailed)
        );
    }

    #[test]
    fn header_parsing_never_panics(header in ".{0,200}") {
        let _ = SignatureHeader::parse(&header);
    }
}
