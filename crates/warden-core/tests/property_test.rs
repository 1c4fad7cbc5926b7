//! Property-based tests for blacklist key and reason rules.
//!
//! These rules decide who is barred, so they must hold for any input the
//! admin tooling or sign-up flow can produce.

#![allow(clippy::unwrap_used)] // Regex strategies are known to be valid

use chrono::{TimeZone, Utc};
use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use warden_core::{normalize_email, BlacklistEntry, ReasonCategory, UserId};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn email_strategy() -> impl Strategy<Value = String> {
    (
        prop::string::string_regex(" {0,2}").unwrap(),
        prop::string::string_regex("[a-zA-Z0-9._+-]{1,20}").unwrap(),
        prop::string::string_regex("[a-zA-Z0-9-]{1,15}\\.[a-zA-Z]{2,4}").unwrap(),
        prop::string::string_regex(" {0,2}").unwrap(),
    )
        .prop_map(|(lead, local, domain, trail)| format!("{lead}{local}@{domain}{trail}"))
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn normalisation_is_idempotent(email in email_strategy()) {
        let once = normalize_email(&email);
        prop_assert_eq!(normalize_email(&once), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
        prop_assert_eq!(once.to_lowercase(), once.clone());
    }

    #[test]
    fn case_variants_share_a_blacklist_key(email in email_strategy()) {
        prop_assert_eq!(
            normalize_email(&email.to_uppercase()),
            normalize_email(&email.to_lowercase())
        );
    }

    #[test]
    fn any_reason_mentioning_refund_is_a_refund(
        prefix in "[a-zA-Z ]{0,20}",
        word in prop::sample::select(vec!["refund", "Refund", "REFUND", "refunded", "ReFuNd"]),
        suffix in "[a-zA-Z ]{0,20}",
    ) {
        let reason = format!("{prefix}{word}{suffix}");
        prop_assert_eq!(ReasonCategory::from_reason(&reason), ReasonCategory::Refund);
    }

    #[test]
    fn reasons_without_refund_are_admin(reason in "[a-eg-zA-EG-Z ]{0,40}") {
        // No 'f' or 'F' means the word cannot appear.
        prop_assert_eq!(ReasonCategory::from_reason(&reason), ReasonCategory::Admin);
    }

    #[test]
    fn blacklist_entries_always_store_normalised_email(
        email in email_strategy(),
        reason in "[a-zA-Z ]{1,30}",
    ) {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let entry = BlacklistEntry::for_deletion(&email, Some(UserId::from("uid")), &reason, now);

        prop_assert_eq!(&entry.email, &normalize_email(&email));
        prop_assert_eq!(
            entry.reason_category(),
            Some(ReasonCategory::from_reason(&reason))
        );
    }
}
