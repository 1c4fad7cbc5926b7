//! Domain models for accounts, the blacklist, and deletion summaries.
//!
//! Accounts are not owned by this service: they live in the hosted data
//! store and are addressed by email or by the opaque identifier the store
//! assigned. The types here are projections over those rows.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Table holding one row per account.
pub const USERS_TABLE: &str = "users";

/// Permanent denylist of deleted or banned emails.
pub const BLACKLIST_TABLE: &str = "deleted_users";

/// Payment records, also used to resolve identifiers for orphaned emails.
pub const PAYMENTS_TABLE: &str = "payments";

/// Recruiter activity log.
pub const RECRUITER_ACTIVITY_TABLE: &str = "recruiter_activity";

/// Tables holding per-user rows keyed by `user_id`, cleared in this order
/// before the account row itself.
pub const USER_DATA_TABLES: [&str; 13] = [
    "resume_uploads",
    "blast_history",
    "payment_history",
    "user_activity",
    "recruiter_activity",
    "support_tickets",
    "payments",
    "resumes",
    "blast_campaigns",
    "resume_analysis",
    "blast_recipients",
    "blast_responses",
    "contact_submissions",
];

/// Reason recorded when the caller gives none.
pub const DEFAULT_DELETION_REASON: &str = "Admin deletion";

/// Reason reported for blacklist rows that carry none.
pub const DEFAULT_BLACKLIST_REASON: &str = "Account suspended";

/// Actor recorded in `deleted_by` for orchestrated deletions.
pub const DELETED_BY_SYSTEM: &str = "system";

/// Opaque account identifier assigned by the data store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wraps a raw identifier.
    ///
    /// Identifiers end up as URL path segments, so blank values, dot
    /// segments, and anything containing `/`, `\`, `?`, `#` or `%` are
    /// rejected.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return None;
        }
        if trimmed.contains(['/', '\\', '?', '#', '%']) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Reads an identifier column, which holds a string or a number
    /// depending on the table.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s.as_str()),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Canonical form of an email used as the blacklist key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Coarse classification of a deletion reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonCategory {
    /// Deletion triggered by a payment refund
    Refund,
    /// Any other administrative deletion
    Admin,
}

impl ReasonCategory {
    /// Classifies a free-text reason by substring match on "refund".
    pub fn from_reason(reason: &str) -> Self {
        if reason.to_lowercase().contains("refund") {
            Self::Refund
        } else {
            Self::Admin
        }
    }

    /// Returns the stored string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata written alongside each blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistMetadata {
    /// When the orchestrator wrote the entry
    pub deletion_timestamp: DateTime<Utc>,
    /// Category derived from the reason text
    pub reason_category: ReasonCategory,
}

/// One row of the permanent blacklist.
///
/// Rows written by other tools may omit fields, so everything but the email
/// is optional when read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Lower-cased email, the conflict key
    pub email: String,
    /// Identifier of the account at deletion time, if one was resolved
    #[serde(default)]
    pub original_user_id: Option<UserId>,
    /// Free-text reason
    #[serde(default)]
    pub reason: Option<String>,
    /// When the entry was written
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who wrote the entry
    #[serde(default)]
    pub deleted_by: Option<String>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl BlacklistEntry {
    /// Builds the entry the orchestrator writes for a deletion.
    pub fn for_deletion(
        email: &str,
        original_user_id: Option<UserId>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let metadata = BlacklistMetadata {
            deletion_timestamp: now,
            reason_category: ReasonCategory::from_reason(reason),
        };

        Self {
            email: normalize_email(email),
            original_user_id,
            reason: Some(reason.to_string()),
            deleted_at: Some(now),
            deleted_by: Some(DELETED_BY_SYSTEM.to_string()),
            metadata: serde_json::to_value(metadata).unwrap_or_default(),
        }
    }

    /// Reads a stored row column by column.
    ///
    /// Rows written by other tools carry naive timestamps, numeric ids, or
    /// nothing but the email. A column that cannot be read is left empty
    /// instead of rejecting the row, so an existing entry is never missed.
    pub fn from_row(row: &Value) -> Self {
        let text = |column: &str| row.get(column).and_then(Value::as_str).map(str::to_string);

        Self {
            email: text("email").unwrap_or_default(),
            original_user_id: row.get("original_user_id").and_then(UserId::from_value),
            reason: text("reason"),
            deleted_at: row.get("deleted_at").and_then(Value::as_str).and_then(parse_timestamp),
            deleted_by: text("deleted_by"),
            metadata: row.get("metadata").cloned().unwrap_or(Value::Null),
        }
    }

    /// Reason to report to callers, falling back to a generic one.
    pub fn reason_or_default(&self) -> String {
        self.reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
            .unwrap_or(DEFAULT_BLACKLIST_REASON)
            .to_string()
    }

    /// Category recorded in the metadata, if present and recognised.
    pub fn reason_category(&self) -> Option<ReasonCategory> {
        self.metadata
            .get("reason_category")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Parses an RFC 3339 timestamp, or a naive one taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Named step of the deletion workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStep {
    /// Blacklist upsert
    Blacklist,
    /// Account row marked banned
    BanUser,
    /// Per-user rows deleted from every data table
    DatabaseCleanup,
    /// Authentication record removed
    AuthDeletion,
}

impl DeletionStep {
    /// Returns the wire name of the step.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::BanUser => "ban_user",
            Self::DatabaseCleanup => "database_cleanup",
            Self::AuthDeletion => "auth_deletion",
        }
    }
}

impl fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency failure absorbed during a deletion step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Step during which the failure happened
    pub step: DeletionStep,
    /// Table involved, for cleanup failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Error description
    pub error: String,
}

/// Outcome of one deletion, returned to the caller and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionSummary {
    /// Email as supplied by the caller
    pub email: String,
    /// Reason recorded for the deletion
    pub reason: String,
    /// When the deletion started
    pub timestamp: DateTime<Utc>,
    /// Resolved identifier, if any
    pub user_id: Option<UserId>,
    /// Steps attempted, in order
    pub steps_completed: Vec<DeletionStep>,
    /// Tables whose rows were cleared, in order
    pub tables_deleted: Vec<String>,
    /// Whether the blacklist write was acknowledged
    pub blacklisted: bool,
    /// Dependency failures absorbed along the way
    pub step_failures: Vec<StepFailure>,
}

impl DeletionSummary {
    /// Starts an empty summary.
    pub fn new(email: &str, reason: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            reason: reason.to_string(),
            timestamp,
            user_id: None,
            steps_completed: Vec::new(),
            tables_deleted: Vec::new(),
            blacklisted: false,
            step_failures: Vec::new(),
        }
    }

    /// Whether every attempted step succeeded.
    pub fn is_clean(&self) -> bool {
        self.step_failures.is_empty()
    }
}
