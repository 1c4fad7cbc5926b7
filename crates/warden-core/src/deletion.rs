//! Account deletion orchestration and blacklist checks.
//!
//! Deleting an account is a linear, best-effort pipeline:
//!
//! 1. **Resolve identifier** - by email in the accounts table, then in the
//!    most recent payment record
//! 2. **Blacklist** - upsert the email into the permanent denylist
//! 3. **Ban** - mark the account row banned
//! 4. **Cleanup** - delete per-user rows from every data table, then the
//!    account row
//! 5. **Auth deletion** - remove the authentication record
//!
//! Steps 3-5 need an identifier and are skipped without one. Every external
//! call is isolated: a failure is logged and recorded in the summary and the
//! next step still runs. Nothing is retried and nothing is rolled back.
//!
//! The blacklist write is not atomic with the later steps. A crash between
//! the blacklist write and the auth deletion leaves an account that is
//! blacklisted but can still authenticate until the deletion is rerun.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{Result, StoreError, WardenError},
    models::{
        normalize_email, BlacklistEntry, DeletionStep, DeletionSummary, StepFailure, UserId,
        BLACKLIST_TABLE, DEFAULT_DELETION_REASON, PAYMENTS_TABLE, USERS_TABLE, USER_DATA_TABLES,
    },
    store::{AuthAdmin, DataStore, Query, StoreResult},
    time::Clock,
};

/// Outcome of clearing per-user rows across all data tables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Tables cleared, in the order attempted
    pub cleared: Vec<String>,
    /// Tables whose delete failed, with the failure
    pub skipped: Vec<(String, StoreError)>,
}

/// Coordinates account deletion against the data store and auth admin API.
#[derive(Debug, Clone)]
pub struct DeletionService {
    store: Arc<dyn DataStore>,
    auth: Arc<dyn AuthAdmin>,
    clock: Arc<dyn Clock>,
}

impl DeletionService {
    /// Creates a new deletion service.
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<dyn AuthAdmin>, clock: Arc<dyn Clock>) -> Self {
        Self { store, auth, clock }
    }

    /// Deletes an account and its data, blacklisting the email first.
    ///
    /// A blank `reason` falls back to `"Admin deletion"`.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Validation` if `email` is blank. Dependency
    /// failures never surface here; they are recorded in the summary.
    #[instrument(name = "delete_user_data", skip(self, email, user_id), fields(email = %email))]
    pub async fn delete_user_data(
        &self,
        email: &str,
        user_id: Option<UserId>,
        reason: &str,
    ) -> Result<DeletionSummary> {
        let email = email.trim();
        if email.is_empty() {
            return Err(WardenError::validation("Email required"));
        }
        let reason = match reason.trim() {
            "" => DEFAULT_DELETION_REASON,
            reason => reason,
        };

        info!(reason, "Starting user deletion");
        let mut summary = DeletionSummary::new(email, reason, self.clock.now_utc());

        let user_id = match user_id {
            Some(user_id) => {
                debug!(user_id = %user_id, "User ID provided by caller");
                Some(user_id)
            },
            None => self.resolve_user_id(email).await,
        };
        summary.user_id = user_id.clone();

        match self.add_to_blacklist(email, user_id.clone(), reason).await {
            Ok(()) => summary.blacklisted = true,
            Err(e) => record_failure(&mut summary, DeletionStep::Blacklist, None, &e),
        }
        summary.steps_completed.push(DeletionStep::Blacklist);

        let Some(user_id) = user_id else {
            warn!("No user ID resolved, only the blacklist entry was written");
            return Ok(summary);
        };

        if let Err(e) = self.ban_user(&user_id, reason).await {
            record_failure(&mut summary, DeletionStep::BanUser, None, &e);
        }
        summary.steps_completed.push(DeletionStep::BanUser);

        let cleanup = self.delete_from_all_tables(&user_id).await;
        for (table, e) in &cleanup.skipped {
            record_failure(&mut summary, DeletionStep::DatabaseCleanup, Some(table), e);
        }
        summary.tables_deleted = cleanup.cleared;
        summary.steps_completed.push(DeletionStep::DatabaseCleanup);

        if let Err(e) = self.delete_from_auth(&user_id).await {
            record_failure(&mut summary, DeletionStep::AuthDeletion, None, &e);
        }
        summary.steps_completed.push(DeletionStep::AuthDeletion);

        info!(
            user_id = %user_id,
            blacklisted = summary.blacklisted,
            steps = summary.steps_completed.len(),
            tables_cleared = summary.tables_deleted.len(),
            failures = summary.step_failures.len(),
            "User deletion completed"
        );

        Ok(summary)
    }

    /// Finds the account identifier for an email.
    ///
    /// Looks in the accounts table first, then in the most recent payment
    /// record for the email. Lookup failures count as "not found".
    pub async fn resolve_user_id(&self, email: &str) -> Option<UserId> {
        let by_account = Query::new().eq("email", email).select("id").limit(1);
        match self.first_string(USERS_TABLE, &by_account, "id").await {
            Ok(Some(user_id)) => {
                debug!(user_id = %user_id, "User ID found in users table");
                return Some(user_id);
            },
            Ok(None) => {},
            Err(e) => warn!(error = %e, "Users lookup failed"),
        }

        let by_payment = Query::new()
            .eq("user_email", email)
            .select("user_id")
            .order_desc("initiated_at")
            .limit(1);
        match self.first_string(PAYMENTS_TABLE, &by_payment, "user_id").await {
            Ok(Some(user_id)) => {
                debug!(user_id = %user_id, "User ID found in payments table");
                Some(user_id)
            },
            Ok(None) => {
                debug!("User ID not found in any table");
                None
            },
            Err(e) => {
                warn!(error = %e, "Payments lookup failed");
                None
            },
        }
    }

    /// Upserts the email into the blacklist, keyed by lower-cased email.
    ///
    /// # Errors
    ///
    /// Returns the store error if the write is not acknowledged.
    pub async fn add_to_blacklist(
        &self,
        email: &str,
        original_user_id: Option<UserId>,
        reason: &str,
    ) -> StoreResult<()> {
        let entry = BlacklistEntry::for_deletion(email, original_user_id, reason, self.clock.now_utc());
        let row = serde_json::to_value(&entry).map_err(|e| StoreError::Decode(e.to_string()))?;

        match self.store.upsert(BLACKLIST_TABLE, "email", row).await {
            Ok(()) => {
                info!(email = %entry.email, "Added to blacklist");
                Ok(())
            },
            Err(e) => {
                warn!(email = %entry.email, error = %e, "Blacklist write failed");
                Err(e)
            },
        }
    }

    /// Marks the account row as banned.
    ///
    /// # Errors
    ///
    /// Returns the store error if the patch fails.
    pub async fn ban_user(&self, user_id: &UserId, reason: &str) -> StoreResult<()> {
        let now = self.clock.now_rfc3339();
        let patch = json!({
            "is_banned": true,
            "ban_reason": reason,
            "banned_at": now,
            "account_status": "banned",
            "updated_at": now,
        });

        let query = Query::new().eq("id", user_id.as_str());
        match self.store.update(USERS_TABLE, &query, patch).await {
            Ok(()) => {
                info!(user_id = %user_id, "User banned");
                Ok(())
            },
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Could not ban user");
                Err(e)
            },
        }
    }

    /// Deletes per-user rows from every data table, then the account row.
    ///
    /// Each table is attempted regardless of earlier failures.
    pub async fn delete_from_all_tables(&self, user_id: &UserId) -> CleanupOutcome {
        let mut outcome = CleanupOutcome::default();
        let by_owner = Query::new().eq("user_id", user_id.as_str());
        let by_id = Query::new().eq("id", user_id.as_str());

        let targets = USER_DATA_TABLES
            .iter()
            .map(|table| (*table, &by_owner))
            .chain(std::iter::once((USERS_TABLE, &by_id)));

        for (table, query) in targets {
            match self.store.delete(table, query).await {
                Ok(()) => {
                    debug!(table, "Cleared table");
                    outcome.cleared.push(table.to_string());
                },
                Err(e) => {
                    warn!(table, error = %e, "Skipped table");
                    outcome.skipped.push((table.to_string(), e));
                },
            }
        }

        outcome
    }

    /// Removes the authentication record.
    ///
    /// # Errors
    ///
    /// Returns the store error if the auth admin API rejects the delete.
    pub async fn delete_from_auth(&self, user_id: &UserId) -> StoreResult<()> {
        match self.auth.delete_user(user_id).await {
            Ok(()) => {
                info!(user_id = %user_id, "Deleted authentication record");
                Ok(())
            },
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Auth deletion failed");
                Err(e)
            },
        }
    }

    /// Checks whether an email is blacklisted.
    ///
    /// Returns `(true, reason)` for blacklisted emails whether or not the
    /// account still exists. Fails open: if the lookup itself fails the
    /// email is reported as not blacklisted.
    #[instrument(name = "is_user_blacklisted", skip(self))]
    pub async fn is_user_blacklisted(&self, email: &str) -> (bool, Option<String>) {
        match self.lookup_blacklist(email).await {
            Ok(Some(entry)) => (true, Some(entry.reason_or_default())),
            Ok(None) => (false, None),
            Err(e) => {
                warn!(error = %e, "Blacklist lookup failed, treating as not blacklisted");
                (false, None)
            },
        }
    }

    /// Returns the full blacklist entry for an email, if readable.
    pub async fn blacklist_info(&self, email: &str) -> Option<BlacklistEntry> {
        match self.lookup_blacklist(email).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Blacklist info lookup failed");
                None
            },
        }
    }

    async fn lookup_blacklist(&self, email: &str) -> StoreResult<Option<BlacklistEntry>> {
        let query = Query::new().eq("email", normalize_email(email)).limit(1);
        let rows = self.store.select(BLACKLIST_TABLE, &query).await?;

        Ok(rows.first().map(BlacklistEntry::from_row))
    }

    async fn first_string(
        &self,
        table: &str,
        query: &Query,
        column: &str,
    ) -> StoreResult<Option<UserId>> {
        let rows = self.store.select(table, query).await?;
        Ok(rows.first().and_then(|row| row.get(column)).and_then(UserId::from_value))
    }
}

fn record_failure(
    summary: &mut DeletionSummary,
    step: DeletionStep,
    table: Option<&str>,
    error: &StoreError,
) {
    summary.step_failures.push(StepFailure {
        step,
        table: table.map(str::to_string),
        error: error.to_string(),
    });
}
