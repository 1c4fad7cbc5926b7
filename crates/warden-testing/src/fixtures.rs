//! Row builders and a ready-wired test environment.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use warden_core::{
    models::{USERS_TABLE, USER_DATA_TABLES},
    DeletionService, TestClock,
};

use crate::memory::{MemoryAuth, MemoryStore};

/// Unix timestamp every test environment starts at (2025-01-15T12:00:00Z).
pub const TEST_EPOCH: i64 = 1_736_942_400;

/// Account row as stored in the accounts table.
pub fn user_row(user_id: &str, email: &str) -> Value {
    json!({
        "id": user_id,
        "email": email,
        "is_banned": false,
        "account_status": "active",
    })
}

/// Payment row referencing an email, as written at checkout.
pub fn payment_row(user_id: &str, email: &str, initiated_at: &str) -> Value {
    json!({
        "user_id": user_id,
        "user_email": email,
        "stripe_session_id": format!("cs_test_{user_id}"),
        "amount": 14900,
        "currency": "usd",
        "status": "initiated",
        "initiated_at": initiated_at,
    })
}

/// In-memory collaborators wired into a deletion service.
#[derive(Debug, Clone)]
pub struct TestEnv {
    /// Data store double
    pub store: Arc<MemoryStore>,
    /// Auth admin double
    pub auth: Arc<MemoryAuth>,
    /// Clock shared with the service
    pub clock: TestClock,
}

impl TestEnv {
    /// Creates an empty environment with the clock at `TEST_EPOCH`.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            auth: Arc::new(MemoryAuth::new()),
            clock: TestClock::at_unix(TEST_EPOCH),
        }
    }

    /// Builds a deletion service over this environment.
    pub fn deletion_service(&self) -> DeletionService {
        DeletionService::new(self.store.clone(), self.auth.clone(), Arc::new(self.clock.clone()))
    }

    /// Seeds an account, its auth record, and one row in every data table.
    pub fn seed_account(&self, user_id: &str, email: &str) {
        self.store.seed(USERS_TABLE, user_row(user_id, email));
        for table in USER_DATA_TABLES {
            self.store.seed(table, json!({ "user_id": user_id, "marker": table }));
        }
        self.auth.add_user(user_id);
    }

    /// Returns the start time as an RFC 3339 string.
    pub fn epoch_rfc3339() -> String {
        Utc.timestamp_opt(TEST_EPOCH, 0).single().unwrap_or_default().to_rfc3339()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
