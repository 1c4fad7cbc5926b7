//! Abstractions over the hosted data store.
//!
//! The store exposes named tables with exact-match filtering, and a separate
//! admin API for authentication records. The orchestrator only talks to
//! these traits; `warden-store` implements them over HTTP and
//! `warden-testing` implements them in memory.

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::StoreError, models::UserId};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Row selection for reads, patches, and deletes.
///
/// Filters are exact-match only. Ordering and limits apply to reads and are
/// ignored by writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Column/value pairs that must all match
    pub filters: Vec<(String, String)>,
    /// Columns to return; all columns when `None`
    pub select: Option<String>,
    /// Column to order by, descending when the flag is set
    pub order: Option<(String, bool)>,
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a query matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exact-match filter.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Restricts the returned columns.
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Orders results by a column, newest first.
    #[must_use]
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some((column.into(), true));
        self
    }

    /// Caps the number of rows returned.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the value this query filters `column` on, if any.
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters.iter().find(|(c, _)| c == column).map(|(_, v)| v.as_str())
    }
}

/// Generic table access against the hosted data store.
#[async_trait]
pub trait DataStore: Send + Sync + std::fmt::Debug {
    /// Reads rows matching the query.
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Value>>;

    /// Inserts a row.
    async fn insert(&self, table: &str, row: Value) -> StoreResult<()>;

    /// Inserts a row, merging into the existing row when `on_conflict`
    /// collides.
    async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> StoreResult<()>;

    /// Applies a partial update to rows matching the query.
    async fn update(&self, table: &str, query: &Query, patch: Value) -> StoreResult<()>;

    /// Deletes rows matching the query. Deleting nothing is not an error.
    async fn delete(&self, table: &str, query: &Query) -> StoreResult<()>;
}

/// Admin access to authentication records.
#[async_trait]
pub trait AuthAdmin: Send + Sync + std::fmt::Debug {
    /// Removes the authentication record so the account can no longer sign in.
    async fn delete_user(&self, user_id: &UserId) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builder_accumulates_filters() {
        let query = Query::new()
            .eq("user_email", "a@b.com")
            .select("user_id")
            .order_desc("initiated_at")
            .limit(1);

        assert_eq!(query.filter_value("user_email"), Some("a@b.com"));
        assert_eq!(query.filter_value("user_id"), None);
        assert_eq!(query.select.as_deref(), Some("user_id"));
        assert_eq!(query.order, Some(("initiated_at".to_string(), true)));
        assert_eq!(query.limit, Some(1));
    }
}
