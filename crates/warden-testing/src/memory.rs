//! In-memory implementations of the store traits.
//!
//! `MemoryStore` keeps tables as vectors of JSON objects and honours the
//! same exact-match, merge-on-conflict semantics as the hosted store.
//! Failures can be injected per operation and table to exercise the
//! orchestrator's fault isolation.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use warden_core::{AuthAdmin, DataStore, Query, StoreError, StoreResult, UserId};

/// Store operation, used for failure injection and call recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Filtered read
    Select,
    /// Plain insert
    Insert,
    /// Insert with merge on conflict
    Upsert,
    /// Partial update
    Update,
    /// Filtered delete
    Delete,
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Operation performed
    pub operation: Operation,
    /// Table targeted
    pub table: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory data store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<HashMap<(Operation, String), StoreError>>,
    calls: Mutex<Vec<Call>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row into a table.
    pub fn seed(&self, table: &str, row: Value) {
        lock(&self.tables).entry(table.to_string()).or_default().push(row);
    }

    /// Returns a copy of every row in a table.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Makes every future `operation` on `table` fail with `error`.
    pub fn fail(&self, operation: Operation, table: &str, error: StoreError) {
        lock(&self.failures).insert((operation, table.to_string()), error);
    }

    /// Makes every future `operation` on `table` fail with an HTTP status.
    pub fn fail_with_status(&self, operation: Operation, table: &str, status: u16) {
        self.fail(operation, table, StoreError::Status { status, body: "injected".to_string() });
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Returns the tables targeted by `operation`, in call order.
    pub fn tables_for(&self, operation: Operation) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .map(|call| call.table)
            .collect()
    }

    fn enter(&self, operation: Operation, table: &str) -> StoreResult<()> {
        lock(&self.calls).push(Call { operation, table: table.to_string() });
        match lock(&self.failures).get(&(operation, table.to_string())) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn cell_matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => expected == "null",
        Some(other) => other.to_string() == expected,
    }
}

fn row_matches(row: &Value, query: &Query) -> bool {
    query.filters.iter().all(|(column, value)| cell_matches(row, column, value))
}

fn project(row: &Value, select: Option<&str>) -> Value {
    let Some(select) = select.filter(|s| *s != "*") else { return row.clone() };
    let columns: HashSet<&str> = select.split(',').map(str::trim).collect();
    let projected: Map<String, Value> = row
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter(|(key, _)| columns.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();
    Value::Object(projected)
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn sort_key(row: &Value, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Value>> {
        self.enter(Operation::Select, table)?;

        let mut rows: Vec<Value> =
            self.rows(table).into_iter().filter(|row| row_matches(row, query)).collect();

        if let Some((column, descending)) = &query.order {
            rows.sort_by_key(|row| sort_key(row, column));
            if *descending {
                rows.reverse();
            }
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows.iter().map(|row| project(row, query.select.as_deref())).collect())
    }

    async fn insert(&self, table: &str, row: Value) -> StoreResult<()> {
        self.enter(Operation::Insert, table)?;
        self.seed(table, row);
        Ok(())
    }

    async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> StoreResult<()> {
        self.enter(Operation::Upsert, table)?;

        let key = row.get(on_conflict).cloned().unwrap_or(Value::Null);
        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();

        match rows.iter_mut().find(|existing| existing.get(on_conflict) == Some(&key)) {
            Some(existing) => merge(existing, &row),
            None => rows.push(row),
        }
        Ok(())
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> StoreResult<()> {
        self.enter(Operation::Update, table)?;

        let mut tables = lock(&self.tables);
        if let Some(rows) = tables.get_mut(table) {
            rows.iter_mut().filter(|row| row_matches(row, query)).for_each(|row| merge(row, &patch));
        }
        Ok(())
    }

    async fn delete(&self, table: &str, query: &Query) -> StoreResult<()> {
        self.enter(Operation::Delete, table)?;

        let mut tables = lock(&self.tables);
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !row_matches(row, query));
        }
        Ok(())
    }
}

/// In-memory auth admin API.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    users: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<UserId>>,
    failure: Mutex<Option<StoreError>>,
}

impl MemoryAuth {
    /// Creates an auth store with no users.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authentication record.
    pub fn add_user(&self, user_id: &str) {
        lock(&self.users).insert(user_id.to_string());
    }

    /// Whether an authentication record exists.
    pub fn has_user(&self, user_id: &str) -> bool {
        lock(&self.users).contains(user_id)
    }

    /// Makes every future delete fail with `error`.
    pub fn fail(&self, error: StoreError) {
        *lock(&self.failure) = Some(error);
    }

    /// Identifiers passed to `delete_user`, in order.
    pub fn deleted(&self) -> Vec<UserId> {
        lock(&self.deleted).clone()
    }
}

#[async_trait]
impl AuthAdmin for MemoryAuth {
    async fn delete_user(&self, user_id: &UserId) -> StoreResult<()> {
        lock(&self.deleted).push(user_id.clone());
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        lock(&self.users).remove(user_id.as_str());
        Ok(())
    }
}
