//! HTTP client for the hosted data store's REST and auth admin APIs.
//!
//! Tables are reached at `{base}/rest/v1/{table}` with PostgREST-style
//! filters (`column=eq.value`). Authentication records are reached at
//! `{base}/auth/v1/admin/users/{id}`. Every request carries the service
//! role key both as `apikey` and as a bearer token.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, IntoUrl, Method, RequestBuilder, Response, Url};
use serde_json::Value;
use tracing::{debug, warn};
use warden_core::{AuthAdmin, DataStore, Query, StoreError, StoreResult, UserId};

/// Largest error body kept for logs and summaries.
const MAX_ERROR_BODY: usize = 1024;

/// Configuration for the store client.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project base URL, without a trailing slash.
    pub base_url: String,
    /// Service role key used for every request.
    pub service_key: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl StoreConfig {
    /// Creates a configuration with default timeout and user agent.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: "Warden/1.0".to_string(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Client for the hosted data store.
///
/// Implements both `DataStore` and `AuthAdmin`; share one instance behind an
/// `Arc` for both roles so requests reuse the same connection pool.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    config: StoreConfig,
}

impl StoreClient {
    /// Creates a new store client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the HTTP client cannot be built.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table)
    }

    /// Builds `{base}/{segments...}`, encoding each segment on its own so an
    /// identifier can never add path levels or a query string.
    fn url_for(&self, segments: &[&str]) -> StoreResult<Url> {
        if let Some(segment) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(StoreError::InvalidPath((*segment).to_string()));
        }

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| StoreError::Transport(format!("invalid store URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| StoreError::Transport("store URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .header(CONTENT_TYPE, "application/json")
    }

    fn table_request(&self, method: Method, table: &str, query: &Query) -> RequestBuilder {
        self.request(method, &self.table_url(table)).query(&query_params(query))
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Transport(format!("timed out after {}s", self.config.timeout.as_secs()))
            } else {
                StoreError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Store responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = read_error_body(response).await;
        warn!(status = status.as_u16(), body = %body, "Store request rejected");
        Err(StoreError::Status { status: status.as_u16(), body })
    }
}

/// Translates a query into PostgREST parameters.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|(column, value)| (column.clone(), format!("eq.{value}")))
        .collect();

    if let Some(select) = &query.select {
        params.push(("select".to_string(), select.clone()));
    }
    if let Some((column, descending)) = &query.order {
        let direction = if *descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{column}.{direction}")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

async fn read_error_body(response: Response) -> String {
    match response.text().await {
        Ok(text) if text.len() > MAX_ERROR_BODY => {
            let mut cut = MAX_ERROR_BODY;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated)", &text[..cut])
        },
        Ok(text) => text,
        Err(e) => format!("[Failed to read response body: {e}]"),
    }
}

fn require_filter(table: &str, query: &Query) -> StoreResult<()> {
    if query.filters.is_empty() {
        return Err(StoreError::Unfiltered { table: table.to_string() });
    }
    Ok(())
}

#[async_trait]
impl DataStore for StoreClient {
    async fn select(&self, table: &str, query: &Query) -> StoreResult<Vec<Value>> {
        let response = self.send(self.table_request(Method::GET, table, query)).await?;
        let body: Value = response.json().await.map_err(|e| StoreError::Decode(e.to_string()))?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!("expected an array of rows, got {other}"))),
        }
    }

    async fn insert(&self, table: &str, row: Value) -> StoreResult<()> {
        let request = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&row);
        self.send(request).await.map(|_| ())
    }

    async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> StoreResult<()> {
        let request = self
            .request(Method::POST, &self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);
        self.send(request).await.map(|_| ())
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> StoreResult<()> {
        require_filter(table, query)?;
        let request = self
            .table_request(Method::PATCH, table, query)
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send(request).await.map(|_| ())
    }

    async fn delete(&self, table: &str, query: &Query) -> StoreResult<()> {
        require_filter(table, query)?;
        let request =
            self.table_request(Method::DELETE, table, query).header("Prefer", "return=minimal");
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl AuthAdmin for StoreClient {
    async fn delete_user(&self, user_id: &UserId) -> StoreResult<()> {
        let url = self.url_for(&["auth", "v1", "admin", "users", user_id.as_str()])?;
        self.send(self.request(Method::DELETE, url)).await.map(|_| ())
    }
}
