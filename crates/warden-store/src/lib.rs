//! REST client for the hosted data store.
//!
//! The store is reached over its PostgREST table API and its auth admin API,
//! both authenticated with the service role key. `StoreClient` implements
//! the `DataStore` and `AuthAdmin` traits from `warden-core`, so the deletion
//! orchestrator and the HTTP handlers never deal with URLs or headers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;

pub use client::{query_params, StoreClient, StoreConfig};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
