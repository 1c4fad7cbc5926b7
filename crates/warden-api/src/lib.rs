//! Warden HTTP API.
//!
//! Exposes account deletion, blacklist checks, checkout and payment
//! verification, gateway webhooks, the blast relay, and the recruiter
//! activity log over JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use relay::{RelayClient, RelayResponse};
pub use server::{create_router, start_server};
pub use state::AppState;
