//! Core domain models and account deletion orchestration.
//!
//! Provides the blacklist and deletion types, the store abstractions the
//! orchestrator runs against, and the error taxonomy shared by every other
//! crate in the workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod deletion;
pub mod error;
pub mod models;
pub mod store;
pub mod time;

pub use deletion::{CleanupOutcome, DeletionService};
pub use error::{Result, StoreError, WardenError};
pub use models::{
    normalize_email, BlacklistEntry, DeletionStep, DeletionSummary, ReasonCategory, StepFailure,
    UserId,
};
pub use store::{AuthAdmin, DataStore, Query, StoreResult};
pub use time::{Clock, RealClock, TestClock};
