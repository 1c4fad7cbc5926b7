//! Test doubles and fixtures for deterministic testing.
//!
//! Provides in-memory implementations of the data store and auth admin
//! traits with failure injection, plus row builders and a wired-up
//! environment around the deletion service.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
pub mod memory;

pub use fixtures::{payment_row, user_row, TestEnv, TEST_EPOCH};
pub use memory::{Call, MemoryAuth, MemoryStore, Operation};
pub use warden_core::TestClock;
