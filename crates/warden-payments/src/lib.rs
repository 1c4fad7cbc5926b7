//! Payment gateway client and webhook verification.
//!
//! Covers the three gateway calls the checkout flow needs (create a hosted
//! checkout session, retrieve it with its payment intent expanded, and
//! follow references to the payment method and charge) plus verification
//! of signed webhook deliveries.
//!
//! The crate does not read the clock. Callers pass the current time in, so
//! verification windows and completion timestamps are deterministic under
//! test.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod models;
pub mod webhook;

pub use client::{PaymentClient, PaymentConfig, DEFAULT_API_BASE};
pub use error::{PaymentError, Result, WebhookError};
pub use models::{
    CheckoutRequest, CheckoutSession, PaymentCompletion, PaymentDetails, WebhookEvent,
    CHECKOUT_COMPLETED,
};
pub use webhook::{construct_event, verify_signature, DEFAULT_TOLERANCE_SECONDS};
