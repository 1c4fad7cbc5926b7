//! Shared application state.

use std::sync::Arc;

use anyhow::{Context, Result};
use warden_core::{AuthAdmin, Clock, DataStore, DeletionService, RealClock};
use warden_payments::PaymentClient;
use warden_store::StoreClient;

use crate::{config::Config, relay::RelayClient};

/// State shared by every handler.
///
/// Collaborators are trait objects so tests can swap in in-memory doubles.
/// Optional collaborators are absent when their settings are missing; the
/// routes that need them answer 500 instead of failing at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Account deletion and blacklist checks
    pub deletion: DeletionService,
    /// Direct table access for payments and activity
    pub store: Arc<dyn DataStore>,
    /// Payment gateway client
    pub payments: Option<Arc<PaymentClient>>,
    /// Webhook endpoint secret
    pub webhook_secret: Option<String>,
    /// Outbound blast relay
    pub relay: Option<Arc<RelayClient>>,
    /// Front-end URL checkout redirects return to
    pub frontend_url: String,
    /// Clock for every recorded timestamp
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates state with only the data store wired in.
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<dyn AuthAdmin>, clock: Arc<dyn Clock>) -> Self {
        Self {
            deletion: DeletionService::new(store.clone(), auth, clock.clone()),
            store,
            payments: None,
            webhook_secret: None,
            relay: None,
            frontend_url: "http://localhost:5173".to_string(),
            clock,
        }
    }

    /// Builds production state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the data store settings are missing or any
    /// client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(
            StoreClient::new(config.to_store_config()?).context("Failed to build store client")?,
        );
        let mut state = Self::new(store.clone(), store, Arc::new(RealClock::new()));

        if let Some(payment_config) = config.to_payment_config() {
            let client = PaymentClient::new(payment_config)
                .context("Failed to build payment gateway client")?;
            state = state.with_payments(Arc::new(client));
        }
        if let Some(secret) = config.webhook_secret() {
            state = state.with_webhook_secret(secret);
        }
        if let Some(url) = config.relay_url() {
            let relay = RelayClient::new(url, config.relay_timeout())
                .map_err(|e| anyhow::anyhow!(e.message()))
                .context("Failed to build relay client")?;
            state = state.with_relay(Arc::new(relay));
        }

        Ok(state.with_frontend_url(&config.frontend_url))
    }

    /// Enables the payment routes.
    #[must_use]
    pub fn with_payments(mut self, payments: Arc<PaymentClient>) -> Self {
        self.payments = Some(payments);
        self
    }

    /// Enables gateway webhook verification.
    #[must_use]
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    /// Enables the blast relay.
    #[must_use]
    pub fn with_relay(mut self, relay: Arc<RelayClient>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Sets the checkout redirect base.
    #[must_use]
    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = url.into();
        self
    }
}
