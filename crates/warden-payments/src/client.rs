//! HTTP client for the payment gateway.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Non-2xx responses carry a JSON body of the form
//! `{"error": {"message": ...}}`; the message is surfaced when present.

use std::{fmt, time::Duration};

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{PaymentError, Result},
    models::{
        CheckoutRequest, CheckoutSession, Charge, Expandable, PaymentDetails, PaymentMethod,
    },
};

/// Default gateway base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Largest error body kept when the gateway returns no message.
const MAX_ERROR_BODY: usize = 1024;

/// Configuration for the gateway client.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway base URL, without a trailing slash
    pub api_base: String,
    /// Secret API key
    pub secret_key: String,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl PaymentConfig {
    /// Creates a configuration against the default base URL.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: secret_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Points the client at another base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client for the payment gateway.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl PaymentClient {
    /// Creates a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Configuration` when the key is blank or the
    /// HTTP client cannot be built.
    pub fn new(config: PaymentConfig) -> Result<Self> {
        if config.secret_key.trim().is_empty() {
            return Err(PaymentError::Configuration("secret key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("Warden/1.0")
            .build()
            .map_err(|e| PaymentError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Creates a hosted checkout session for the single product.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure.
    #[instrument(skip(self, request), fields(client_reference_id = %request.client_reference_id))]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession> {
        let builder = self.post(&["v1", "checkout", "sessions"])?.form(&request.form_fields());
        let session: CheckoutSession = self.send(builder).await?;

        info!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    /// Retrieves a checkout session with its payment intent and payment
    /// method expanded.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let builder = self.get(&["v1", "checkout", "sessions", session_id])?.query(&[
            ("expand[]", "payment_intent"),
            ("expand[]", "payment_intent.payment_method"),
        ]);
        self.send(builder).await
    }

    /// Retrieves a payment method.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure.
    pub async fn retrieve_payment_method(&self, id: &str) -> Result<PaymentMethod> {
        self.send(self.get(&["v1", "payment_methods", id])?).await
    }

    /// Retrieves a charge.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure.
    pub async fn retrieve_charge(&self, id: &str) -> Result<Charge> {
        self.send(self.get(&["v1", "charges", id])?).await
    }

    /// Collects the details stored on a completed payment record.
    ///
    /// The payment method and latest charge are fetched when the session
    /// only references them by id. Returns `None` when the session has no
    /// payment intent.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure from any follow-up retrieval.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn payment_details(&self, session: &CheckoutSession) -> Result<Option<PaymentDetails>> {
        let intent = match &session.payment_intent {
            None => {
                warn!("Session has no payment intent");
                return Ok(None);
            },
            Some(Expandable::Id(id)) => {
                debug!(payment_intent_id = %id, "Payment intent not expanded");
                return Ok(Some(PaymentDetails {
                    payment_intent_id: Some(id.clone()),
                    amount: session.amount_total,
                    currency: session.currency.clone(),
                    ..PaymentDetails::default()
                }));
            },
            Some(Expandable::Object(intent)) => intent,
        };

        let method = match &intent.payment_method {
            Some(Expandable::Id(id)) => Some(self.retrieve_payment_method(id).await?),
            Some(Expandable::Object(method)) => Some(method.as_ref().clone()),
            None => None,
        };
        let card = method.and_then(|m| m.card);

        let receipt_url = match &intent.latest_charge {
            Some(Expandable::Id(id)) => self.retrieve_charge(id).await?.receipt_url,
            Some(Expandable::Object(charge)) => charge.receipt_url.clone(),
            None => None,
        };

        Ok(Some(PaymentDetails {
            payment_intent_id: Some(intent.id.clone()),
            card_brand: card.as_ref().map(|c| c.brand.clone()),
            card_last4: card.map(|c| c.last4),
            receipt_url,
            amount: session.amount_total,
            currency: session.currency.clone(),
        }))
    }

    /// Builds `{api_base}/{segments...}` with every segment encoded on its
    /// own, so an id taken from a request can only name one object.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(segment) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(PaymentError::InvalidId((*segment).to_string()));
        }

        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| PaymentError::Configuration(format!("invalid API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| PaymentError::Configuration("API base cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.client.get(self.endpoint(segments)?).bearer_auth(&self.config.secret_key))
    }

    fn post(&self, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.client.post(self.endpoint(segments)?).bearer_auth(&self.config.secret_key))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                PaymentError::Transport(format!(
                    "timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else {
                PaymentError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            warn!(status = status.as_u16(), message = %message, "Payment gateway rejected request");
            return Err(PaymentError::api(status.as_u16(), message));
        }

        response.json::<T>().await.map_err(|e| PaymentError::Decode(e.to_string()))
    }
}

async fn error_message(response: Response) -> String {
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return format!("[Failed to read response body: {e}]"),
    };

    let message = serde_json::from_str::<Value>(&text).ok().and_then(|body| {
        body.pointer("/error/message").and_then(Value::as_str).map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if text.len() > MAX_ERROR_BODY => {
            let mut cut = MAX_ERROR_BODY;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated)", &text[..cut])
        },
        None => text,
    }
}
