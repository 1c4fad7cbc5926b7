//! Payment gateway objects and the payment record patches built from them.
//!
//! Only the fields this service reads are modelled. Objects that the
//! gateway may return either as an identifier or expanded inline are
//! wrapped in `Expandable`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product name shown on the checkout page.
pub const PRODUCT_NAME: &str = "ResumeBlast Premium";

/// Product description shown on the checkout page.
pub const PRODUCT_DESCRIPTION: &str = "AI-powered resume distribution";

/// Price of the single product in cents.
pub const PRICE_CENTS: i64 = 14_900;

/// Currency every checkout is charged in.
pub const CURRENCY: &str = "usd";

/// Event type emitted when a checkout completes.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// A gateway object that may be returned as an id or expanded inline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    /// Only the identifier was returned
    Id(String),
    /// The object was expanded
    Object(Box<T>),
}

impl<T: HasId> Expandable<T> {
    /// Returns the identifier whether or not the object was expanded.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(object) => object.id(),
        }
    }
}

/// Gateway objects that carry an identifier.
pub trait HasId {
    /// Returns the gateway identifier.
    fn id(&self) -> &str;
}

/// Parameters for a new checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Email prefilled on the checkout page
    pub customer_email: String,
    /// Account identifier echoed back on completion
    pub client_reference_id: String,
    /// Redirect after a successful payment
    pub success_url: String,
    /// Redirect after the buyer cancels
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Builds a request whose redirects return to `frontend_url`.
    pub fn new(
        customer_email: impl Into<String>,
        client_reference_id: impl Into<String>,
        frontend_url: &str,
    ) -> Self {
        Self {
            customer_email: customer_email.into(),
            client_reference_id: client_reference_id.into(),
            success_url: format!(
                "{frontend_url}?payment=success&session_id={{CHECKOUT_SESSION_ID}}"
            ),
            cancel_url: format!("{frontend_url}?payment=cancelled"),
        }
    }

    /// Form fields for the create-session call, in the gateway's bracket
    /// notation.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price_data][currency]", CURRENCY.to_string()),
            ("line_items[0][price_data][product_data][name]", PRODUCT_NAME.to_string()),
            (
                "line_items[0][price_data][product_data][description]",
                PRODUCT_DESCRIPTION.to_string(),
            ),
            ("line_items[0][price_data][unit_amount]", PRICE_CENTS.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", self.customer_email.clone()),
            ("client_reference_id", self.client_reference_id.clone()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
        ]
    }
}

/// Checkout session as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    /// Session identifier
    pub id: String,
    /// Hosted checkout page, present while the session is open
    #[serde(default)]
    pub url: Option<String>,
    /// `paid`, `unpaid`, or `no_payment_required`
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Total charged in the smallest currency unit
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Three-letter currency code
    #[serde(default)]
    pub currency: Option<String>,
    /// Payment intent created for the session
    #[serde(default)]
    pub payment_intent: Option<Expandable<PaymentIntent>>,
}

impl CheckoutSession {
    /// Whether the buyer has paid.
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// Payment intent behind a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    /// Intent identifier
    pub id: String,
    /// Payment method used
    #[serde(default)]
    pub payment_method: Option<Expandable<PaymentMethod>>,
    /// Most recent charge
    #[serde(default)]
    pub latest_charge: Option<Expandable<Charge>>,
}

impl HasId for PaymentIntent {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payment method attached to an intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentMethod {
    /// Method identifier
    pub id: String,
    /// Card details, for card payments
    #[serde(default)]
    pub card: Option<Card>,
}

impl HasId for PaymentMethod {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Card details safe to store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Card {
    /// Card network, e.g. `visa`
    pub brand: String,
    /// Last four digits
    pub last4: String,
}

/// A charge, read for its receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Charge {
    /// Charge identifier
    pub id: String,
    /// Hosted receipt page
    #[serde(default)]
    pub receipt_url: Option<String>,
}

impl HasId for Charge {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Details gathered from a paid session and its related objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Payment intent identifier
    pub payment_intent_id: Option<String>,
    /// Card network
    pub card_brand: Option<String>,
    /// Last four card digits
    pub card_last4: Option<String>,
    /// Hosted receipt page
    pub receipt_url: Option<String>,
    /// Amount charged in cents
    pub amount: Option<i64>,
    /// Currency charged
    pub currency: Option<String>,
}

/// Patch marking a payment record completed.
///
/// Absent values are left out of the patch so they never overwrite what the
/// record already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCompletion {
    /// Always `completed`
    pub status: &'static str,
    /// Payment intent identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    /// When the payment was confirmed
    pub completed_at: String,
    /// Always `card`
    pub payment_method: &'static str,
    /// Card network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    /// Last four card digits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    /// Hosted receipt page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    /// Amount charged in cents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// Currency charged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl PaymentCompletion {
    /// Builds the completion patch for details confirmed at `completed_at`.
    pub fn new(details: PaymentDetails, completed_at: DateTime<Utc>) -> Self {
        Self {
            status: "completed",
            payment_intent_id: details.payment_intent_id,
            completed_at: completed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            payment_method: "card",
            card_brand: details.card_brand,
            card_last4: details.card_last4,
            receipt_url: details.receipt_url,
            amount: details.amount,
            currency: details.currency,
        }
    }

    /// Renders the patch as a JSON object.
    pub fn to_patch(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A verified webhook event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookEvent {
    /// Event identifier
    pub id: String,
    /// Event type, e.g. `checkout.session.completed`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event body
    pub data: EventData,
}

impl WebhookEvent {
    /// Identifier of the object the event is about, if it has one.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(Value::as_str)
    }
}

/// Object carried by a webhook event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventData {
    /// The object the event is about
    pub object: Value,
}
