//! # Checkout Types
//!
//! The provider-neutral checkout request, the session it produces, and the
//! webhook events that later report how the payment went.

use crate::item::{CartItem, Currency, LineItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Days a boleto voucher stays payable
pub const BOLETO_EXPIRES_AFTER_DAYS: u32 = 3;

/// Payment methods offered on the hosted page
pub const PAYMENT_METHOD_TYPES: &[&str] = &["card", "boleto"];

/// Everything needed to open one checkout session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    /// Original labels, echoed back in session metadata
    pub items: Vec<String>,
    /// Owner of the cart; `None` for anonymous checkouts
    pub user_id: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub payment_method_types: Vec<String>,
    pub boleto_expires_after_days: u32,
}

impl CheckoutRequest {
    /// Price the items and derive the redirect URLs from `origin`.
    pub fn build(
        items: &[CartItem],
        currency: Currency,
        user_id: Option<String>,
        origin: &str,
    ) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            line_items: items
                .iter()
                .map(|item| LineItem::from_item(item, &currency))
                .collect(),
            items: items.iter().map(|i| i.as_str().to_string()).collect(),
            currency,
            user_id: user_id.filter(|id| !id.trim().is_empty()),
            success_url: format!("{}/?success=true", origin),
            cancel_url: format!("{}/?canceled=true", origin),
            payment_method_types: PAYMENT_METHOD_TYPES.iter().map(|s| s.to_string()).collect(),
            boleto_expires_after_days: BOLETO_EXPIRES_AFTER_DAYS,
        }
    }

    /// Serialized item list stored in session metadata
    pub fn items_metadata(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }

    /// User id stored in session metadata (empty when anonymous)
    pub fn user_id_metadata(&self) -> &str {
        self.user_id.as_deref().unwrap_or("")
    }

    /// Order total in minor units
    pub fn total(&self) -> i64 {
        self.line_items.iter().map(LineItem::total).sum()
    }
}

/// A session created by the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,
    /// Hosted page to redirect the customer to
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Webhook event types we act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// `checkout.session.completed`
    CheckoutCompleted,
    /// `checkout.session.async_payment_succeeded`
    AsyncPaymentSucceeded,
    /// `checkout.session.async_payment_failed`
    AsyncPaymentFailed,
    /// `payment_intent.succeeded`
    PaymentIntentSucceeded,
    /// `payment_intent.payment_failed`
    PaymentIntentFailed,
    /// Anything else (passthrough)
    Unknown(String),
}

impl WebhookEventType {
    pub fn from_provider(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
            "checkout.session.async_payment_succeeded" => WebhookEventType::AsyncPaymentSucceeded,
            "checkout.session.async_payment_failed" => WebhookEventType::AsyncPaymentFailed,
            "payment_intent.succeeded" => WebhookEventType::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentIntentFailed,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }
}

/// Where a checkout session stands, as reported by the provider.
///
/// ```text
/// created ──► paid                      (card, immediate)
/// created ──► pending ──► paid | failed (boleto, delayed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Pending,
    Paid,
    Failed,
}

impl SessionState {
    /// Only a paid session empties the cart
    pub fn clears_cart(&self) -> bool {
        matches!(self, SessionState::Paid)
    }
}

/// Checkout session fields carried by session events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    /// Provider payment status ("paid", "unpaid", "no_payment_required")
    pub payment_status: Option<String>,
    /// `metadata.userId`; `None` when missing or empty
    pub user_id: Option<String>,
    /// `metadata.items`, decoded
    pub items: Vec<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

impl SessionSnapshot {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_id: String,
    pub event_type: WebhookEventType,
    /// Present for `checkout.session.*` events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSnapshot>,
    /// ID of the event's data object (session, payment intent, …)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub created: DateTime<Utc>,
}

impl WebhookEvent {
    /// State of the checkout session this event reports, if any
    pub fn session_state(&self) -> Option<SessionState> {
        let session = self.session.as_ref()?;
        match self.event_type {
            WebhookEventType::CheckoutCompleted if session.is_paid() => Some(SessionState::Paid),
            WebhookEventType::CheckoutCompleted => Some(SessionState::Pending),
            WebhookEventType::AsyncPaymentSucceeded => Some(SessionState::Paid),
            WebhookEventType::AsyncPaymentFailed => Some(SessionState::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(labels: &[&str]) -> Vec<CartItem> {
        labels.iter().map(|l| CartItem::parse(*l).unwrap()).collect()
    }

    #[test]
    fn test_build_prices_and_urls() {
        let request = CheckoutRequest::build(
            &items(&["Milk", "Bread"]),
            Currency::default(),
            Some("u1".to_string()),
            "https://shop.example.com/",
        );

        assert_eq!(request.currency.as_str(), "brl");
        assert_eq!(request.line_items[0].unit_amount, 400);
        assert_eq!(request.line_items[1].unit_amount, 500);
        assert_eq!(request.total(), 900);
        assert_eq!(request.success_url, "https://shop.example.com/?success=true");
        assert_eq!(request.cancel_url, "https://shop.example.com/?canceled=true");
        assert_eq!(request.items_metadata(), r#"["Milk","Bread"]"#);
        assert_eq!(request.user_id_metadata(), "u1");
        assert_eq!(request.boleto_expires_after_days, 3);
    }

    #[test]
    fn test_anonymous_user_metadata() {
        let request = CheckoutRequest::build(
            &items(&["Milk"]),
            Currency::default(),
            Some("  ".to_string()),
            "http://localhost:3000",
        );
        assert_eq!(request.user_id, None);
        assert_eq!(request.user_id_metadata(), "");
    }

    fn event(event_type: WebhookEventType, status: &str) -> WebhookEvent {
        WebhookEvent {
            event_id: "evt_1".to_string(),
            event_type,
            session: Some(SessionSnapshot {
                session_id: "cs_1".to_string(),
                payment_status: Some(status.to_string()),
                ..Default::default()
            }),
            object_id: Some("cs_1".to_string()),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_session_state_transitions() {
        assert_eq!(
            event(WebhookEventType::CheckoutCompleted, "paid").session_state(),
            Some(SessionState::Paid)
        );
        assert_eq!(
            event(WebhookEventType::CheckoutCompleted, "unpaid").session_state(),
            Some(SessionState::Pending)
        );
        assert_eq!(
            event(WebhookEventType::AsyncPaymentSucceeded, "paid").session_state(),
            Some(SessionState::Paid)
        );
        assert_eq!(
            event(WebhookEventType::AsyncPaymentFailed, "unpaid").session_state(),
            Some(SessionState::Failed)
        );
        assert_eq!(
            event(WebhookEventType::PaymentIntentSucceeded, "paid").session_state(),
            None
        );
        assert!(!SessionState::Pending.clears_cart());
        assert!(SessionState::Paid.clears_cart());
    }

    #[test]
    fn test_event_type_mapping() {
        assert_eq!(
            WebhookEventType::from_provider("checkout.session.async_payment_succeeded"),
            WebhookEventType::AsyncPaymentSucceeded
        );
        assert_eq!(
            WebhookEventType::from_provider("invoice.paid"),
            WebhookEventType::Unknown("invoice.paid".to_string())
        );
    }
}
