//! # Stripe Webhook Handling
//!
//! Signature verification, event parsing and cart reconciliation.
//! Stripe calls the webhook when a checkout session settles; a paid session
//! empties the buyer's shopping lists.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use shop_core::{
    CartStore, SessionSnapshot, SessionState, ShopError, ShopResult, WebhookEvent,
    WebhookEventType,
};
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (either direction) of a signed delivery, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Name of the signature header Stripe sends
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Events that should be enabled in the Stripe Dashboard
pub const SUBSCRIBED_EVENTS: &[&str] = &[
    "checkout.session.completed",
    "checkout.session.async_payment_succeeded",
    "checkout.session.async_payment_failed",
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
];

// =============================================================================
// Signature verification
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> ShopResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| ShopError::Signature("Missing timestamp in signature".to_string()))?;

    if signatures.is_empty() {
        return Err(ShopError::Signature("No v1 signature found".to_string()));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> ShopResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ShopError::Configuration(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a `t=..,v1=..` header value, as Stripe would send it
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> ShopResult<String> {
    Ok(format!(
        "t={},v1={}",
        timestamp,
        compute_signature(secret, timestamp, payload)?
    ))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verify a signature header against `payload` at time `now` (unix seconds).
pub fn verify_signature(secret: &str, payload: &[u8], header: &str, now: i64) -> ShopResult<()> {
    let parsed = parse_signature_header(header)?;

    let within_tolerance = now
        .checked_sub(parsed.timestamp)
        .is_some_and(|age| age.unsigned_abs() <= SIGNATURE_TOLERANCE_SECS.unsigned_abs());
    if !within_tolerance {
        return Err(ShopError::Signature(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_signature(secret, parsed.timestamp, payload)?;
    if parsed
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected))
    {
        Ok(())
    } else {
        Err(ShopError::Signature("Signature mismatch".to_string()))
    }
}

/// Verify (when a secret is configured) and parse a webhook delivery.
pub fn verify_and_parse(
    secret: Option<&str>,
    payload: &[u8],
    signature: Option<&str>,
) -> ShopResult<WebhookEvent> {
    match secret {
        Some(secret) => {
            let header = signature.ok_or_else(|| {
                ShopError::Signature(format!("Missing {} header", SIGNATURE_HEADER))
            })?;
            verify_signature(secret, payload, header, Utc::now().timestamp())?;
        }
        None => warn!("STRIPE_WEBHOOK_SECRET not set; accepting unverified webhook"),
    }

    parse_event(payload)
}

// =============================================================================
// Event parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: Option<i64>,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: Value,
}

#[derive(Debug, Default, Deserialize)]
struct StripeSessionObject {
    #[serde(default)]
    id: String,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: StripeSessionMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct StripeSessionMetadata {
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
    #[serde(default)]
    items: Option<String>,
}

/// Parse a webhook body into a [`WebhookEvent`].
pub fn parse_event(payload: &[u8]) -> ShopResult<WebhookEvent> {
    let raw: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| ShopError::WebhookPayload(format!("Failed to parse webhook: {}", e)))?;

    debug!("Parsed Stripe webhook: id={}, type={}", raw.id, raw.event_type);

    let object_id = raw
        .data
        .object
        .get("id")
        .and_then(Value::as_str)
        .map(String::from);

    let session = if raw.event_type.starts_with("checkout.session.") {
        Some(session_snapshot(raw.data.object)?)
    } else {
        None
    };

    Ok(WebhookEvent {
        event_id: raw.id,
        event_type: WebhookEventType::from_provider(&raw.event_type),
        session,
        object_id,
        created: raw
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now),
    })
}

fn session_snapshot(object: Value) -> ShopResult<SessionSnapshot> {
    let session: StripeSessionObject = serde_json::from_value(object).map_err(|e| {
        ShopError::WebhookPayload(format!("Invalid checkout session object: {}", e))
    })?;

    let items = match session.metadata.items.as_deref() {
        Some(raw) => serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|e| {
            warn!(session_id = %session.id, "Unreadable items metadata: {}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    Ok(SessionSnapshot {
        session_id: session.id,
        payment_status: session.payment_status,
        user_id: session
            .metadata
            .user_id
            .filter(|id| !id.trim().is_empty()),
        items,
        amount_total: session.amount_total,
        currency: session.currency,
    })
}

// =============================================================================
// Reconciliation
// =============================================================================

/// What reconciliation did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Paid session; the buyer's lists were deleted
    CartCleared { user_id: String, deleted: u64 },
    /// Paid session without an owner (anonymous checkout)
    NoOwner,
    /// Completed but not yet paid (boleto)
    AwaitingPayment,
    /// Delayed payment failed; cart kept
    PaymentFailed,
    /// Logged only
    Logged,
    /// Event type we do not handle
    Ignored,
}

/// Applies verified webhook events to the cart store
pub struct CartReconciler<'a> {
    store: &'a dyn CartStore,
}

impl<'a> CartReconciler<'a> {
    pub fn new(store: &'a dyn CartStore) -> Self {
        Self { store }
    }

    /// Dispatch an event. Store failures propagate so the delivery is retried;
    /// repeated deliveries delete nothing.
    pub async fn handle(&self, event: &WebhookEvent) -> ShopResult<ReconcileOutcome> {
        match &event.event_type {
            WebhookEventType::CheckoutCompleted
            | WebhookEventType::AsyncPaymentSucceeded
            | WebhookEventType::AsyncPaymentFailed => self.on_session_event(event).await,
            WebhookEventType::PaymentIntentSucceeded => {
                info!(payment_intent = ?event.object_id, "Payment succeeded");
                Ok(ReconcileOutcome::Logged)
            }
            WebhookEventType::PaymentIntentFailed => {
                warn!(payment_intent = ?event.object_id, "Payment failed");
                Ok(ReconcileOutcome::Logged)
            }
            WebhookEventType::Unknown(kind) => {
                debug!("Unhandled webhook event: {}", kind);
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    async fn on_session_event(&self, event: &WebhookEvent) -> ShopResult<ReconcileOutcome> {
        let (Some(session), Some(state)) = (event.session.as_ref(), event.session_state()) else {
            return Err(ShopError::WebhookPayload(
                "Session event without a session object".to_string(),
            ));
        };

        match state {
            SessionState::Paid => self.clear_cart(session).await,
            SessionState::Pending => {
                info!(
                    session_id = %session.session_id,
                    payment_status = ?session.payment_status,
                    "Checkout completed, payment pending"
                );
                Ok(ReconcileOutcome::AwaitingPayment)
            }
            SessionState::Failed => {
                warn!(
                    session_id = %session.session_id,
                    user_id = ?session.user_id,
                    items = ?session.items,
                    "Delayed payment failed; cart kept"
                );
                Ok(ReconcileOutcome::PaymentFailed)
            }
            SessionState::Created => Ok(ReconcileOutcome::Logged),
        }
    }

    async fn clear_cart(&self, session: &SessionSnapshot) -> ShopResult<ReconcileOutcome> {
        let Some(user_id) = session.user_id.as_deref() else {
            warn!(session_id = %session.session_id, "Paid session has no userId; nothing to clear");
            return Ok(ReconcileOutcome::NoOwner);
        };

        let deleted = self.store.delete_for_user(user_id).await?;
        info!(
            session_id = %session.session_id,
            user_id = %user_id,
            deleted,
            amount_total = ?session.amount_total,
            "Payment confirmed, cart cleared"
        );

        Ok(ReconcileOutcome::CartCleared {
            user_id: user_id.to_string(),
            deleted,
        })
    }
}
