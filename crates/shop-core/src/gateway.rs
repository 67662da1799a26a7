//! # Payment Gateway Trait
//!
//! The seam between the HTTP layer and the payment provider. The application
//! ships exactly one implementation (Stripe Checkout); the trait exists so the
//! handlers can be driven by a constructed, injected client.

use crate::checkout::{CheckoutRequest, CheckoutSession, WebhookEvent};
use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session for `request`.
    ///
    /// One attempt per call; a failure surfaces as `ShopError::Provider`.
    async fn create_session(&self, request: &CheckoutRequest) -> ShopResult<CheckoutSession>;

    /// Verify a webhook delivery and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes
    /// * `signature` - Signature header from the request, if any
    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> ShopResult<WebhookEvent>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

/// Stand-in used when the provider client could not be configured.
///
/// Every call fails with `ShopError::Configuration` carrying the startup
/// error, so the checkout endpoint answers 500 instead of the process exiting.
#[derive(Debug, Clone)]
pub struct UnconfiguredGateway {
    reason: String,
}

impl UnconfiguredGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn error(&self) -> ShopError {
        ShopError::Configuration(self.reason.clone())
    }
}

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_session(&self, _request: &CheckoutRequest) -> ShopResult<CheckoutSession> {
        Err(self.error())
    }

    fn verify_webhook(&self, _payload: &[u8], _signature: Option<&str>) -> ShopResult<WebhookEvent> {
        Err(self.error())
    }

    fn provider_name(&self) -> &'static str {
        "unconfigured"
    }
}
