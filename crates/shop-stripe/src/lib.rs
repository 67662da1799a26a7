//! # shop-stripe
//!
//! Stripe Checkout integration for shopaholic.
//!
//! - **StripeCheckoutClient** - creates hosted Checkout Sessions (card + boleto)
//!   and verifies webhook deliveries
//! - **CartReconciler** - clears a buyer's shopping lists once Stripe reports
//!   the session as paid
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripeCheckoutClient;
//! use shop_core::{parse_items, CheckoutRequest, Currency, PaymentGateway};
//!
//! let client = StripeCheckoutClient::from_env()?;
//! let items = parse_items(vec!["Milk".to_string()])?;
//! let request = CheckoutRequest::build(&items, Currency::default(), None, "http://localhost:3000");
//!
//! let session = client.create_session(&request).await?;
//! // Redirect user to session.url
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use shop_stripe::CartReconciler;
//!
//! let event = client.verify_webhook(&body, signature)?;
//! CartReconciler::new(store.as_ref()).handle(&event).await?;
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutClient;
pub use config::{sanitize_webhook_secret, StripeConfig};
pub use webhook::{
    parse_event, signature_header, verify_and_parse, verify_signature, CartReconciler,
    ReconcileOutcome, SIGNATURE_HEADER, SUBSCRIBED_EVENTS,
};
