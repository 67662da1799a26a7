//! # shop-core
//!
//! Core types and traits for the shopaholic checkout service.
//!
//! This crate provides:
//! - `sanitize_credential` for turning a raw Stripe key into a `ValidatedCredential`
//! - `CartItem`, `LineItem` and the letter-count pricing rule
//! - `CheckoutRequest` / `CheckoutSession` and webhook event types
//! - `OriginConfig` for resolving checkout redirect origins
//! - `flatten` for form-encoding nested request bodies
//! - `CartStore`, `AuthProvider` and `PaymentGateway` traits
//! - `ShoppingLists` for per-user list operations
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{parse_items, CheckoutRequest, Currency, OriginConfig};
//!
//! let items = parse_items(vec!["Milk".to_string(), "Bread".to_string()])?;
//! let origin = OriginConfig::default().resolve(None, Some("localhost:3000"));
//! let request = CheckoutRequest::build(&items, Currency::default(), None, &origin);
//!
//! let session = gateway.create_session(&request).await?;
//! // Redirect the customer to session.url
//! ```

pub mod auth;
pub mod checkout;
pub mod credential;
pub mod error;
pub mod form;
pub mod gateway;
pub mod item;
pub mod lists;
pub mod origin;
pub mod store;

// Re-exports for convenience
pub use auth::{bearer_token, AuthProvider, AuthenticatedUser, SharedAuthProvider};
pub use checkout::{
    CheckoutRequest, CheckoutSession, SessionSnapshot, SessionState, WebhookEvent,
    WebhookEventType,
};
pub use credential::{redact, sanitize_credential, KeyMode, ValidatedCredential};
pub use error::{ProviderErrorKind, ShopError, ShopResult};
pub use form::{flatten, to_form_pairs};
pub use gateway::{PaymentGateway, SharedPaymentGateway, UnconfiguredGateway};
pub use item::{
    letter_price, parse_items, parse_items_value, CartEntry, CartItem, CartView, Currency,
    LineItem, MAX_ITEM_LENGTH,
};
pub use lists::{RemoveItemOutcome, ShoppingLists};
pub use origin::OriginConfig;
pub use store::{CartRow, CartStore, MemoryCartStore, SharedCartStore};
