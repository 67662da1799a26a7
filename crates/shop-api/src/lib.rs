//! # shop-api
//!
//! HTTP API layer for shopaholic.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Checkout session creation for the shopping cart
//! - The Stripe webhook that clears a paid cart
//! - Bearer-authenticated shopping list endpoints
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/checkout` | Create checkout session |
//! | POST | `/api/webhooks/stripe` | Stripe webhook |
//! | GET/POST | `/api/lists` | List / save shopping lists |
//! | DELETE | `/api/lists/{id}` | Delete a list |
//! | GET/DELETE | `/api/cart` | Merged cart / clear cart |
//! | DELETE | `/api/cart/items/{item}` | Remove an item everywhere |
//! | DELETE | `/api/account` | Delete data and sign out |

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, StoreBackend};
