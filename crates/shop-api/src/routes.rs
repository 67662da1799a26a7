//! # Routes
//!
//! Axum router configuration for the shopaholic API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET    /health                  - Health check
/// - POST   /api/checkout            - Create checkout session
/// - POST   /api/webhooks/stripe     - Stripe webhook handler
/// - GET    /api/lists               - Caller's lists
/// - POST   /api/lists               - Save a list
/// - DELETE /api/lists/{id}          - Delete a list
/// - GET    /api/cart                - Merged, priced cart
/// - DELETE /api/cart                - Clear cart
/// - DELETE /api/cart/items/{item}   - Remove an item from every list
/// - DELETE /api/account             - Delete data and sign out
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Bearer-authenticated list and cart routes
    let list_routes = Router::new()
        .route("/lists", get(handlers::list_lists).post(handlers::create_list))
        .route("/lists/{list_id}", delete(handlers::delete_list))
        .route("/cart", get(handlers::get_cart).delete(handlers::clear_cart))
        .route("/cart/items/{item}", delete(handlers::remove_cart_item))
        .route("/account", delete(handlers::delete_account));

    // Raw body is needed for signature verification
    let webhook_routes = Router::new().route("/stripe", post(handlers::stripe_webhook));

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .merge(list_routes)
        .nest("/webhooks", webhook_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
