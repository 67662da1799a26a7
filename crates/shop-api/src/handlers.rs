//! # Request Handlers
//!
//! Axum request handlers for checkout, Stripe webhooks and shopping lists.

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{HOST, ORIGIN},
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use shop_core::{
    parse_items_value, CartRow, CartView, CheckoutRequest, Currency, RemoveItemOutcome,
    ShopError, ShopResult, ShoppingLists,
};
use shop_stripe::{CartReconciler, SIGNATURE_HEADER};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    /// Session ID
    pub session_id: String,
    /// Checkout URL (redirect user here)
    pub url: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

pub fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.public_message(), code);
    if let Some(details) = err.details() {
        response = response.with_details(details);
    }
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

/// Deleted-row count
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// Lists belonging to the caller
#[derive(Debug, Serialize)]
pub struct ListsResponse {
    pub lists: Vec<CartRow>,
}

fn parse_json_body(body: &Bytes) -> ApiResult<Value> {
    serde_json::from_slice(body).map_err(|e| {
        shop_error_to_response(ShopError::Validation(format!("Invalid JSON body: {}", e)))
    })
}

/// Optional string field; absent or `null` is `None`, any other type is invalid
fn optional_str<'a>(body: &'a Value, field: &str) -> ShopResult<Option<&'a str>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ShopError::Validation(format!("{} must be a string", field))),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// =============================================================================
// Health
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Store health check failed: {}", e);
            false
        }
    };

    Json(serde_json::json!({
        "status": if store_ok { "healthy" } else { "degraded" },
        "service": "shopaholic",
        "version": env!("CARGO_PKG_VERSION"),
        "store": {
            "backend": state.store.backend_name(),
            "reachable": store_ok
        },
        "payments": state.gateway.provider_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// =============================================================================
// Checkout
// =============================================================================

/// Create a Stripe Checkout session for the posted items
#[instrument(skip(state, headers, body))]
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CreateCheckoutResponse>> {
    let body = parse_json_body(&body)?;

    let items = parse_items_value(body.get("items")).map_err(shop_error_to_response)?;
    let currency = optional_str(&body, "currency")
        .and_then(Currency::parse)
        .map_err(shop_error_to_response)?;
    let user_id = optional_str(&body, "userId")
        .map_err(shop_error_to_response)?
        .map(String::from);

    let origin = state
        .origins
        .resolve(header_str(&headers, ORIGIN), header_str(&headers, HOST));

    let request = CheckoutRequest::build(&items, currency, user_id, &origin);

    info!(
        "Creating checkout: {} items, total={} {}, origin={}",
        request.line_items.len(),
        request.total(),
        request.currency,
        origin
    );

    let session = state.gateway.create_session(&request).await.map_err(|e| {
        error!("Failed to create checkout: {}", e);
        shop_error_to_response(e)
    })?;

    info!("Created checkout session: {}", session.session_id);

    Ok(Json(CreateCheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

// =============================================================================
// Webhooks
// =============================================================================

/// Handle Stripe webhook
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = header_str(&headers, SIGNATURE_HEADER);

    let event = state.gateway.verify_webhook(&body, signature).map_err(|e| {
        error!("Webhook verification failed: {}", e);
        shop_error_to_response(e)
    })?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    let outcome = CartReconciler::new(state.store.as_ref())
        .handle(&event)
        .await
        .map_err(|e| {
            error!("Webhook handler error: {}", e);
            shop_error_to_response(e)
        })?;

    info!(event_id = %event.event_id, outcome = ?outcome, "Webhook processed");

    Ok(Json(serde_json::json!({ "received": true })))
}

// =============================================================================
// Shopping lists
// =============================================================================

/// All of the caller's lists, newest first
#[instrument(skip_all, fields(user_id = %user.id()))]
pub async fn list_lists(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ListsResponse>> {
    let lists = ShoppingLists::new(state.store.as_ref(), user.id())
        .all()
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(ListsResponse { lists }))
}

/// Save a new list
#[instrument(skip_all, fields(user_id = %user.id()))]
pub async fn create_list(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CartRow>)> {
    let body = parse_json_body(&body)?;
    let labels = parse_items_value(body.get("items"))
        .map_err(shop_error_to_response)?
        .into_iter()
        .map(|item| item.into_inner())
        .collect();

    let row = ShoppingLists::new(state.store.as_ref(), user.id())
        .save(labels)
        .await
        .map_err(shop_error_to_response)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Delete one list
#[instrument(skip_all, fields(user_id = %user.id(), list_id = %list_id))]
pub async fn delete_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(list_id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    ShoppingLists::new(state.store.as_ref(), user.id())
        .delete(&list_id)
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(DeletedResponse { deleted: 1 }))
}

/// Unique items across all lists, priced
#[instrument(skip_all, fields(user_id = %user.id()))]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CartView>> {
    let cart = ShoppingLists::new(state.store.as_ref(), user.id())
        .cart()
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(cart))
}

/// Delete every list
#[instrument(skip_all, fields(user_id = %user.id()))]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = ShoppingLists::new(state.store.as_ref(), user.id())
        .clear()
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(DeletedResponse { deleted }))
}

/// Remove one item from every list holding it
#[instrument(skip_all, fields(user_id = %user.id(), item = %item))]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item): Path<String>,
) -> ApiResult<Json<RemoveItemOutcome>> {
    let outcome = ShoppingLists::new(state.store.as_ref(), user.id())
        .remove_item(&item)
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(outcome))
}

/// Delete the caller's data, then end their session
#[instrument(skip_all, fields(user_id = %user.id()))]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = ShoppingLists::new(state.store.as_ref(), user.id())
        .clear()
        .await
        .map_err(shop_error_to_response)?;

    if let Some(auth) = state.auth.as_ref() {
        auth.sign_out(&user.token)
            .await
            .map_err(shop_error_to_response)?;
    }

    info!(deleted, "Deleted account data and signed out");
    Ok(Json(DeletedResponse { deleted }))
}
