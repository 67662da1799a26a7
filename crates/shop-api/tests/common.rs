//! Common test utilities for shopaholic integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shop_api::{create_router, AppConfig, AppState};
use shop_core::{
    AuthProvider, AuthenticatedUser, CartRow, CartStore, MemoryCartStore, SharedAuthProvider,
    SharedCartStore, SharedPaymentGateway, ShopError, ShopResult, UnconfiguredGateway,
};
use shop_stripe::{StripeCheckoutClient, StripeConfig};

pub const STRIPE_KEY: &str = "sk_test_51AbCdEfGhIjKlMnOpQrStUv";
pub const WEBHOOK_SECRET: &str = "whsec_integration_secret";

/// Token → user table, recording sign-outs.
#[derive(Default)]
pub struct StaticAuth {
    users: HashMap<String, String>,
    pub signed_out: Mutex<Vec<String>>,
}

impl StaticAuth {
    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.users.insert(token.to_string(), user_id.to_string());
        self
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn authenticate(&self, access_token: &str) -> ShopResult<AuthenticatedUser> {
        self.users
            .get(access_token)
            .map(|id| AuthenticatedUser {
                id: id.clone(),
                email: Some(format!("{}@example.com", id)),
            })
            .ok_or_else(|| ShopError::Unauthorized("Invalid or expired session".to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> ShopResult<()> {
        self.signed_out
            .lock()
            .map_err(|_| ShopError::Store("lock poisoned".to_string()))?
            .push(access_token.to_string());
        Ok(())
    }
}

/// Store whose backend is always down.
pub struct FailingStore;

impl FailingStore {
    fn down<T>() -> ShopResult<T> {
        Err(ShopError::Store("connection refused".to_string()))
    }
}

#[async_trait]
impl CartStore for FailingStore {
    async fn insert(&self, _user_id: &str, _items: &[String]) -> ShopResult<CartRow> {
        Self::down()
    }

    async fn list_for_user(&self, _user_id: &str) -> ShopResult<Vec<CartRow>> {
        Self::down()
    }

    async fn update_items(&self, _user_id: &str, _id: &str, _items: &[String]) -> ShopResult<bool> {
        Self::down()
    }

    async fn delete(&self, _user_id: &str, _id: &str) -> ShopResult<bool> {
        Self::down()
    }

    async fn delete_for_user(&self, _user_id: &str) -> ShopResult<u64> {
        Self::down()
    }

    async fn ping(&self) -> ShopResult<()> {
        Self::down()
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Mocked Stripe API.
    pub stripe: MockServer,
    /// The store behind the server, for seeding and inspection.
    pub store: Arc<MemoryCartStore>,
    /// Auth provider behind the server.
    pub auth: Arc<StaticAuth>,
}

impl TestHarness {
    /// Harness with webhook signature verification enabled.
    pub async fn new() -> Self {
        Self::build(Some(WEBHOOK_SECRET)).await
    }

    /// Harness that accepts unsigned webhooks.
    pub async fn without_webhook_secret() -> Self {
        Self::build(None).await
    }

    /// Harness whose shopping list store rejects every call. `store` stays
    /// empty and is not wired to the server.
    pub async fn with_failing_store() -> Self {
        let (stripe, gateway) = Self::stripe(Some(WEBHOOK_SECRET)).await;
        Self::assemble_with(stripe, gateway, Some(Arc::new(FailingStore)))
    }

    async fn build(webhook_secret: Option<&str>) -> Self {
        let (stripe, gateway) = Self::stripe(webhook_secret).await;
        Self::assemble(stripe, gateway)
    }

    async fn stripe(webhook_secret: Option<&str>) -> (MockServer, SharedPaymentGateway) {
        let stripe = MockServer::start().await;

        let config = StripeConfig::from_raw(STRIPE_KEY, webhook_secret)
            .expect("valid test key")
            .with_api_base_url(stripe.uri());
        let gateway: SharedPaymentGateway =
            Arc::new(StripeCheckoutClient::new(config).expect("http client"));

        (stripe, gateway)
    }

    /// Harness whose Stripe key failed sanitization at startup.
    pub async fn with_raw_key(raw_key: &str) -> Self {
        let stripe = MockServer::start().await;
        let gateway: SharedPaymentGateway = match StripeConfig::from_raw(raw_key, None) {
            Ok(config) => Arc::new(
                StripeCheckoutClient::new(config.with_api_base_url(stripe.uri()))
                    .expect("http client"),
            ),
            Err(e) => Arc::new(UnconfiguredGateway::new(e.to_string())),
        };
        Self::assemble(stripe, gateway)
    }

    fn assemble(stripe: MockServer, gateway: SharedPaymentGateway) -> Self {
        Self::assemble_with(stripe, gateway, None)
    }

    fn assemble_with(
        stripe: MockServer,
        gateway: SharedPaymentGateway,
        backend: Option<SharedCartStore>,
    ) -> Self {
        let store = Arc::new(MemoryCartStore::new());
        let backend = backend.unwrap_or_else(|| store.clone() as SharedCartStore);
        let auth = Arc::new(
            StaticAuth::default()
                .with_user("token-u1", "u1")
                .with_user("token-u2", "u2"),
        );

        let state = AppState::with_parts(
            AppConfig::default(),
            gateway,
            backend,
            Some(auth.clone() as SharedAuthProvider),
        );
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        Self {
            server,
            stripe,
            store,
            auth,
        }
    }

    /// Mount a successful Checkout Session response.
    pub async fn mock_session_created(&self, session_id: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": session_id,
                "object": "checkout.session",
                "url": format!("https://checkout.stripe.com/c/pay/{}", session_id),
                "expires_at": 1_900_000_000
            })))
            .mount(&self.stripe)
            .await;
    }

    /// Seed one list for `user_id`.
    pub async fn seed_list(&self, user_id: &str, items: &[&str]) -> String {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        self.store
            .insert(user_id, &items)
            .await
            .expect("seed list")
            .id
    }

    pub async fn rows_for(&self, user_id: &str) -> usize {
        self.store.list_for_user(user_id).await.expect("list rows").len()
    }
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value"),
    )
}
