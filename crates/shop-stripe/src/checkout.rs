//! # Stripe Checkout Sessions
//!
//! Creates Checkout Sessions over Stripe's form-encoded REST API.
//! The request body is described by typed structs, serialized to a JSON value
//! and flattened into `line_items[0][price_data][...]` style keys.

use crate::config::StripeConfig;
use crate::webhook::verify_and_parse;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shop_core::{
    to_form_pairs, CheckoutRequest, CheckoutSession, PaymentGateway, ShopError, ShopResult,
    WebhookEvent,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

/// Stripe Checkout Session client
///
/// Uses Stripe's hosted checkout page; card data never touches this service.
pub struct StripeCheckoutClient {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutClient {
    /// Create a new client with its own connection pool
    pub fn new(config: StripeConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShopError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build the session-creation parameters for Stripe
    fn session_params(request: &CheckoutRequest) -> StripeSessionParams {
        let currency = request.currency.as_str().to_string();

        let line_items = request
            .line_items
            .iter()
            .map(|item| StripeLineItem {
                price_data: StripePriceData {
                    currency: currency.clone(),
                    product_data: StripeProductData {
                        name: item.name.clone(),
                        description: item.description.clone(),
                    },
                    unit_amount: item.unit_amount,
                },
                quantity: item.quantity,
            })
            .collect();

        let mut metadata = BTreeMap::new();
        metadata.insert("items", request.items_metadata());
        metadata.insert("userId", request.user_id_metadata().to_string());

        StripeSessionParams {
            payment_method_types: request.payment_method_types.clone(),
            line_items,
            mode: "payment",
            currency,
            success_url: request.success_url.clone(),
            cancel_url: request.cancel_url.clone(),
            metadata,
            payment_method_options: StripePaymentMethodOptions {
                boleto: StripeBoletoOptions {
                    expires_after_days: request.boleto_expires_after_days,
                },
            },
        }
    }

    /// Flattened form body for a checkout request
    pub fn form_body(request: &CheckoutRequest) -> ShopResult<Vec<(String, String)>> {
        to_form_pairs(&Self::session_params(request)).map_err(|e| {
            ShopError::Validation(format!("Failed to encode checkout request: {}", e))
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckoutClient {
    #[instrument(skip(self, request), fields(items = request.line_items.len(), currency = %request.currency.as_str()))]
    async fn create_session(&self, request: &CheckoutRequest) -> ShopResult<CheckoutSession> {
        if request.line_items.is_empty() {
            return Err(ShopError::Validation("Items are required".to_string()));
        }

        let form = Self::form_body(request)?;
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        debug!(
            "Creating Stripe checkout session: {} items, total={}, key={}",
            request.line_items.len(),
            request.total(),
            self.config.secret_key.redacted()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!("Stripe request failed: {}", e);
                ShopError::provider(None, format!("network error: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ShopError::provider(None, format!("network error reading response: {}", e))
        })?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            let message = serde_json::from_str::<StripeErrorResponse>(&body)
                .map(|parsed| parsed.error.describe())
                .unwrap_or(body);

            return Err(ShopError::provider(Some(status.as_u16()), message));
        }

        let session: StripeCheckoutSessionResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::provider(
                Some(status.as_u16()),
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        let url = session.url.ok_or_else(|| {
            ShopError::provider(
                Some(status.as_u16()),
                format!("Stripe session {} has no redirect url", session.id),
            )
        })?;

        info!("Created Stripe checkout session: id={}", session.id);

        Ok(CheckoutSession {
            session_id: session.id,
            url,
            expires_at: session
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }

    fn verify_webhook(&self, payload: &[u8], signature: Option<&str>) -> ShopResult<WebhookEvent> {
        verify_and_parse(self.config.webhook_secret.as_deref(), payload, signature)
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct StripeSessionParams {
    payment_method_types: Vec<String>,
    line_items: Vec<StripeLineItem>,
    mode: &'static str,
    currency: String,
    success_url: String,
    cancel_url: String,
    metadata: BTreeMap<&'static str, String>,
    payment_method_options: StripePaymentMethodOptions,
}

#[derive(Debug, Serialize)]
struct StripeLineItem {
    price_data: StripePriceData,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct StripePriceData {
    currency: String,
    product_data: StripeProductData,
    unit_amount: i64,
}

#[derive(Debug, Serialize)]
struct StripeProductData {
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct StripePaymentMethodOptions {
    boleto: StripeBoletoOptions,
}

#[derive(Debug, Serialize)]
struct StripeBoletoOptions {
    expires_after_days: u32,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeApiError,
}

#[derive(Debug, Deserialize)]
struct StripeApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl StripeApiError {
    /// Message text with the error code appended, so classification can see
    /// codes such as `rate_limit`.
    fn describe(&self) -> String {
        let message = self
            .message
            .clone()
            .or_else(|| self.error_type.clone())
            .unwrap_or_else(|| "unknown error".to_string());
        match &self.code {
            Some(code) => format!("{} ({})", message, code),
            None => message,
        }
    }
}
