//! # Stripe Configuration
//!
//! Configuration management for the Stripe integration.
//! Secrets are loaded from environment variables and sanitized once at startup.

use shop_core::credential::normalize;
use shop_core::{redact, sanitize_credential, ShopError, ShopResult, ValidatedCredential};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Production API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// API version pinned for every request
pub const DEFAULT_API_VERSION: &str = "2025-10-29.clover";

/// Network timeout for provider calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Sanitized secret API key (sk_test_... or sk_live_...)
    pub secret_key: ValidatedCredential,

    /// Webhook signing secret (whsec_...); verification is skipped without it
    pub webhook_secret: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,

    /// Request timeout
    pub timeout: Duration,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    ///
    /// Optional:
    /// - `STRIPE_WEBHOOK_SECRET`
    /// - `STRIPE_API_BASE`
    /// - `STRIPE_API_VERSION`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let raw_key = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        let raw_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").ok();

        let mut config = Self::from_raw(&raw_key, raw_webhook_secret.as_deref())?;

        if let Ok(base) = env::var("STRIPE_API_BASE") {
            config = config.with_api_base_url(base);
        }
        if let Ok(version) = env::var("STRIPE_API_VERSION") {
            if !version.trim().is_empty() {
                config.api_version = version.trim().to_string();
            }
        }

        info!(
            key = %config.secret_key.redacted(),
            test_mode = config.is_test_mode(),
            webhook_verification = config.webhook_secret.is_some(),
            "Loaded Stripe configuration"
        );

        Ok(config)
    }

    /// Build from raw (untrusted) values, sanitizing both secrets.
    pub fn from_raw(raw_secret_key: &str, raw_webhook_secret: Option<&str>) -> ShopResult<Self> {
        let secret_key = sanitize_credential(raw_secret_key)?;
        let webhook_secret = raw_webhook_secret
            .map(sanitize_webhook_secret)
            .transpose()?
            .flatten();

        Ok(Self::new(secret_key).with_webhook_secret_opt(webhook_secret))
    }

    /// Create config with an already validated key
    pub fn new(secret_key: ValidatedCredential) -> Self {
        Self {
            secret_key,
            webhook_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.is_test_mode()
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.is_live_mode()
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        self.secret_key.bearer()
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set the webhook signing secret
    pub fn with_webhook_secret(self, secret: impl Into<String>) -> Self {
        self.with_webhook_secret_opt(Some(secret.into()))
    }

    fn with_webhook_secret_opt(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }

    /// Builder: set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Normalize a webhook signing secret. Blank means "not configured".
pub fn sanitize_webhook_secret(raw: &str) -> ShopResult<Option<String>> {
    let cleaned = normalize(raw);
    if cleaned.is_empty() {
        warn!("STRIPE_WEBHOOK_SECRET is blank; webhook verification disabled");
        return Ok(None);
    }
    if !cleaned.starts_with("whsec_") {
        return Err(ShopError::Configuration(format!(
            "STRIPE_WEBHOOK_SECRET must start with whsec_ (got {})",
            redact(&cleaned)
        )));
    }
    Ok(Some(cleaned))
}
