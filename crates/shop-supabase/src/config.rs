//! # Supabase Configuration

use shop_core::credential::normalize;
use shop_core::{redact, ShopError, ShopResult};
use std::env;
use std::time::Duration;
use tracing::info;

/// Network timeout for Supabase calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Table holding shopping lists
pub const SHOPPING_LISTS_TABLE: &str = "shopping_lists";

/// Supabase project configuration
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: String,

    /// Public anon key (sent as `apikey` on every request)
    pub anon_key: String,

    /// Service role key; bypasses row-level security when set
    pub service_role_key: Option<String>,

    /// Request timeout
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional (required by the shopping list store):
    /// - `SUPABASE_SERVICE_ROLE_KEY`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        let url = env::var("SUPABASE_URL")
            .map_err(|_| ShopError::Configuration("SUPABASE_URL not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| ShopError::Configuration("SUPABASE_ANON_KEY not set".to_string()))?;

        let mut config = Self::new(url, anon_key)?;
        if let Ok(service) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            config = config.with_service_role_key(service);
        }

        info!(
            url = %config.url,
            anon_key = %redact(&config.anon_key),
            service_role = config.service_role_key.is_some(),
            "Loaded Supabase configuration"
        );

        Ok(config)
    }

    /// Create config from a project URL and anon key
    pub fn new(url: impl AsRef<str>, anon_key: impl AsRef<str>) -> ShopResult<Self> {
        let url = normalize(url.as_ref()).trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ShopError::Configuration(format!(
                "SUPABASE_URL must be an http(s) URL (got {:?})",
                url
            )));
        }

        let anon_key = normalize(anon_key.as_ref());
        if anon_key.is_empty() {
            return Err(ShopError::Configuration(
                "SUPABASE_ANON_KEY is empty".to_string(),
            ));
        }

        Ok(Self {
            url,
            anon_key,
            service_role_key: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Builder: set the service role key (blank values are ignored)
    pub fn with_service_role_key(mut self, key: impl AsRef<str>) -> Self {
        let key = normalize(key.as_ref());
        self.service_role_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Builder: set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Key used as the bearer for table access.
    ///
    /// The store filters rows by `user_id` itself and the webhook clears carts
    /// with no user session, so table access runs under the service role.
    pub fn table_key(&self) -> ShopResult<&str> {
        self.service_role_key.as_deref().ok_or_else(|| {
            ShopError::Configuration(
                "SUPABASE_SERVICE_ROLE_KEY is required for the shopping list store".to_string(),
            )
        })
    }

    /// `{url}/rest/v1/{table}`
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// `{url}/auth/v1/{path}`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &redact(&self.anon_key))
            .field(
                "service_role_key",
                &self.service_role_key.as_deref().map(redact),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}
