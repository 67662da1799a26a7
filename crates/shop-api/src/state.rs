//! # Application State
//!
//! Shared state for the Axum application. Every external client is built once
//! at startup and injected here; handlers never construct their own.

use shop_core::{
    origin::DEFAULT_FALLBACK_ORIGIN, MemoryCartStore, OriginConfig, PaymentGateway,
    SharedAuthProvider, SharedCartStore, SharedPaymentGateway, UnconfiguredGateway,
};
use shop_stripe::{StripeCheckoutClient, StripeConfig};
use shop_supabase::{PostgrestCartStore, SupabaseAuth, SupabaseConfig};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where shopping lists are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown STORE_BACKEND: {}", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Public URL of the storefront, used when a request carries no origin
    pub public_url: Option<String>,
    /// Last-resort checkout redirect origin
    pub fallback_origin: String,
    /// Shopping list persistence
    pub store_backend: StoreBackend,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}; falling back to supabase", e);
                StoreBackend::Supabase
            }),
            Err(_) => StoreBackend::Supabase,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            public_url: std::env::var("APP_PUBLIC_URL").ok(),
            fallback_origin: std::env::var("CHECKOUT_FALLBACK_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_ORIGIN.to_string()),
            store_backend,
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Origin resolution settings for checkout redirects
    pub fn origins(&self) -> OriginConfig {
        OriginConfig::new(self.public_url.clone(), self.fallback_origin.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            public_url: None,
            fallback_origin: DEFAULT_FALLBACK_ORIGIN.to_string(),
            store_backend: StoreBackend::Memory,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment provider (Stripe Checkout)
    pub gateway: SharedPaymentGateway,
    /// Shopping list persistence
    pub store: SharedCartStore,
    /// Access token resolution; `None` disables the list endpoints
    pub auth: Option<SharedAuthProvider>,
    /// Checkout redirect origin resolution
    pub origins: OriginConfig,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build the state from environment variables.
    ///
    /// A Stripe misconfiguration does not stop the server: checkout and webhook
    /// calls answer 500 with the configuration error while lists keep working.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let gateway = stripe_gateway(&config);

        let supabase = match SupabaseConfig::from_env() {
            Ok(supabase) => Some(supabase),
            Err(e) if config.store_backend == StoreBackend::Supabase => {
                return Err(anyhow::anyhow!("Failed to initialize Supabase: {}", e));
            }
            Err(e) => {
                warn!("Supabase not configured ({}); list endpoints disabled", e);
                None
            }
        };

        let store: SharedCartStore = match (config.store_backend, &supabase) {
            (StoreBackend::Supabase, Some(supabase)) => Arc::new(
                PostgrestCartStore::new(supabase.clone())
                    .map_err(|e| anyhow::anyhow!("Failed to initialize store: {}", e))?,
            ),
            _ => {
                warn!("Using in-memory shopping list store; data is lost on restart");
                Arc::new(MemoryCartStore::new())
            }
        };

        let auth: Option<SharedAuthProvider> = match supabase {
            Some(supabase) => Some(Arc::new(
                SupabaseAuth::new(supabase)
                    .map_err(|e| anyhow::anyhow!("Failed to initialize auth: {}", e))?,
            )),
            None => None,
        };

        Ok(Self::with_parts(config, gateway, store, auth))
    }

    /// Assemble state from already constructed parts
    pub fn with_parts(
        config: AppConfig,
        gateway: SharedPaymentGateway,
        store: SharedCartStore,
        auth: Option<SharedAuthProvider>,
    ) -> Self {
        Self {
            gateway,
            store,
            auth,
            origins: config.origins(),
            config,
        }
    }
}

fn stripe_gateway(config: &AppConfig) -> SharedPaymentGateway {
    let client = StripeConfig::from_env().and_then(|stripe| {
        if config.is_production() && stripe.webhook_secret.is_none() {
            return Err(shop_core::ShopError::Configuration(
                "STRIPE_WEBHOOK_SECRET is required in production".to_string(),
            ));
        }
        StripeCheckoutClient::new(stripe)
    });

    match client {
        Ok(client) => {
            info!("Payment provider: {}", client.provider_name());
            Arc::new(client)
        }
        Err(e) => {
            error!("Stripe is not configured: {}", e);
            Arc::new(UnconfiguredGateway::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" Supabase ".parse::<StoreBackend>(), Ok(StoreBackend::Supabase));
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..Default::default()
        };

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_origins_use_config() {
        let config = AppConfig {
            public_url: Some("https://shop.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.origins().resolve(None, None), "https://shop.example.com");
    }
}
