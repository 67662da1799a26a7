//! # Shop Error Types
//!
//! Typed error handling for the shopaholic checkout service.
//! Every fallible operation returns `Result<T, ShopError>`, and the HTTP layer
//! converts a `ShopError` into a `{ error, details? }` JSON body.

use thiserror::Error;

/// Sub-category of a payment provider failure.
///
/// Each kind carries its own user-facing message so the caller can tell a
/// misconfigured key apart from a transient outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The secret key was rejected (unknown, revoked or expired)
    InvalidCredential,
    /// Too many requests
    RateLimited,
    /// The provider could not be reached at all
    Network,
    /// Anything else the provider refused
    Other,
}

impl ProviderErrorKind {
    /// Classify a provider failure from its HTTP status and message text.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        if status == Some(401)
            || lowered.contains("no such api key")
            || lowered.contains("invalid api key")
        {
            ProviderErrorKind::InvalidCredential
        } else if status == Some(429) || lowered.contains("rate_limit") {
            ProviderErrorKind::RateLimited
        } else if status.is_none()
            && (lowered.contains("network")
                || lowered.contains("connect")
                || lowered.contains("econnrefused")
                || lowered.contains("timed out"))
        {
            ProviderErrorKind::Network
        } else {
            ProviderErrorKind::Other
        }
    }

    /// Message shown to API callers for this kind of failure
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderErrorKind::InvalidCredential => {
                "Stripe API key is invalid or expired. Please check the STRIPE_SECRET_KEY configuration."
            }
            ProviderErrorKind::RateLimited => {
                "Stripe API rate limit exceeded. Please try again in a moment."
            }
            ProviderErrorKind::Network => {
                "Unable to connect to Stripe. Please check your connection and try again."
            }
            ProviderErrorKind::Other => "Failed to create checkout session",
        }
    }
}

/// Core error type for all shop operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Missing or malformed configuration (operator must fix the environment)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input
    #[error("{0}")]
    Validation(String),

    /// The payment provider rejected the call or could not be reached
    #[error("Provider error ({kind:?}): {message}")]
    Provider {
        kind: ProviderErrorKind,
        status: Option<u16>,
        message: String,
    },

    /// Webhook signature verification failed
    #[error("Webhook signature verification failed: {0}")]
    Signature(String),

    /// Webhook body could not be parsed
    #[error("Webhook payload error: {0}")]
    WebhookPayload(String),

    /// Missing or rejected access token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource does not exist or is not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence layer failure
    #[error("Store error: {0}")]
    Store(String),
}

impl ShopError {
    /// Build a provider error, classifying it from status and message
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        ShopError::Provider {
            kind: ProviderErrorKind::classify(status, &message),
            status,
            message,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::Validation(_) => 400,
            ShopError::Provider { .. } => 500,
            ShopError::Signature(_) => 400,
            ShopError::WebhookPayload(_) => 400,
            ShopError::Unauthorized(_) => 401,
            ShopError::NotFound(_) => 404,
            ShopError::Store(_) => 500,
        }
    }

    /// The `error` string returned to API callers.
    ///
    /// Provider failures are replaced by the friendlier per-kind message;
    /// the raw provider text goes to `details` instead.
    pub fn public_message(&self) -> String {
        match self {
            ShopError::Provider { kind, .. } => kind.user_message().to_string(),
            ShopError::Store(_) => "Failed to access shopping lists".to_string(),
            other => other.to_string(),
        }
    }

    /// Optional extra detail for API callers
    pub fn details(&self) -> Option<String> {
        match self {
            ShopError::Provider {
                kind: ProviderErrorKind::Other,
                status,
                message,
            } => Some(match status {
                Some(code) => format!("Stripe API error: {} {}", code, message),
                None => message.clone(),
            }),
            _ => None,
        }
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
