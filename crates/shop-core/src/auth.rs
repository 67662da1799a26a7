//! # Authentication Contract
//!
//! Sign-in, sign-up and OAuth happen against the hosted auth service directly
//! from the browser. The server only needs to turn an access token back into a
//! user and, on account deletion, end that session.

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The user behind a verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve an access token. Fails with `ShopError::Unauthorized` when the
    /// token is unknown or expired.
    async fn authenticate(&self, access_token: &str) -> ShopResult<AuthenticatedUser>;

    /// Invalidate the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> ShopResult<()>;
}

/// Type alias for a shared auth provider (dynamic dispatch)
pub type SharedAuthProvider = Arc<dyn AuthProvider>;

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> ShopResult<&str> {
    let header = header
        .ok_or_else(|| ShopError::Unauthorized("Missing Authorization header".to_string()))?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| ShopError::Unauthorized("Malformed Authorization header".to_string()))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ShopError::Unauthorized(
            "Authorization header must be a bearer token".to_string(),
        ));
    }
    Ok(token)
}
