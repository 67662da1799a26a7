//! # Supabase Auth
//!
//! Resolves access tokens against `GET /auth/v1/user` and ends sessions with
//! `POST /auth/v1/logout`.

use crate::config::SupabaseConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shop_core::{AuthProvider, AuthenticatedUser, ShopError, ShopResult};
use tracing::{debug, error, info, instrument};

/// [`AuthProvider`] backed by Supabase Auth (GoTrue)
pub struct SupabaseAuth {
    config: SupabaseConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseAuth {
    pub fn new(config: SupabaseConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShopError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn unavailable(operation: &str, detail: impl std::fmt::Display) -> ShopError {
        error!("Supabase auth {} failed: {}", operation, detail);
        ShopError::Store(format!("auth {}: {}", operation, detail))
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip_all)]
    async fn authenticate(&self, access_token: &str) -> ShopResult<AuthenticatedUser> {
        let response = self
            .client
            .get(self.config.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Self::unavailable("user lookup", e))?;

        match response.status() {
            status if status.is_success() => {
                let user: GoTrueUser = response
                    .json()
                    .await
                    .map_err(|e| Self::unavailable("user lookup", e))?;
                debug!(user_id = %user.id, "Resolved access token");
                Ok(AuthenticatedUser {
                    id: user.id,
                    email: user.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ShopError::Unauthorized(
                "Invalid or expired session".to_string(),
            )),
            status => Err(Self::unavailable("user lookup", format!("HTTP {}", status))),
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> ShopResult<()> {
        let response = self
            .client
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Self::unavailable("logout", e))?;

        let status = response.status();
        // An already-invalid session counts as signed out
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            info!("Signed out session");
            Ok(())
        } else {
            Err(Self::unavailable("logout", format!("HTTP {}", status)))
        }
    }
}
