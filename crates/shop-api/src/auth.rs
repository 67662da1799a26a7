//! # Request Authentication
//!
//! Extractor that resolves `Authorization: Bearer <token>` into a user via the
//! configured [`AuthProvider`](shop_core::AuthProvider).

use crate::handlers::{shop_error_to_response, ErrorResponse};
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use shop_core::{bearer_token, AuthenticatedUser, ShopError};
use tracing::debug;

/// An authenticated caller, plus the token it presented
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: AuthenticatedUser,
    pub token: String,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = state.auth.as_ref().ok_or_else(|| {
            shop_error_to_response(ShopError::Configuration(
                "Authentication is not configured".to_string(),
            ))
        })?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = bearer_token(header).map_err(shop_error_to_response)?;

        let user = auth
            .authenticate(token)
            .await
            .map_err(shop_error_to_response)?;
        debug!(user_id = %user.id, "Authenticated request");

        Ok(AuthUser {
            user,
            token: token.to_string(),
        })
    }
}
