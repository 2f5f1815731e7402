//! [`AuthUser`]: resolves the caller from a bearer token or `token` cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;
use uuid::Uuid;

use super::token::Claims;
use crate::server::{error::ApiError, state::AppState};

/// Name of the cookie that may carry the access token.
pub const TOKEN_COOKIE: &str = "token";

/// The verified caller of an authenticated route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.sub
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| ApiError::unauthorized("Token not found / Unauthorized user"))?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "access token rejected");
            ApiError::unauthorized("User is not authorized")
        })?;

        Ok(AuthUser(claims))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}
