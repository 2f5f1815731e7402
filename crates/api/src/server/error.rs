//! Mapping of every layer's errors onto HTTP responses.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};
use tracing::{error, warn};

use crate::auth::{PasswordError, TokenError};
use crate::crypto::DecryptionError;
use crate::store::StoreError;
use crate::uploads::UploadError;

/// Handler error: a [`ServiceError`] rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(ServiceError::BadRequest(msg.into()))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(ServiceError::Unauthorized(msg.into()))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(ServiceError::Forbidden(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(ServiceError::NotFound(msg.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Server-side details stay in the logs.
        let message = match &self.0 {
            ServiceError::Decryption(_) => {
                warn!(error = %self.0, "stored field could not be decrypted");
                "stored content could not be decrypted".to_owned()
            }
            ServiceError::Internal(_) => {
                error!(error = %self.0, "request failed");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(self.0.code(), message))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<DecryptionError> for ApiError {
    fn from(e: DecryptionError) -> Self {
        Self(ServiceError::Decryption(e.to_string()))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => Self(ServiceError::BadRequest(e.to_string())),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self(ServiceError::Internal(e.to_string()))
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        Self(ServiceError::Internal(e.to_string()))
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        Self(ServiceError::Internal(e.to_string()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self(ServiceError::BadRequest(format!("invalid multipart body: {}", e.body_text())))
    }
}
