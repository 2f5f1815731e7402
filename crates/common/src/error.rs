//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::Forbidden`] → 403
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::Decryption`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed: missing field, invalid id, bad multipart body.
    #[error("{0}")]
    BadRequest(String),

    /// No credentials were supplied or they did not verify.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but does not own the resource.
    #[error("{0}")]
    Forbidden(String),

    /// The addressed post, comment, or user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A stored field looked encrypted but could not be decrypted.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Decryption(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the error response body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Decryption(_) => "decryption_failed",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}
