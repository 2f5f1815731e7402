//! Axum request handlers for all service endpoints.

pub mod posts;
pub mod users;

use axum::{http::StatusCode, response::IntoResponse, Json};
use common::protocol::{ErrorResponse, HealthResponse};
use uuid::Uuid;

use super::error::ApiError;

/// `GET /health` — liveness check.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Parse a path segment as a record id.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid id"))
}

/// Trim a required text input, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        assert!(parse_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" ana ".into())), Some("ana".into()));
        assert_eq!(non_blank(None), None);
    }
}
