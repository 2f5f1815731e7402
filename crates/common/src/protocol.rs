//! Request and response types exchanged over the public HTTP API.
//!
//! Field names are camelCase on the wire (`accessToken`, `userId`) so existing
//! clients keep working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Request body for `POST /api/users/register`.
///
/// Fields are optional at the serde level so that a missing field produces the
/// service's own 400 message rather than a generic extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Successful response body for `POST /api/users/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

/// Request body for `POST /api/users/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Successful response body for `POST /api/users/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed bearer token to present on authenticated routes.
    pub access_token: String,
    pub id: Uuid,
}

/// Identity of the authenticated caller, returned by `GET /api/users/current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Request body for `POST /api/users/forgotPassword`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

/// Query string for `PATCH /api/users/resetPassword`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordQuery {
    pub token: Option<String>,
    pub id: Option<String>,
}

/// Request body for `PATCH /api/users/resetPassword`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Posts and comments
// ---------------------------------------------------------------------------

/// A post as returned to clients, with `content` already decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub images: Vec<String>,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment as returned to clients, with `content` already decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Response body for `GET /api/posts/post/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithComments {
    pub post: PostView,
    pub comments: Vec<CommentView>,
}

/// Request body for `POST /api/posts/addComment/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddCommentRequest {
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Generic bodies
// ---------------------------------------------------------------------------

/// Plain acknowledgement body used by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: String,
}
