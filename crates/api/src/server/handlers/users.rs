//! `/api/users` — registration, login, current user, password reset.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use common::protocol::{
    CurrentUser, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, RegisterResponse, ResetPasswordQuery, ResetPasswordRequest,
};
use rand::{rngs::OsRng, RngCore};
use tracing::{info, warn};
use uuid::Uuid;

use super::non_blank;
use crate::auth::{password, AuthUser};
use crate::mail;
use crate::server::{error::ApiError, state::AppState};
use crate::store::{ResetTokenRecord, StoreError, UserRecord};

const DUPLICATE_USER: &str = "User already registered with the given email or given username";
const INVALID_TOKEN: &str = "Token is not valid";

/// Random bytes in a password-reset token.
const RESET_TOKEN_BYTES: usize = 20;

/// `POST /api/users/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (Some(username), Some(email), Some(password)) = (
        non_blank(req.username),
        non_blank(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("All fields are mandatory"));
    };

    if state.store.user_by_email(&email).await?.is_some()
        || state.store.user_by_username(&username).await?.is_some()
    {
        return Err(ApiError::bad_request(DUPLICATE_USER));
    }

    let user = UserRecord {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash: password::hash(password).await?,
        created_at: Utc::now(),
    };
    let (id, email, username) = (user.id, user.email.clone(), user.username.clone());

    // A concurrent registration can still win the race after the checks above.
    state.store.insert_user(user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => ApiError::bad_request(DUPLICATE_USER),
    })?;
    info!(user_id = %id, "user registered");

    let confirmation = mail::registration_mail(&state.settings.mail_from, &email, &username);
    if let Err(e) = state.mailer.send(&confirmation) {
        warn!(user_id = %id, error = %e, "registration mail not sent");
    }

    Ok((StatusCode::CREATED, Json(RegisterResponse { id, email })))
}

/// `POST /api/users/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) =
        (non_blank(req.username), req.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("All fields are mandatory"));
    };

    let invalid = || ApiError::unauthorized("username or password is not valid");

    let user = state
        .store
        .user_by_username(&username)
        .await?
        .ok_or_else(invalid)?;
    if !password::verify(password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let access_token = state.tokens.issue(user.id, &user.username, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        id: user.id,
    }))
}

/// `GET /api/users/current`
pub async fn current(user: AuthUser) -> Json<CurrentUser> {
    let claims = user.0;
    Json(CurrentUser {
        id: claims.sub,
        username: claims.username,
        email: claims.email,
    })
}

/// `POST /api/users/forgotPassword`
///
/// Issues a single-use reset token, stores only its hash, and mails the link.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = non_blank(req.email).ok_or_else(|| ApiError::bad_request("Email is required"))?;
    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut raw = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut raw);
    let token = hex::encode(raw);

    state
        .store
        .put_reset_token(ResetTokenRecord {
            user_id: user.id,
            token_hash: password::hash(token.clone()).await?,
            expires_at: Utc::now() + chrono::Duration::seconds(state.settings.reset_token_ttl_secs),
        })
        .await?;

    let link = mail::reset_password_mail(
        &state.settings.mail_from,
        &user.email,
        &state.settings.public_base_url,
        &token,
        &user.id.to_string(),
    );
    if let Err(e) = state.mailer.send(&link) {
        warn!(user_id = %user.id, error = %e, "reset mail not sent");
    }
    info!(user_id = %user.id, "password reset requested");

    Ok(Json(MessageResponse::new("Check your email to reset password")))
}

/// `PATCH /api/users/resetPassword?token=…&id=…`
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<ResetPasswordQuery>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(token), Some(id)) = (non_blank(query.token), non_blank(query.id)) else {
        return Err(ApiError::bad_request("Invalid Id"));
    };
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid Id"))?;
    let new_password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Password is required"))?;

    let user = state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("User not found"))?;
    let stored = state
        .store
        .reset_token_for(user.id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Reset token not found"))?;

    if stored.expires_at <= Utc::now() {
        return Err(ApiError::bad_request(INVALID_TOKEN));
    }
    if !password::verify(token, stored.token_hash).await? {
        return Err(ApiError::bad_request(INVALID_TOKEN));
    }

    let new_hash = password::hash(new_password).await?;
    state.store.set_password_hash(user.id, new_hash).await?;
    state.store.delete_reset_token(user.id).await?;
    info!(user_id = %user.id, "password reset");

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
