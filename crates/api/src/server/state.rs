//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::auth::TokenSigner;
use crate::config::Config;
use crate::crypto::FieldCodec;
use crate::mail::Mailer;
use crate::store::DocumentStore;
use crate::uploads::ImageStore;

/// Request-handling limits and addresses taken from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_images_per_post: usize,
    pub max_upload_bytes: usize,
    pub reset_token_ttl_secs: i64,
    pub public_base_url: String,
    pub mail_from: String,
}

impl From<&Config> for Settings {
    fn from(cfg: &Config) -> Self {
        Self {
            max_images_per_post: cfg.max_images_per_post,
            max_upload_bytes: cfg.max_upload_bytes,
            reset_token_ttl_secs: i64::try_from(cfg.reset_token_ttl_secs).unwrap_or(i64::MAX),
            public_base_url: cfg.public_base_url.clone(),
            mail_from: cfg.mail_from.clone(),
        }
    }
}

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Posts, comments, users, reset tokens.
    pub store: Arc<dyn DocumentStore>,
    /// Field encryption for post and comment content.
    pub codec: FieldCodec,
    /// Access-token issue and verification.
    pub tokens: TokenSigner,
    /// Outgoing mail.
    pub mailer: Arc<dyn Mailer>,
    /// Destination for uploaded images.
    pub images: ImageStore,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Assemble state from validated configuration and the chosen collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the field keys or token secret are unusable.
    pub fn from_config(
        cfg: &Config,
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self> {
        let codec = FieldCodec::new(cfg.field_keys()?, cfg.iv_policy);
        let tokens = TokenSigner::new(cfg.access_token_secret.as_bytes(), cfg.access_token_ttl_secs)
            .context("invalid ACCESS_TOKEN_SECRET")?;

        Ok(Self {
            store,
            codec,
            tokens,
            mailer,
            images: ImageStore::new(&cfg.upload_dir),
            settings: Arc::new(Settings::from(cfg)),
        })
    }
}
