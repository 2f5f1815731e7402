//! Configuration loading and validation for the API service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid,
//! including malformed field-encryption key material.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::{FieldKeys, IvPolicy};

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 256-bit field-encryption key. **Required.**
    pub secret_key: String,

    /// Hex-encoded 128-bit IV used for field encryption. **Required.**
    pub iv: String,

    /// Whether new envelopes reuse `iv` or draw a fresh one.
    #[serde(default)]
    pub iv_policy: IvPolicy,

    /// HMAC secret used to sign access tokens. **Required.**
    pub access_token_secret: String,

    /// Lifetime of an access token.
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: u64,

    /// Lifetime of a password-reset token.
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory uploaded images are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Maximum number of images attached to one post.
    #[serde(default = "default_max_images")]
    pub max_images_per_post: usize,

    /// Maximum request body size, covering multipart uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Base URL used to build the link in password-reset mails.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Sender address for outgoing mail.
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Minimum accepted length of `ACCESS_TOKEN_SECRET` in bytes.
const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Upper bound for `RESET_TOKEN_TTL_SECS` (one week).
const MAX_RESET_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;

fn default_access_token_ttl() -> u64 {
    600_000
}
fn default_reset_token_ttl() -> u64 {
    3600
}
fn default_port() -> u16 {
    5000
}
fn default_upload_dir() -> String {
    "./Pics".into()
}
fn default_max_images() -> usize {
    3
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn default_mail_from() -> String {
    "noreply@localhost".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Parse the field-encryption key material.
    ///
    /// # Errors
    ///
    /// Returns an error if `SECRET_KEY` or `IV` is blank, not hex, or the wrong length.
    pub fn field_keys(&self) -> Result<FieldKeys> {
        FieldKeys::from_hex(&self.secret_key, &self.iv).context("invalid field-encryption key material")
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        self.field_keys()?;
        ensure_non_empty(&self.access_token_secret, "ACCESS_TOKEN_SECRET")?;
        ensure_non_empty(&self.upload_dir, "UPLOAD_DIR")?;
        ensure_non_empty(&self.public_base_url, "PUBLIC_BASE_URL")?;
        ensure_non_empty(&self.mail_from, "MAIL_FROM")?;

        if self.access_token_secret.len() < MIN_TOKEN_SECRET_LEN {
            anyhow::bail!("ACCESS_TOKEN_SECRET must be at least {MIN_TOKEN_SECRET_LEN} bytes");
        }
        if self.access_token_ttl_secs == 0 {
            anyhow::bail!("ACCESS_TOKEN_TTL_SECS must be > 0");
        }
        if self.reset_token_ttl_secs == 0 || self.reset_token_ttl_secs > MAX_RESET_TOKEN_TTL_SECS {
            anyhow::bail!("RESET_TOKEN_TTL_SECS must be between 1 and {MAX_RESET_TOKEN_TTL_SECS}");
        }
        if self.max_images_per_post == 0 {
            anyhow::bail!("MAX_IMAGES_PER_POST must be > 0");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_BYTES must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config(upload_dir: &str) -> Config {
    Config {
        secret_key: "00".repeat(crate::crypto::KEY_LEN),
        iv: "00".repeat(crate::crypto::IV_LEN),
        iv_policy: IvPolicy::Fixed,
        access_token_secret: "test-access-token-secret-0123456789abcdef".into(),
        access_token_ttl_secs: default_access_token_ttl(),
        reset_token_ttl_secs: default_reset_token_ttl(),
        port: default_port(),
        upload_dir: upload_dir.into(),
        max_images_per_post: default_max_images(),
        max_upload_bytes: default_max_upload_bytes(),
        public_base_url: default_public_base_url(),
        mail_from: default_mail_from(),
        log_level: default_log_level(),
    }
}
