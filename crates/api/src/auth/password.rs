//! Argon2id hashing for passwords and password-reset tokens.
//!
//! Hashing is CPU-bound, so the async entry points run it on the blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Errors produced by the hashing layer.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// argon2 rejected the input or the stored hash is not a valid PHC string.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The blocking task was cancelled or panicked.
    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash `secret` into a PHC string with a fresh random salt.
pub fn hash_secret(secret: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `secret` against a stored PHC string.
///
/// Returns `Ok(false)` on a mismatch; errors only for unparseable hashes.
pub fn verify_secret(secret: &str, phc: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(phc).map_err(|e| PasswordError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}

/// [`hash_secret`] on the blocking pool.
pub async fn hash(secret: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_secret(&secret)).await?
}

/// [`verify_secret`] on the blocking pool.
pub async fn verify(secret: String, phc: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_secret(&secret, &phc)).await?
}
