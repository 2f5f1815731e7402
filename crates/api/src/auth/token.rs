//! HMAC-SHA256 signed access tokens.
//!
//! # Token format
//!
//! ```text
//! <base64url-no-pad(claims JSON)>.<base64url-no-pad(HMAC-SHA256(secret, first part))>
//! ```

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced when issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is not `<payload>.<signature>` or a part is not base64url / JSON.
    #[error("malformed access token")]
    Malformed,

    /// The signature does not match the payload.
    #[error("access token signature mismatch")]
    BadSignature,

    /// The `exp` claim is in the past.
    #[error("access token expired")]
    Expired,

    /// The signing secret was rejected by the MAC implementation.
    #[error("invalid access token secret")]
    InvalidSecret,

    /// The claims could not be serialised.
    #[error("failed to encode access token claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Identity carried inside an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    /// Expiry as a Unix timestamp in seconds.
    pub exp: i64,
}

/// Issues and verifies access tokens with a shared secret.
///
/// The keyed MAC state is built once and cloned per operation.
#[derive(Clone)]
pub struct TokenSigner {
    keyed: Arc<HmacSha256>,
    ttl_secs: i64,
}

impl TokenSigner {
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidSecret`] if the MAC rejects the key.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, TokenError> {
        let keyed = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidSecret)?;
        Ok(Self {
            keyed: Arc::new(keyed),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    /// Issue a token for the given user, expiring after the configured TTL.
    pub fn issue(&self, sub: Uuid, username: &str, email: &str) -> Result<String, TokenError> {
        let claims = Claims {
            sub,
            username: username.to_owned(),
            email: email.to_owned(),
            exp: Utc::now().timestamp().saturating_add(self.ttl_secs),
        };
        self.sign(&claims)
    }

    /// Serialise and sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes()).finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify the signature and expiry of `token`, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        self.mac(payload.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::clone(&self.keyed);
        mac.update(data);
        mac
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("keyed", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"0123456789abcdef0123456789abcdef", 60).unwrap()
    }

    #[test]
    fn issue_then_verify() {
        let s = signer();
        let id = Uuid::new_v4();
        let token = s.issue(id, "ana", "ana@example.com").unwrap();
        let claims = s.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "ana");
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = signer().issue(Uuid::new_v4(), "a", "a@x").unwrap();
        let other = TokenSigner::new(b"ffffffffffffffffffffffffffffffff", 60).unwrap();
        assert!(matches!(other.verify(&token), Err(TokenError::BadSignature)));
    }

    #[test]
    fn altered_payload_is_rejected() {
        let s = signer();
        let token = s.issue(Uuid::new_v4(), "a", "a@x").unwrap();
        let forged_claims = Claims {
            sub: Uuid::new_v4(),
            username: "mallory".into(),
            email: "m@x".into(),
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let (_, sig) = token.split_once('.').unwrap();
        let forged = format!("{forged_payload}.{sig}");
        assert!(matches!(s.verify(&forged), Err(TokenError::BadSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let s = signer();
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "a".into(),
            email: "a@x".into(),
            exp: 1_000,
        };
        let token = s.sign(&claims).unwrap();
        assert!(matches!(s.verify_at(&token, 1_000), Err(TokenError::Expired)));
        assert!(s.verify_at(&token, 999).is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(signer().verify("no-dot"), Err(TokenError::Malformed)));
        assert!(matches!(signer().verify("a.!!!"), Err(TokenError::Malformed)));
    }

    #[test]
    fn debug_redacts_secret() {
        assert!(format!("{:?}", signer()).contains("REDACTED"));
    }
}
