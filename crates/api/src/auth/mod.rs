//! Account authentication: password hashing, access tokens, and the
//! [`AuthUser`] request extractor.
//!
//! # Security invariants
//!
//! - Passwords and reset tokens are only ever stored as argon2 PHC strings.
//! - Access tokens are compared in constant time.
//! - Neither passwords nor tokens appear in logs or traces.

pub mod extract;
pub mod password;
pub mod token;

pub use extract::AuthUser;
pub use password::PasswordError;
pub use token::{Claims, TokenError, TokenSigner};
