//! Common types, protocol definitions, and errors shared across `social-svc` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
