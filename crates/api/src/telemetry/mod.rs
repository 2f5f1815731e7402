//! Tracing setup for the service.
//!
//! # Telemetry invariants
//!
//! - **No key material, passwords, tokens, or decrypted content** may appear in
//!   any span attribute or log field. Record ids and usernames are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), and
//!   `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init_telemetry;
