//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with the `/api/users` and `/api/posts` routes.
//! - Map domain failures to JSON error responses.
//! - Inject shared application state (`AppState`) into handlers.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
