//! `social-svc` — a small social backend (accounts, image posts, likes,
//! comments) whose user-written text is encrypted field by field before it
//! reaches the document store.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod mail;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod uploads;
