//! `social-svc` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Assemble [`AppState`]: field codec, token signer, store, mailer.
//! 4. Make sure the image upload directory exists.
//! 5. Build the Axum router and start the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use api::config::Config;
use api::mail::LogMailer;
use api::server::{self, state::AppState};
use api::store::MemoryStore;
use api::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        "social-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Application state
    // -----------------------------------------------------------------------
    let state = AppState::from_config(&cfg, Arc::new(MemoryStore::new()), Arc::new(LogMailer))?;
    info!(iv_policy = ?state.codec.iv_policy(), "field encryption ready");

    // -----------------------------------------------------------------------
    // 4. Upload directory
    // -----------------------------------------------------------------------
    state
        .images
        .ensure_dir()
        .await
        .with_context(|| format!("cannot create upload directory {}", state.images.dir().display()))?;
    info!(dir = %state.images.dir().display(), "upload directory ready");

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
