//! Layer stack applied to every route: request tracing, a per-request
//! timeout, response compression, and the request body limit.

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrap `router` in the service's middleware. `body_limit` caps every body
/// extractor, multipart uploads included.
pub fn apply<S>(router: Router<S>, body_limit: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
}
