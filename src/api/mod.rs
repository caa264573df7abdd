//! HTTP/WebSocket transport using Axum
//!
//! - `GET /health`: liveness and version
//! - `GET /ws`: one research run per connection. The client sends
//!   `{"idea": "...", "context": "..."}` as its first text frame and then
//!   receives progress events as JSON text frames until the run ends with a
//!   `terminal_result` or a single `error` event.

pub mod handlers;
mod routes;
mod session;

pub use handlers::ScoutState;
pub use session::RunRequest;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Env var holding a comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "IDEA_SCOUT_CORS_ORIGINS";

/// Build a CORS layer that is restrictive by default (same-origin only).
fn build_cors_layer() -> CorsLayer {
    match std::env::var(CORS_ORIGINS_ENV) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(state: ScoutState) -> Router {
    routes::routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
