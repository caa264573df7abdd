//! API route definitions

use axum::{routing::get, Router};

use super::handlers::{self, ScoutState};

pub fn routes(state: ScoutState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(handlers::ws_upgrade))
        .with_state(state)
}
