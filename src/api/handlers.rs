//! Request handlers

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::session::run_session;
use crate::config::ScoutConfig;
use crate::pipeline::{PipelineEngine, Services};

/// Shared state for all connections.
#[derive(Clone)]
pub struct ScoutState {
    pub engine: Arc<PipelineEngine>,
    pub services: Services,
    pub config: Arc<ScoutConfig>,
    pub started_at: Instant,
}

impl ScoutState {
    pub fn new(engine: PipelineEngine, services: Services, config: Arc<ScoutConfig>) -> Self {
        Self {
            engine: Arc::new(engine),
            services,
            config,
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<ScoutState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<ScoutState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (outgoing, incoming) = socket.split();
        run_session(outgoing, incoming, state).await;
    })
}
