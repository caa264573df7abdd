//! One WebSocket research session
//!
//! The session is written against `Sink`/`Stream` so it can be driven by an
//! in-memory channel pair in tests.

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handlers::ScoutState;
use crate::events::ChannelSink;
use crate::pipeline::{PipelineError, RunContext};
use crate::types::{EventKind, ProgressEvent, RunInput};

/// First frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub idea: String,
    #[serde(default)]
    pub context: Option<String>,
}

impl From<RunRequest> for RunInput {
    fn from(req: RunRequest) -> Self {
        RunInput {
            idea: req.idea,
            context: req.context,
        }
    }
}

fn parse_request(text: &str) -> Result<RunRequest, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid request: {e}"))
}

fn frame(event: &ProgressEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize progress event");
            None
        }
    }
}

async fn send<S>(outgoing: &mut S, event: &ProgressEvent) -> bool
where
    S: Sink<Message> + Unpin,
{
    match frame(event) {
        Some(msg) => outgoing.send(msg).await.is_ok(),
        None => true,
    }
}

/// Wait for the client's request frame. `None` when the client leaves first.
async fn read_request<R, E>(incoming: &mut R) -> Option<Result<RunRequest, String>>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(msg) = incoming.next().await {
        match msg {
            Ok(Message::Text(text)) => return Some(parse_request(&text)),
            Ok(Message::Close(_)) => return None,
            Ok(Message::Binary(_)) => {
                return Some(Err("invalid request: expected a JSON text frame".into()))
            }
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "WebSocket read failed before request");
                return None;
            }
        }
    }
    None
}

/// Drive one run: read the request, stream events, end with a terminal
/// result or a single error event.
pub(crate) async fn run_session<S, R, E>(mut outgoing: S, mut incoming: R, state: ScoutState)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let request = match read_request(&mut incoming).await {
        Some(Ok(request)) => request,
        Some(Err(message)) => {
            send(&mut outgoing, &ProgressEvent::error(message)).await;
            let _ = outgoing.close().await;
            return;
        }
        None => return,
    };

    let (sink, mut events) = ChannelSink::bounded(state.config.server.event_queue_capacity);
    let cancel = CancellationToken::new();
    let ctx = RunContext::new(state.services.clone(), Arc::clone(&state.config), Arc::new(sink))
        .with_cancel(cancel.clone());
    info!(run_id = %ctx.run_id(), "WebSocket run accepted");

    let engine = Arc::clone(&state.engine);
    let input = RunInput::from(request);
    let mut run = tokio::spawn(async move { engine.run(input, &ctx).await });

    let mut heartbeat =
        tokio::time::interval(Duration::from_secs(state.config.server.heartbeat_interval_secs.max(1)));
    heartbeat.tick().await;

    // The event queue may drop the terminal event when full.
    let mut terminal_sent = false;
    let outcome = loop {
        tokio::select! {
            Some(event) = events.recv() => {
                terminal_sent |= event.kind == EventKind::TerminalResult;
                if !send(&mut outgoing, &event).await {
                    info!("Client stopped receiving, cancelling run");
                    cancel.cancel();
                    return;
                }
            }
            _ = heartbeat.tick() => {
                if !send(&mut outgoing, &ProgressEvent::heartbeat()).await {
                    cancel.cancel();
                    return;
                }
            }
            msg = incoming.next() => {
                if matches!(msg, None | Some(Err(_)) | Some(Ok(Message::Close(_)))) {
                    info!("Client disconnected, cancelling run");
                    cancel.cancel();
                    return;
                }
            }
            joined = &mut run => break joined,
        }
    };

    // The run has finished and dropped its sink; flush what it left behind.
    while let Ok(event) = events.try_recv() {
        terminal_sent |= event.kind == EventKind::TerminalResult;
        if !send(&mut outgoing, &event).await {
            return;
        }
    }

    let failure = match outcome {
        Ok(Ok(state)) => {
            if let Some(verdict) = state.verdict.get().filter(|_| !terminal_sent) {
                debug!(run_id = %state.run_id, "Terminal event was dropped from the queue, resending");
                send(&mut outgoing, &ProgressEvent::terminal(verdict)).await;
            }
            None
        }
        Ok(Err(PipelineError::Cancelled)) => Some("run cancelled".to_string()),
        Ok(Err(e)) => Some(e.to_string()),
        Err(e) => Some(format!("run aborted: {e}")),
    };
    if let Some(message) = failure {
        warn!(error = %message, "Run ended without a verdict");
        send(&mut outgoing, &ProgressEvent::error(message)).await;
    }
    let _ = outgoing.close().await;
}
