//! Progress events streamed to the caller while a run is in flight

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{QueryPlan, Verdict};

/// Closed set of event kinds understood by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Warning,
    Error,
    StageStart,
    StageComplete,
    Plan,
    TerminalResult,
    Heartbeat,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Info => "info",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
            EventKind::StageStart => "stage_start",
            EventKind::StageComplete => "stage_complete",
            EventKind::Plan => "plan",
            EventKind::TerminalResult => "terminal_result",
            EventKind::Heartbeat => "heartbeat",
        };
        f.write_str(s)
    }
}

/// One progress record. Written once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            message: message.into(),
            payload: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventKind::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EventKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, message)
    }

    pub fn stage_start(stage: &str) -> Self {
        Self::new(EventKind::StageStart, format!("Starting {stage}"))
            .with_payload(json!({ "stage": stage }))
    }

    pub fn stage_complete(stage: &str, elapsed_ms: u128) -> Self {
        Self::new(EventKind::StageComplete, format!("Finished {stage}"))
            .with_payload(json!({ "stage": stage, "elapsed_ms": elapsed_ms }))
    }

    pub fn plan(plan: &QueryPlan) -> Self {
        let payload = serde_json::to_value(plan).unwrap_or(Value::Null);
        Self::new(EventKind::Plan, "Query plan ready").with_payload(payload)
    }

    pub fn terminal(verdict: &Verdict) -> Self {
        let payload = serde_json::to_value(verdict).unwrap_or(Value::Null);
        Self::new(
            EventKind::TerminalResult,
            format!("Verdict: {} ({}/100)", verdict.recommendation, verdict.score),
        )
        .with_payload(payload)
    }

    pub fn heartbeat() -> Self {
        Self::new(EventKind::Heartbeat, "alive")
    }

    /// Stage named in the payload, if any.
    pub fn stage(&self) -> Option<&str> {
        self.payload.as_ref()?.get("stage")?.as_str()
    }
}
