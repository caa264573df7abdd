//! Fault isolation around a single stage
//!
//! A stage error or panic never escapes: the wrapper reports it as a
//! warning event and substitutes the stage's fallback patch.

use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::warn;

use super::{RunContext, Stage};
use crate::types::{ProgressEvent, RunState, StateField, StatePatch};

pub struct Isolated {
    stage: Box<dyn Stage>,
}

impl Isolated {
    pub fn new(stage: Box<dyn Stage>) -> Self {
        Self { stage }
    }

    pub fn name(&self) -> &'static str {
        self.stage.name()
    }

    pub fn writes(&self) -> &'static [StateField] {
        self.stage.writes()
    }

    /// Run the stage; always yields a patch.
    pub async fn run(&self, state: &RunState, ctx: &RunContext) -> StatePatch {
        let outcome = AssertUnwindSafe(self.stage.run(state, ctx))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(patch)) => return patch,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
        };

        let preview = truncate(&failure, ctx.config.pipeline.error_preview_chars);
        let stage = self.stage.name();
        warn!(run_id = %ctx.run_id(), stage, error = %preview, "Stage failed, using fallback");
        ctx.emit(
            ProgressEvent::warning(format!("{stage} degraded: {preview}"))
                .with_payload(json!({ "stage": stage, "error": preview })),
        );

        self.stage.fallback(state, &ctx.config)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
