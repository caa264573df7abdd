//! Pipeline engine: runs the stage chain over one accumulating state

use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use super::stages::standard_stages;
use super::{Isolated, RunContext, Stage};
use crate::types::{ProgressEvent, RunInput, RunState, StatePatch};

/// Failures that end a run without a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal invariant violated: {0}")]
    Invariant(String),
    #[error("run cancelled")]
    Cancelled,
}

/// Ordered, fault-isolated stage chain.
pub struct PipelineEngine {
    stages: Vec<Isolated>,
}

impl PipelineEngine {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            stages: stages.into_iter().map(Isolated::new).collect(),
        }
    }

    /// plan → trends → demand → adopters → funders → community → web_intel → verdict
    pub fn standard() -> Self {
        Self::new(standard_stages())
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Isolated::name).collect()
    }

    /// Run every stage in order and return the final state.
    ///
    /// Stage failures are absorbed; only bad input, a broken ownership
    /// contract, a missing verdict or cancellation end the run early.
    pub async fn run(&self, input: RunInput, ctx: &RunContext) -> Result<RunState, PipelineError> {
        validate_idea(&input.idea, ctx.config.pipeline.max_idea_chars)?;

        let mut state = RunState::new(ctx.run_id(), input);
        let run_start = Instant::now();
        info!(
            run_id = %state.run_id,
            idea = %state.idea,
            stages = self.stages.len(),
            "Pipeline run started"
        );

        for stage in &self.stages {
            if ctx.cancel.is_cancelled() {
                info!(run_id = %state.run_id, next_stage = stage.name(), "Pipeline run cancelled");
                return Err(PipelineError::Cancelled);
            }

            ctx.emit(ProgressEvent::stage_start(stage.name()));
            let started = Instant::now();

            let patch = stage.run(&state, ctx).await;
            check_ownership(stage, &patch)?;
            state.apply(patch);

            let elapsed_ms = started.elapsed().as_millis();
            debug!(run_id = %state.run_id, stage = stage.name(), elapsed_ms, "Stage complete");
            ctx.emit(ProgressEvent::stage_complete(stage.name(), elapsed_ms));
        }

        let verdict = state
            .verdict
            .get()
            .ok_or_else(|| PipelineError::Invariant("chain finished without a verdict".into()))?;

        info!(
            run_id = %state.run_id,
            score = verdict.score,
            recommendation = %verdict.recommendation,
            origin = ?verdict.origin,
            elapsed_ms = run_start.elapsed().as_millis(),
            "Pipeline run complete"
        );
        ctx.emit(ProgressEvent::terminal(verdict));
        Ok(state)
    }
}

fn validate_idea(idea: &str, max_chars: usize) -> Result<(), PipelineError> {
    let trimmed = idea.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidInput("idea must not be empty".into()));
    }
    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(PipelineError::InvalidInput(format!(
            "idea is {len} characters, limit is {max_chars}"
        )));
    }
    Ok(())
}

fn check_ownership(stage: &Isolated, patch: &StatePatch) -> Result<(), PipelineError> {
    let owned = stage.writes();
    match patch.fields().into_iter().find(|f| !owned.contains(f)) {
        Some(field) => Err(PipelineError::Invariant(format!(
            "stage {} wrote field {field} it does not own",
            stage.name()
        ))),
        None => Ok(()),
    }
}
