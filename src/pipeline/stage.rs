//! Stage trait and stage-level errors

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ScoutConfig;
use crate::scheduling::{Envelope, PrefetchError};
use crate::types::{RunState, StateField, StatePatch};

use super::RunContext;

/// Why a stage could not produce its own patch.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("all {attempted} external calls failed (first: {first})")]
    AllCallsFailed { attempted: usize, first: String },
    #[error("LLM call failed: {0}")]
    Llm(String),
    #[error(transparent)]
    Prefetch(#[from] PrefetchError),
}

impl StageError {
    /// `Some` when every envelope failed. An empty slice never fails.
    pub fn if_all_failed<T>(envelopes: &[Envelope<T>]) -> Option<Self> {
        if envelopes.is_empty() || envelopes.iter().any(Envelope::succeeded) {
            return None;
        }
        let first = envelopes
            .iter()
            .find_map(Envelope::error)
            .map(ToString::to_string)
            .unwrap_or_default();
        Some(StageError::AllCallsFailed {
            attempted: envelopes.len(),
            first,
        })
    }
}

/// One step of the research chain.
///
/// A stage reads the accumulated state, calls out, and returns a patch
/// that touches only the fields listed in [`Stage::writes`].
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fields this stage owns.
    fn writes(&self) -> &'static [StateField];

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError>;

    /// Patch used when `run` fails or panics.
    ///
    /// Must be deterministic, must not call out, and must write every
    /// owned field.
    fn fallback(&self, state: &RunState, config: &ScoutConfig) -> StatePatch;
}
