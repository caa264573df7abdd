//! Shared data structures for the idea research pipeline
//!
//! - `state`: RunInput, RunState, Slot, StatePatch (threaded through stages)
//! - `plan`: QueryIntent, QueryPlan (written by the plan stage)
//! - `signal`: collaborator items and the per-stage data built from them
//! - `verdict`: Verdict and its closed enumerations (terminal output)
//! - `event`: ProgressEvent stream records

mod event;
mod plan;
mod signal;
mod state;
mod verdict;

pub use event::*;
pub use plan::*;
pub use signal::*;
pub use state::*;
pub use verdict::*;
