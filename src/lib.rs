//! idea-scout: Startup Idea Research Pipeline
//!
//! Gathers market signal about a startup idea from social search, web
//! research and an LLM, and streams progress while it works.
//!
//! ## Architecture
//!
//! - **Pipeline Engine**: fixed chain of fault-isolated stages over one run state
//! - **Scheduling**: fan-out with per-call timeouts, social API rate limiter,
//!   web research prefetch
//! - **Sources / LLM**: collaborator traits with `reqwest` implementations
//! - **API**: WebSocket transport streaming progress events

pub mod api;
pub mod config;
pub mod events;
pub mod llm;
pub mod pipeline;
pub mod scheduling;
pub mod signals;
pub mod sources;
pub mod types;

// Re-export configuration
pub use config::{ApiKeys, ScoutConfig};

// Re-export the engine surface
pub use events::{ChannelSink, EventSink, MemorySink, TracingSink};
pub use pipeline::{PipelineEngine, PipelineError, RunContext, Services, Stage, StageError};

// Re-export commonly used types
pub use types::{
    EventKind, ProgressEvent, QueryPlan, Recommendation, RunInput, RunState, Slot, StatePatch,
    Verdict, VerdictOrigin,
};
