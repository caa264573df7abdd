//! Research Pipeline Module
//!
//! ## Stage Chain
//!
//! ```text
//! plan ─┬─> trends -> demand -> adopters -> funders -> community -> web_intel -> verdict
//!       │                                                             ▲
//!       └──────────── web research prefetch (background task) ────────┘
//! ```
//!
//! Stages run strictly one after another over a single [`RunState`]. Each
//! stage is wrapped in [`Isolated`], so a failing or panicking stage is
//! replaced by its fallback patch and the run always reaches the verdict.
//!
//! [`RunState`]: crate::types::RunState

mod context;
mod engine;
mod isolation;
mod stage;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{RunContext, Services};
pub use engine::{PipelineEngine, PipelineError};
pub use isolation::Isolated;
pub use stage::{Stage, StageError};
