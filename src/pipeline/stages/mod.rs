//! The fixed research chain
//!
//! | Stage       | Writes                    | Calls                                  |
//! |-------------|---------------------------|----------------------------------------|
//! | `plan`      | description, query_plan   | planner LLM; starts web prefetch       |
//! | `trends`    | trends                    | trending topics, trend-scan search     |
//! | `demand`    | demand                    | recent, top and pain-signal searches   |
//! | `adopters`  | adopters                  | user search                            |
//! | `funders`   | funders                   | investor user search, investor posts   |
//! | `community` | community                 | community and competitor searches      |
//! | `web_intel` | web_intel                 | joins the web prefetch                 |
//! | `verdict`   | verdict                   | synthesis LLM, simplified synthesis    |

mod adopters;
mod community;
mod demand;
mod funders;
mod plan;
mod trends;
mod verdict;
pub(crate) mod web_intel;

pub use adopters::AdoptersStage;
pub use community::CommunityStage;
pub use demand::DemandStage;
pub use funders::FundersStage;
pub use plan::PlanStage;
pub use trends::TrendsStage;
pub use verdict::{fallback_verdict, VerdictStage};
pub use web_intel::WebIntelStage;

use super::Stage;
use crate::types::{Post, QueryPlan, RunState};

pub fn standard_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(PlanStage),
        Box::new(TrendsStage),
        Box::new(DemandStage),
        Box::new(AdoptersStage),
        Box::new(FundersStage),
        Box::new(CommunityStage),
        Box::new(WebIntelStage),
        Box::new(VerdictStage),
    ]
}

/// Plan written by the plan stage, or the template plan if it is absent.
fn plan_for(state: &RunState) -> QueryPlan {
    state
        .query_plan
        .get()
        .cloned()
        .unwrap_or_else(|| QueryPlan::template(&state.idea))
}

/// Highest-engagement posts first, at most `n`.
fn top_by_engagement(posts: &[Post], n: usize) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by(|a, b| b.engagement().cmp(&a.engagement()));
    sorted.truncate(n);
    sorted
}

/// Note describing partial failure, if any.
fn partial_note(failed: usize, attempted: usize) -> Option<String> {
    (failed > 0).then(|| format!("{failed} of {attempted} searches failed"))
}
