//! Run state: the record threaded through every stage of one research run

use serde::{Deserialize, Serialize};

use super::{
    AdopterData, CommunityData, DemandData, FunderData, QueryPlan, TrendData, Verdict, WebIntel,
};

// ============================================================================
// Slot
// ============================================================================

/// A run-state field that starts absent and is written by one stage.
///
/// `Ready` of an empty value ("computed, nothing found") is distinct from
/// `Absent` ("not computed yet").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Slot<T> {
    #[default]
    Absent,
    Ready(T),
}

impl<T> Slot<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Ready(v) => Some(v),
            Slot::Absent => None,
        }
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Names of the stage-written fields, used for ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    Description,
    QueryPlan,
    Trends,
    Demand,
    Adopters,
    Funders,
    Community,
    WebIntel,
    Verdict,
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StateField::Description => "description",
            StateField::QueryPlan => "query_plan",
            StateField::Trends => "trends",
            StateField::Demand => "demand",
            StateField::Adopters => "adopters",
            StateField::Funders => "funders",
            StateField::Community => "community",
            StateField::WebIntel => "web_intel",
            StateField::Verdict => "verdict",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Input & State
// ============================================================================

/// What a caller supplies to start a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub idea: String,
    /// Free-form extra context about the idea (audience, geography, ...)
    #[serde(default)]
    pub context: Option<String>,
}

impl RunInput {
    pub fn new(idea: impl Into<String>) -> Self {
        Self {
            idea: idea.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Accumulated state of one run. Owned by the engine; stages only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub idea: String,
    pub context: Option<String>,
    pub description: Slot<String>,
    pub query_plan: Slot<QueryPlan>,
    pub trends: Slot<TrendData>,
    pub demand: Slot<DemandData>,
    pub adopters: Slot<AdopterData>,
    pub funders: Slot<FunderData>,
    pub community: Slot<CommunityData>,
    pub web_intel: Slot<WebIntel>,
    pub verdict: Slot<Verdict>,
}

impl RunState {
    /// Fresh state with every stage field absent. The input must already be
    /// validated.
    pub fn new(run_id: impl Into<String>, input: RunInput) -> Self {
        Self {
            run_id: run_id.into(),
            idea: input.idea.trim().to_string(),
            context: input
                .context
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            description: Slot::Absent,
            query_plan: Slot::Absent,
            trends: Slot::Absent,
            demand: Slot::Absent,
            adopters: Slot::Absent,
            funders: Slot::Absent,
            community: Slot::Absent,
            web_intel: Slot::Absent,
            verdict: Slot::Absent,
        }
    }

    /// Merge a patch by whole-field replacement.
    pub fn apply(&mut self, patch: StatePatch) {
        let StatePatch {
            description,
            query_plan,
            trends,
            demand,
            adopters,
            funders,
            community,
            web_intel,
            verdict,
        } = patch;

        replace(&mut self.description, description);
        replace(&mut self.query_plan, query_plan);
        replace(&mut self.trends, trends);
        replace(&mut self.demand, demand);
        replace(&mut self.adopters, adopters);
        replace(&mut self.funders, funders);
        replace(&mut self.community, community);
        replace(&mut self.web_intel, web_intel);
        replace(&mut self.verdict, verdict);
    }
}

fn replace<T>(slot: &mut Slot<T>, value: Option<T>) {
    if let Some(v) = value {
        *slot = Slot::Ready(v);
    }
}

// ============================================================================
// Patch
// ============================================================================

/// Partial update returned by a stage. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub description: Option<String>,
    pub query_plan: Option<QueryPlan>,
    pub trends: Option<TrendData>,
    pub demand: Option<DemandData>,
    pub adopters: Option<AdopterData>,
    pub funders: Option<FunderData>,
    pub community: Option<CommunityData>,
    pub web_intel: Option<WebIntel>,
    pub verdict: Option<Verdict>,
}

impl StatePatch {
    /// Fields this patch writes.
    pub fn fields(&self) -> Vec<StateField> {
        [
            (self.description.is_some(), StateField::Description),
            (self.query_plan.is_some(), StateField::QueryPlan),
            (self.trends.is_some(), StateField::Trends),
            (self.demand.is_some(), StateField::Demand),
            (self.adopters.is_some(), StateField::Adopters),
            (self.funders.is_some(), StateField::Funders),
            (self.community.is_some(), StateField::Community),
            (self.web_intel.is_some(), StateField::WebIntel),
            (self.verdict.is_some(), StateField::Verdict),
        ]
        .into_iter()
        .filter_map(|(set, field)| set.then_some(field))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
