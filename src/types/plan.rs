//! Query plan: one query string per research intent

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::signals;

/// The closed set of things the pipeline searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    TrendScan,
    RecentDemand,
    TopDemand,
    PainSignal,
    AdopterSearch,
    InvestorSearch,
    CompetitorSearch,
    CommunityQuery,
}

impl QueryIntent {
    pub const ALL: [QueryIntent; 8] = [
        QueryIntent::TrendScan,
        QueryIntent::RecentDemand,
        QueryIntent::TopDemand,
        QueryIntent::PainSignal,
        QueryIntent::AdopterSearch,
        QueryIntent::InvestorSearch,
        QueryIntent::CompetitorSearch,
        QueryIntent::CommunityQuery,
    ];

    /// Key used in the planner's JSON response.
    pub fn key(self) -> &'static str {
        match self {
            QueryIntent::TrendScan => "trend_scan",
            QueryIntent::RecentDemand => "recent_demand",
            QueryIntent::TopDemand => "top_demand",
            QueryIntent::PainSignal => "pain_signal",
            QueryIntent::AdopterSearch => "adopter_search",
            QueryIntent::InvestorSearch => "investor_search",
            QueryIntent::CompetitorSearch => "competitor_search",
            QueryIntent::CommunityQuery => "community_query",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.key() == key)
    }

    /// Template query used when the planner is unavailable.
    fn template(self, phrase: &str) -> String {
        match self {
            QueryIntent::TrendScan => phrase.to_string(),
            QueryIntent::RecentDemand => format!("{phrase} (need OR want OR \"looking for\")"),
            QueryIntent::TopDemand => format!("{phrase} min_faves:20"),
            QueryIntent::PainSignal => {
                format!("{phrase} (frustrated OR struggle OR hate OR annoying)")
            }
            QueryIntent::AdopterSearch => phrase.to_string(),
            QueryIntent::InvestorSearch => format!("{phrase} investor"),
            QueryIntent::CompetitorSearch => format!("{phrase} (app OR startup OR alternative)"),
            QueryIntent::CommunityQuery => format!("{phrase} community"),
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Where the plan's queries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Llm,
    Template,
}

/// Query string for every [`QueryIntent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    queries: BTreeMap<QueryIntent, String>,
    pub source: PlanSource,
}

impl QueryPlan {
    /// Deterministic plan derived only from the idea text.
    pub fn template(idea: &str) -> Self {
        let phrase = signals::keyword_phrase(idea);
        let queries = QueryIntent::ALL
            .into_iter()
            .map(|intent| (intent, intent.template(&phrase)))
            .collect();
        Self {
            queries,
            source: PlanSource::Template,
        }
    }

    /// Build from the planner's `{intent: query}` map; unknown keys are
    /// ignored and missing or blank intents come from the template.
    pub fn from_planner(raw: &HashMap<String, String>, idea: &str) -> Self {
        let mut plan = Self::template(idea);
        let mut used = 0;
        for (key, query) in raw {
            let query = query.trim();
            if query.is_empty() {
                continue;
            }
            if let Some(intent) = QueryIntent::from_key(key) {
                plan.queries.insert(intent, query.to_string());
                used += 1;
            }
        }
        if used > 0 {
            plan.source = PlanSource::Llm;
        }
        plan
    }

    pub fn query(&self, intent: QueryIntent) -> &str {
        self.queries.get(&intent).map_or("", String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryIntent, &str)> {
        self.queries.iter().map(|(i, q)| (*i, q.as_str()))
    }
}
