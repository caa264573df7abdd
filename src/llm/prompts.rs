//! Prompt templates for the planning and synthesis roles
//!
//! Placeholders in `{braces}` are filled with `str::replace`; the templates
//! carry no logic.

use crate::types::{QueryIntent, RunState};

pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are a market research planner for early-stage startup ideas.
Given an idea, write one short social-search query per research intent.
Respond with a single JSON object and nothing else."#;

const PLANNER_USER_PROMPT: &str = r#"### IDEA
{idea}

### CONTEXT
{context}

### OUTPUT FORMAT
{
  "description": "one-sentence neutral description of the idea",
{intents}
}"#;

const SYNTHESIS_PROMPT: &str = r#"You are a startup analyst. Judge the idea below using ONLY the evidence provided.

### IDEA
{idea}
{description}

### TRENDS
{trends}

### DEMAND
{demand}

### EARLY ADOPTERS
{adopters}

### INVESTORS
{funders}

### COMMUNITY & COMPETITION
{community}

### WEB RESEARCH
{web}

### OUTPUT FORMAT
Respond with a single JSON object:
{
  "score": 0-100,
  "recommendation": "build" | "explore" | "pivot" | "abandon",
  "market_timing": "too_early" | "emerging" | "ripe" | "saturated",
  "competition": "low" | "moderate" | "high",
  "headline": "one line",
  "summary": "3-4 sentences",
  "target_audience": "who buys first",
  "strengths": ["..."],
  "risks": ["..."],
  "next_steps": ["..."]
}"#;

const SIMPLIFIED_SYNTHESIS_PROMPT: &str = r#"Rate this startup idea from 0 to 100 and recommend build, explore, pivot or abandon.
Idea: {idea}
Demand score: {demand_score}/100
Respond ONLY with JSON: {"score": <number>, "recommendation": "<word>", "headline": "<one line>", "summary": "<two sentences>"}"#;

/// User prompt for the planner, listing every intent key.
pub fn planner_user_prompt(idea: &str, context: Option<&str>) -> String {
    let intents = QueryIntent::ALL
        .iter()
        .map(|i| format!("  \"{}\": \"...\"", i.key()))
        .collect::<Vec<_>>()
        .join(",\n");
    PLANNER_USER_PROMPT
        .replace("{idea}", idea)
        .replace("{context}", context.unwrap_or("(none)"))
        .replace("{intents}", &intents)
}

/// Full synthesis prompt built from every populated state field.
pub fn synthesis_prompt(state: &RunState) -> String {
    let unavailable = || "unavailable".to_string();

    let description = state
        .description
        .get()
        .map(|d| format!("Description: {d}"))
        .unwrap_or_default();

    let trends = state.trends.get().map_or_else(unavailable, |t| {
        let topics = t
            .matching_topics
            .iter()
            .map(|topic| topic.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Momentum: {:?} | Trend-scan posts: {} | Engagement: {} | Matching trends: {}",
            t.momentum,
            t.scan_post_count,
            t.scan_engagement,
            if topics.is_empty() { "none" } else { &topics }
        )
    });

    let demand = state.demand.get().map_or_else(unavailable, |d| {
        let quotes = d
            .pain_quotes
            .iter()
            .map(|q| format!("- \"{q}\""))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Demand score: {}/100 | Posts: {} | Engagement: {} | Pain posts: {} | Sentiment +{}/-{}/~{}\n{}",
            d.demand_score,
            d.post_count,
            d.total_engagement,
            d.pain_post_count,
            d.sentiment.positive,
            d.sentiment.negative,
            d.sentiment.neutral,
            quotes
        )
    });

    let adopters = state.adopters.get().map_or_else(unavailable, |a| {
        format!(
            "{} candidate adopters, combined reach {} followers: {}",
            a.profiles.len(),
            a.total_reach,
            a.profiles
                .iter()
                .map(|p| format!("@{}", p.handle))
                .collect::<Vec<_>>()
                .join(", ")
        )
    });

    let funders = state.funders.get().map_or_else(unavailable, |f| {
        format!(
            "{} relevant investors, {} funding-related posts",
            f.investors.len(),
            f.funding_post_count
        )
    });

    let community = state.community.get().map_or_else(unavailable, |c| {
        format!(
            "{} community discussions, {} competitor mentions, active voices: {}",
            c.discussion_count,
            c.competitor_post_count,
            c.active_voices.join(", ")
        )
    });

    let web = state.web_intel.get().map_or_else(unavailable, |w| {
        let sources = w
            .sources
            .iter()
            .take(8)
            .map(|s| format!("- {} ({})", s.title, s.url))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\nSources:\n{}", w.digest, sources)
    });

    SYNTHESIS_PROMPT
        .replace("{idea}", &state.idea)
        .replace("{description}", &description)
        .replace("{trends}", &trends)
        .replace("{demand}", &demand)
        .replace("{adopters}", &adopters)
        .replace("{funders}", &funders)
        .replace("{community}", &community)
        .replace("{web}", &web)
}

/// Short second-chance prompt used when the full synthesis cannot be parsed.
pub fn simplified_synthesis_prompt(state: &RunState) -> String {
    let demand_score = state
        .demand
        .get()
        .map_or_else(|| "unknown".to_string(), |d| d.demand_score.to_string());
    SIMPLIFIED_SYNTHESIS_PROMPT
        .replace("{idea}", &state.idea)
        .replace("{demand_score}", &demand_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DemandData, RunInput, StatePatch};

    #[test]
    fn planner_prompt_lists_every_intent() {
        let prompt = planner_user_prompt("habit tracker", None);
        for intent in QueryIntent::ALL {
            assert!(prompt.contains(intent.key()));
        }
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn synthesis_prompt_marks_missing_sections() {
        let mut state = RunState::new("r", RunInput::new("habit tracker"));
        state.apply(StatePatch {
            demand: Some(DemandData {
                demand_score: 62,
                ..Default::default()
            }),
            ..Default::default()
        });
        let prompt = synthesis_prompt(&state);
        assert!(prompt.contains("Demand score: 62/100"));
        assert!(prompt.contains("### TRENDS\nunavailable"));
        assert!(simplified_synthesis_prompt(&state).contains("62/100"));
    }
}
