use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{ScoringConfig, ScoutConfig};
use crate::llm::{extract_json, prompts};
use crate::pipeline::{RunContext, Stage, StageError};
use crate::types::{
    Competition, MarketTiming, Momentum, ProgressEvent, Recommendation, RunState, StateField,
    StatePatch, Verdict, VerdictDraft, VerdictOrigin,
};

/// Synthesizes the scorecard.
///
/// Tries the full prompt, then a simplified one, then builds a verdict
/// from the gathered numbers alone. Always produces a verdict.
pub struct VerdictStage;

#[async_trait]
impl Stage for VerdictStage {
    fn name(&self) -> &'static str {
        "verdict"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Verdict]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        let verdict = match synthesize(ctx, &prompts::synthesis_prompt(state)).await {
            Some(draft) => draft.into_verdict(VerdictOrigin::Synthesis),
            None => {
                ctx.emit(ProgressEvent::info(
                    "Full synthesis unusable, retrying with a simplified prompt",
                ));
                match synthesize(ctx, &prompts::simplified_synthesis_prompt(state)).await {
                    Some(draft) => {
                        let mut verdict = draft.into_verdict(VerdictOrigin::Simplified);
                        if let Some(community) = state.community.get() {
                            verdict.competition =
                                Competition::from_mentions(community.competitor_post_count);
                        }
                        verdict
                    }
                    None => {
                        ctx.emit(ProgressEvent::warning(
                            "Synthesis unavailable; verdict built from gathered signal only",
                        ));
                        fallback_verdict(state, &ctx.config.scoring)
                    }
                }
            }
        };

        info!(
            run_id = %ctx.run_id(),
            score = verdict.score,
            origin = ?verdict.origin,
            "Verdict ready"
        );
        Ok(StatePatch {
            verdict: Some(verdict),
            ..Default::default()
        })
    }

    fn fallback(&self, state: &RunState, config: &ScoutConfig) -> StatePatch {
        StatePatch {
            verdict: Some(fallback_verdict(state, &config.scoring)),
            ..Default::default()
        }
    }
}

/// One synthesis attempt; `None` on call error or unusable output.
async fn synthesize(ctx: &RunContext, prompt: &str) -> Option<VerdictDraft> {
    let synthesizer = &ctx.services.synthesizer;
    match synthesizer.generate(prompt).await {
        Ok(text) => extract_json::<VerdictDraft>(&text)
            .parsed()
            .filter(VerdictDraft::is_usable),
        Err(e) => {
            warn!(
                run_id = %ctx.run_id(),
                backend = synthesizer.backend_name(),
                error = %e,
                "Synthesis call failed"
            );
            None
        }
    }
}

/// Verdict derived from run state alone.
///
/// The score is the demand score, or the degraded demand score when no
/// demand data exists. Recommendation is always `explore`.
pub fn fallback_verdict(state: &RunState, scoring: &ScoringConfig) -> Verdict {
    let score = state
        .demand
        .get()
        .map_or(scoring.degraded_demand_score, |d| d.demand_score);

    let market_timing = match state.trends.get().map(|t| t.momentum) {
        Some(Momentum::Quiet) => MarketTiming::TooEarly,
        _ => MarketTiming::Emerging,
    };
    let competition = state
        .community
        .get()
        .map_or(Competition::Moderate, |c| {
            Competition::from_mentions(c.competitor_post_count)
        });

    let mut strengths = Vec::new();
    if let Some(demand) = state.demand.get().filter(|d| d.pain_post_count > 0) {
        strengths.push(format!(
            "{} posts describe the problem in their own words",
            demand.pain_post_count
        ));
    }
    if let Some(adopters) = state.adopters.get().filter(|a| !a.profiles.is_empty()) {
        strengths.push(format!(
            "{} reachable early adopters identified",
            adopters.profiles.len()
        ));
    }

    Verdict {
        score,
        recommendation: Recommendation::Explore,
        market_timing,
        competition,
        headline: format!("Needs more validation: {}", state.idea),
        summary: format!(
            "Automated synthesis was unavailable, so this verdict is built from the raw signal. \
             Demand scored {score}/100. Treat the result as a starting point for manual research."
        ),
        target_audience: state
            .description
            .get()
            .cloned()
            .unwrap_or_else(|| state.idea.clone()),
        strengths,
        risks: vec!["Verdict produced without LLM synthesis".to_string()],
        next_steps: vec![
            "Interview people who posted about the problem".to_string(),
            "Re-run the research when all data sources are reachable".to_string(),
        ],
        origin: VerdictOrigin::Fallback,
    }
}
