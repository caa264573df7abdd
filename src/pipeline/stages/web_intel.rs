use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ScoutConfig;
use crate::pipeline::{RunContext, Stage, StageError};
use crate::scheduling::{dedup_by_key, failure_count, gather_all, successes, FanoutTask};
use crate::sources::WebResearch;
use crate::types::{RunState, StateField, StatePatch, WebIntel, WebSearchResponse};

/// Collects the web research prefetch started by the plan stage.
pub struct WebIntelStage;

#[async_trait]
impl Stage for WebIntelStage {
    fn name(&self) -> &'static str {
        "web_intel"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::WebIntel]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        if !ctx.web_prefetch_started() {
            debug!(run_id = %ctx.run_id(), "Web prefetch was not started by plan stage, starting now");
        }
        let intel = ctx.web_prefetch(&state.idea).join().await?;
        Ok(StatePatch {
            web_intel: Some(intel),
            ..Default::default()
        })
    }

    fn fallback(&self, _state: &RunState, _config: &ScoutConfig) -> StatePatch {
        StatePatch {
            web_intel: Some(WebIntel {
                note: Some("Web research unavailable".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

fn research_queries(idea: &str) -> [String; 3] {
    [
        format!("{idea} market size and growth"),
        format!("{idea} competitors and alternatives"),
        format!("{idea} startup funding and business model"),
    ]
}

/// Web research task run in the background for one idea.
///
/// Fails only when every search fails.
pub(crate) async fn research(
    web: Arc<dyn WebResearch>,
    idea: String,
    per_call_timeout: Duration,
) -> Result<WebIntel> {
    let queries = research_queries(&idea);
    let tasks: Vec<FanoutTask<'_, WebSearchResponse>> =
        queries.iter().map(|q| web.search(q).boxed()).collect();
    let envelopes = gather_all(tasks, per_call_timeout).await;

    let failed = failure_count(&envelopes);
    if failed == envelopes.len() {
        let first = envelopes
            .iter()
            .find_map(|e| e.error())
            .map(ToString::to_string)
            .unwrap_or_default();
        bail!("all {failed} web searches failed (first: {first})");
    }

    let responses = successes(envelopes);
    let answers: Vec<String> = responses
        .iter()
        .filter_map(|r| r.answer.clone())
        .collect();
    let sources = dedup_by_key(
        responses.into_iter().flat_map(|r| r.results),
        |r| r.url.clone(),
    );

    let digest = if answers.is_empty() {
        sources
            .iter()
            .take(3)
            .map(|s| format!("{}: {}", s.title, s.content))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        answers.join("\n\n")
    };

    debug!(sources = sources.len(), failed, "Web research finished");
    Ok(WebIntel {
        answers,
        digest,
        sources,
        failed_queries: failed,
        note: (failed > 0).then(|| format!("{failed} of 3 web searches failed")),
    })
}
