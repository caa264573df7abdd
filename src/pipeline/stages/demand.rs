use async_trait::async_trait;
use tracing::debug;

use crate::config::defaults::MAX_SAMPLE_POSTS;
use crate::config::ScoutConfig;
use crate::pipeline::{RunContext, Stage, StageError};
use crate::scheduling::{dedup_by_key, failure_count, flatten_successes};
use crate::signals;
use crate::sources::SearchSort;
use crate::types::{DemandData, Post, QueryIntent, RunState, StateField, StatePatch};

use super::{partial_note, plan_for, top_by_engagement};

const PAIN_QUOTE_CHARS: usize = 200;

/// Measures how loudly people ask for the idea.
pub struct DemandStage;

#[async_trait]
impl Stage for DemandStage {
    fn name(&self) -> &'static str {
        "demand"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Demand]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        let plan = plan_for(state);
        let social = &ctx.services.social;
        let limit = ctx.config.social.post_limit;

        let searches = [
            (QueryIntent::RecentDemand, SearchSort::Latest),
            (QueryIntent::TopDemand, SearchSort::Top),
            (QueryIntent::PainSignal, SearchSort::Latest),
        ];
        let tasks = searches
            .iter()
            .map(|(intent, sort)| social.search_posts(plan.query(*intent), *sort, limit))
            .collect();
        let envelopes = ctx.social_fanout(tasks).await;

        if let Some(err) = StageError::if_all_failed(&envelopes) {
            return Err(err);
        }
        let failed = failure_count(&envelopes);
        let posts = dedup_by_key(flatten_successes(envelopes), |p| p.id.clone());

        let total_engagement = posts
            .iter()
            .map(Post::engagement)
            .fold(0, u64::saturating_add);
        let pain_posts: Vec<_> = posts
            .iter()
            .filter(|p| signals::is_pain_signal(&p.text))
            .collect();
        let demand_score = signals::demand_score(
            posts.len(),
            total_engagement,
            pain_posts.len(),
            &ctx.config.scoring,
        );
        debug!(
            run_id = %ctx.run_id(),
            posts = posts.len(),
            pain = pain_posts.len(),
            demand_score,
            "Demand measured"
        );

        let demand = DemandData {
            post_count: posts.len(),
            total_engagement,
            pain_post_count: pain_posts.len(),
            sentiment: signals::sentiment_breakdown(posts.iter().map(|p| p.text.as_str())),
            demand_score,
            pain_quotes: pain_posts
                .iter()
                .take(MAX_SAMPLE_POSTS)
                .map(|p| p.text.chars().take(PAIN_QUOTE_CHARS).collect())
                .collect(),
            sample_posts: top_by_engagement(&posts, MAX_SAMPLE_POSTS),
            failed_queries: failed,
            note: partial_note(failed, searches.len()),
        };

        Ok(StatePatch {
            demand: Some(demand),
            ..Default::default()
        })
    }

    fn fallback(&self, _state: &RunState, config: &ScoutConfig) -> StatePatch {
        StatePatch {
            demand: Some(DemandData {
                demand_score: config.scoring.degraded_demand_score,
                failed_queries: 3,
                note: Some("Demand signal unavailable; score is a neutral estimate".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
