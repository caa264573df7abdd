use async_trait::async_trait;

use crate::config::ScoutConfig;
use crate::pipeline::{RunContext, Stage, StageError};
use crate::scheduling::Envelope;
use crate::signals;
use crate::sources::SearchSort;
use crate::types::{Momentum, Post, QueryIntent, RunState, StateField, StatePatch, TrendData};

use super::plan_for;

/// Trending topics that match the idea, plus a volume scan.
pub struct TrendsStage;

#[async_trait]
impl Stage for TrendsStage {
    fn name(&self) -> &'static str {
        "trends"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Trends]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        let plan = plan_for(state);
        let social = &ctx.services.social;

        let (topics, scan) = futures::join!(
            ctx.social_single(social.trending_topics()),
            ctx.social_single(social.search_posts(
                plan.query(QueryIntent::TrendScan),
                SearchSort::Top,
                ctx.config.social.post_limit,
            )),
        );

        if !topics.succeeded() && !scan.succeeded() {
            let first = topics.error().map(ToString::to_string).unwrap_or_default();
            return Err(StageError::AllCallsFailed { attempted: 2, first });
        }

        let keywords = signals::keywords(&state.idea);
        let note = match (&topics, &scan) {
            (Envelope::Failed(_), _) => Some("Trending topics unavailable".to_string()),
            (_, Envelope::Failed(_)) => Some("Trend scan search unavailable".to_string()),
            _ => None,
        };
        let matching_topics: Vec<_> = topics
            .into_value()
            .unwrap_or_default()
            .into_iter()
            .filter(|t| signals::mentions_any(&t.name, &keywords))
            .collect();
        let posts = scan.into_value().unwrap_or_default();

        let trends = TrendData {
            momentum: Momentum::classify(matching_topics.len(), posts.len()),
            scan_post_count: posts.len(),
            scan_engagement: posts.iter().map(Post::engagement).fold(0, u64::saturating_add),
            matching_topics,
            note,
        };

        Ok(StatePatch {
            trends: Some(trends),
            ..Default::default()
        })
    }

    fn fallback(&self, _state: &RunState, _config: &ScoutConfig) -> StatePatch {
        StatePatch {
            trends: Some(TrendData {
                note: Some("Trend data unavailable".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
