use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::defaults::MAX_SAMPLE_POSTS;
use crate::config::ScoutConfig;
use crate::pipeline::{RunContext, Stage, StageError};
use crate::scheduling::{failure_count, Envelope};
use crate::sources::SearchSort;
use crate::types::{CommunityData, Post, QueryIntent, RunState, StateField, StatePatch};

use super::{partial_note, plan_for, top_by_engagement};

const MAX_ACTIVE_VOICES: usize = 5;

/// Where the conversation happens and who else is already selling.
pub struct CommunityStage;

#[async_trait]
impl Stage for CommunityStage {
    fn name(&self) -> &'static str {
        "community"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Community]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        let plan = plan_for(state);
        let social = &ctx.services.social;
        let limit = ctx.config.social.post_limit;

        let envelopes = ctx
            .social_fanout(vec![
                social.search_posts(
                    plan.query(QueryIntent::CommunityQuery),
                    SearchSort::Latest,
                    limit,
                ),
                social.search_posts(
                    plan.query(QueryIntent::CompetitorSearch),
                    SearchSort::Top,
                    limit,
                ),
            ])
            .await;

        if let Some(err) = StageError::if_all_failed(&envelopes) {
            return Err(err);
        }
        let note = partial_note(failure_count(&envelopes), envelopes.len());

        let mut envelopes = envelopes.into_iter().map(Envelope::into_value);
        let discussion = envelopes.next().flatten().unwrap_or_default();
        let competitors = envelopes.next().flatten().unwrap_or_default();

        let community = CommunityData {
            discussion_count: discussion.len(),
            competitor_post_count: competitors.len(),
            active_voices: active_voices(&discussion),
            sample_posts: top_by_engagement(&discussion, MAX_SAMPLE_POSTS),
            note,
        };

        Ok(StatePatch {
            community: Some(community),
            ..Default::default()
        })
    }

    fn fallback(&self, _state: &RunState, _config: &ScoutConfig) -> StatePatch {
        StatePatch {
            community: Some(CommunityData {
                note: Some("Community data unavailable".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Authors ranked by summed engagement; ties keep first-seen order.
fn active_voices(posts: &[Post]) -> Vec<String> {
    let mut order = Vec::new();
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for post in posts {
        let entry = totals.entry(post.author.as_str()).or_insert_with(|| {
            order.push(post.author.as_str());
            0
        });
        *entry = entry.saturating_add(post.engagement());
    }
    order.sort_by(|a, b| totals[b].cmp(&totals[a]));
    order
        .into_iter()
        .take(MAX_ACTIVE_VOICES)
        .map(|a| format!("@{a}"))
        .collect()
}
