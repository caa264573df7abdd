use async_trait::async_trait;

use crate::config::defaults::MAX_PROFILES_KEPT;
use crate::config::ScoutConfig;
use crate::pipeline::{RunContext, Stage, StageError};
use crate::signals;
use crate::sources::SearchSort;
use crate::types::{FunderData, QueryIntent, RunState, StateField, StatePatch};

use super::plan_for;

/// Investors active in the space and how much funding talk there is.
pub struct FundersStage;

#[async_trait]
impl Stage for FundersStage {
    fn name(&self) -> &'static str {
        "funders"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Funders]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        let plan = plan_for(state);
        let query = plan.query(QueryIntent::InvestorSearch);
        let social = &ctx.services.social;
        let limits = &ctx.config.social;

        let (users, posts) = futures::join!(
            ctx.social_single(social.search_users(query, limits.user_limit)),
            ctx.social_single(social.search_posts(query, SearchSort::Latest, limits.post_limit)),
        );

        if !users.succeeded() && !posts.succeeded() {
            let first = users.error().map(ToString::to_string).unwrap_or_default();
            return Err(StageError::AllCallsFailed { attempted: 2, first });
        }
        let note = (!users.succeeded() || !posts.succeeded())
            .then(|| "1 of 2 searches failed".to_string());

        let mut investors: Vec<_> = users
            .into_value()
            .unwrap_or_default()
            .into_iter()
            .filter(signals::is_investor_profile)
            .collect();
        investors.sort_by(|a, b| b.followers.cmp(&a.followers));
        investors.truncate(MAX_PROFILES_KEPT);

        let funding_post_count = posts
            .into_value()
            .unwrap_or_default()
            .iter()
            .filter(|p| signals::is_funding_post(&p.text))
            .count();

        Ok(StatePatch {
            funders: Some(FunderData {
                investors,
                funding_post_count,
                note,
            }),
            ..Default::default()
        })
    }

    fn fallback(&self, _state: &RunState, _config: &ScoutConfig) -> StatePatch {
        StatePatch {
            funders: Some(FunderData {
                note: Some("Investor search unavailable".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use crate::pipeline::testing::*;
    use crate::types::RunInput;
    use std::sync::Arc;

    #[tokio::test]
    async fn keeps_investor_profiles_and_counts_funding_posts() {
        let ctx = context_with(
            services(
                ScriptedLlm::new([None::<&str>]),
                ScriptedLlm::new([None::<&str>]),
                healthy_social(),
                healthy_web(),
            ),
            Arc::new(MemorySink::new()),
        );
        let state = RunState::new("r", RunInput::new("diabetes meal planner"));

        let funders = FundersStage.run(&state, &ctx).await.unwrap().funders.unwrap();
        assert_eq!(funders.investors.len(), 1);
        assert_eq!(funders.investors[0].handle, "seedvc");
        assert_eq!(funders.funding_post_count, 1);
        assert_eq!(funders.note, None);
    }
}
