use async_trait::async_trait;

use crate::config::defaults::MAX_PROFILES_KEPT;
use crate::config::ScoutConfig;
use crate::pipeline::{RunContext, Stage, StageError};
use crate::scheduling::dedup_by_key;
use crate::signals;
use crate::types::{AdopterData, QueryIntent, RunState, StateField, StatePatch};

use super::plan_for;

/// Accounts likely to try the product first.
pub struct AdoptersStage;

#[async_trait]
impl Stage for AdoptersStage {
    fn name(&self) -> &'static str {
        "adopters"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Adopters]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        let plan = plan_for(state);
        let social = &ctx.services.social;

        let envelopes = ctx
            .social_fanout(vec![social.search_users(
                plan.query(QueryIntent::AdopterSearch),
                ctx.config.social.user_limit,
            )])
            .await;
        if let Some(err) = StageError::if_all_failed(&envelopes) {
            return Err(err);
        }

        let mut profiles: Vec<_> = dedup_by_key(
            envelopes.into_iter().filter_map(|e| e.into_value()).flatten(),
            |p| p.handle.to_lowercase(),
        )
        .into_iter()
        .filter(|p| !signals::is_investor_profile(p))
        .collect();
        profiles.sort_by(|a, b| b.followers.cmp(&a.followers));
        profiles.truncate(MAX_PROFILES_KEPT);

        let adopters = AdopterData {
            total_reach: profiles.iter().map(|p| p.followers).fold(0, u64::saturating_add),
            note: profiles
                .is_empty()
                .then(|| "No matching accounts found".to_string()),
            profiles,
        };

        Ok(StatePatch {
            adopters: Some(adopters),
            ..Default::default()
        })
    }

    fn fallback(&self, _state: &RunState, _config: &ScoutConfig) -> StatePatch {
        StatePatch {
            adopters: Some(AdopterData {
                note: Some("Adopter search unavailable".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
