use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::ScoutConfig;
use crate::llm::{extract_json, prompts, Extraction};
use crate::pipeline::{RunContext, Stage, StageError};
use crate::types::{ProgressEvent, QueryPlan, RunState, StateField, StatePatch};

/// Turns the idea into a description and a query plan.
///
/// Kicks off the web research prefetch before waiting on the planner so
/// the slow web calls overlap with the rest of the chain.
pub struct PlanStage;

#[async_trait]
impl Stage for PlanStage {
    fn name(&self) -> &'static str {
        "plan"
    }

    fn writes(&self) -> &'static [StateField] {
        &[StateField::Description, StateField::QueryPlan]
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        ctx.web_prefetch(&state.idea);

        let user = prompts::planner_user_prompt(&state.idea, state.context.as_deref());
        let reply = ctx
            .services
            .planner
            .complete(prompts::PLANNER_SYSTEM_PROMPT, &user)
            .await
            .map_err(|e| StageError::Llm(format!("{e:#}")))?;

        let (description, plan) = match extract_json::<HashMap<String, Value>>(&reply) {
            Extraction::Parsed(object) => {
                let fields: HashMap<String, String> = object
                    .into_iter()
                    .filter_map(|(key, value)| match value {
                        Value::String(s) => Some((key, s)),
                        _ => None,
                    })
                    .collect();
                let description = fields
                    .get("description")
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| default_description(state));
                (description, QueryPlan::from_planner(&fields, &state.idea))
            }
            Extraction::Unparsed(_) => {
                info!(run_id = %ctx.run_id(), "Planner reply had no JSON object, using template plan");
                ctx.emit(ProgressEvent::info(
                    "Planner reply could not be parsed; using template queries",
                ));
                (default_description(state), QueryPlan::template(&state.idea))
            }
        };

        debug!(run_id = %ctx.run_id(), source = ?plan.source, "Query plan ready");
        ctx.emit(ProgressEvent::plan(&plan));

        Ok(StatePatch {
            description: Some(description),
            query_plan: Some(plan),
            ..Default::default()
        })
    }

    fn fallback(&self, state: &RunState, _config: &ScoutConfig) -> StatePatch {
        StatePatch {
            description: Some(default_description(state)),
            query_plan: Some(QueryPlan::template(&state.idea)),
            ..Default::default()
        }
    }
}

/// Caller context when given, otherwise the idea itself.
fn default_description(state: &RunState) -> String {
    state.context.clone().unwrap_or_else(|| state.idea.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use crate::pipeline::testing::*;
    use crate::types::{EventKind, PlanSource, QueryIntent, RunInput};
    use std::sync::Arc;

    fn ctx_with_planner(reply: Option<&str>, sink: Arc<MemorySink>) -> RunContext {
        context_with(
            services(
                ScriptedLlm::new([reply]),
                ScriptedLlm::new([Some(VERDICT_JSON)]),
                healthy_social(),
                healthy_web(),
            ),
            sink,
        )
    }

    #[tokio::test]
    async fn planner_queries_override_template_and_gaps_are_filled() {
        let sink = Arc::new(MemorySink::new());
        let ctx = ctx_with_planner(
            Some(r#"{"description": "Diabetic meal plans", "pain_signal": "diabetes meal planning is hard", "score": 3}"#),
            sink.clone(),
        );
        let state = RunState::new("r", RunInput::new("AI meal planner for diabetics"));

        let patch = PlanStage.run(&state, &ctx).await.unwrap();
        let plan = patch.query_plan.unwrap();

        assert_eq!(patch.description.as_deref(), Some("Diabetic meal plans"));
        assert_eq!(plan.source, PlanSource::Llm);
        assert_eq!(plan.query(QueryIntent::PainSignal), "diabetes meal planning is hard");
        let template = QueryPlan::template(&state.idea);
        assert_eq!(
            plan.query(QueryIntent::TrendScan),
            template.query(QueryIntent::TrendScan)
        );
        assert!(ctx.web_prefetch_started());
        assert!(sink.kinds().contains(&EventKind::Plan));
    }

    #[tokio::test]
    async fn prose_reply_yields_template_plan() {
        let sink = Arc::new(MemorySink::new());
        let ctx = ctx_with_planner(Some("I'd search for meal planners."), sink.clone());
        let state = RunState::new(
            "r",
            RunInput::new("AI meal planner for diabetics").with_context("for clinics"),
        );

        let patch = PlanStage.run(&state, &ctx).await.unwrap();
        assert_eq!(patch.query_plan, Some(QueryPlan::template(&state.idea)));
        assert_eq!(patch.description.as_deref(), Some("for clinics"));
        assert!(sink.kinds().contains(&EventKind::Info));
    }

    #[tokio::test]
    async fn planner_error_is_a_stage_error_but_prefetch_still_started() {
        let ctx = ctx_with_planner(None, Arc::new(MemorySink::new()));
        let state = RunState::new("r", RunInput::new("habit tracker"));

        assert!(matches!(
            PlanStage.run(&state, &ctx).await,
            Err(StageError::Llm(_))
        ));
        assert!(ctx.web_prefetch_started());

        let fallback = PlanStage.fallback(&state, &ctx.config);
        assert_eq!(fallback.fields(), vec![StateField::Description, StateField::QueryPlan]);
    }
}
