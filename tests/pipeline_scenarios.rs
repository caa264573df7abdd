//! Pipeline Scenario Tests
//!
//! Drives the full eight-stage chain through the public API with in-process
//! collaborators: healthy runs, total outage, unparsable planner output,
//! overlapping web results, and stage failures in every combination.

mod common;

use async_trait::async_trait;
use common::*;
use idea_scout::config::defaults::DEGRADED_DEMAND_SCORE;
use idea_scout::pipeline::stages::standard_stages;
use idea_scout::types::{EventKind, PlanSource, StateField};
use idea_scout::{
    PipelineEngine, PipelineError, QueryPlan, Recommendation, RunContext, RunInput, RunState,
    ScoutConfig, Stage, StageError, StatePatch, VerdictOrigin,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const IDEA: &str = "AI meal planner for diabetics";

fn all_slots_ready(state: &RunState) -> bool {
    state.description.is_ready()
        && state.query_plan.is_ready()
        && state.trends.is_ready()
        && state.demand.is_ready()
        && state.adopters.is_ready()
        && state.funders.is_ready()
        && state.community.is_ready()
        && state.web_intel.is_ready()
        && state.verdict.is_ready()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn scenario_a_all_collaborators_succeed() {
    let (ctx, sink) = context(healthy_services());
    let state = assert_ok!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);

    assert!(all_slots_ready(&state));
    let verdict = state.verdict.get().unwrap();
    assert!(verdict.score <= 100);
    assert_eq!(verdict.score, 68);
    assert_eq!(verdict.recommendation, Recommendation::Build);
    assert_eq!(verdict.origin, VerdictOrigin::Synthesis);
    assert_eq!(state.query_plan.get().unwrap().source, PlanSource::Llm);
    assert!(!sink.kinds().contains(&EventKind::Warning));
}

#[tokio::test]
async fn scenario_b_every_external_call_fails() {
    let services = services(
        FixedLlm(None),
        FixedLlm(None),
        Arc::new(RecordingSocial::failing()),
        PagedWeb::failing(),
        Duration::ZERO,
    );
    let (ctx, sink) = context(services);
    let state = assert_ok!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);

    assert!(all_slots_ready(&state));
    let verdict = state.verdict.get().unwrap();
    assert_eq!(verdict.score, DEGRADED_DEMAND_SCORE);
    assert_eq!(verdict.recommendation, Recommendation::Explore);
    assert_eq!(verdict.origin, VerdictOrigin::Fallback);

    let degraded: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.kind == EventKind::Warning && e.stage().is_some())
        .filter_map(|e| e.stage().map(str::to_string))
        .collect();
    assert_eq!(
        degraded,
        vec!["plan", "trends", "demand", "adopters", "funders", "community", "web_intel"]
    );
    assert_eq!(sink.kinds().last(), Some(&EventKind::TerminalResult));
}

#[tokio::test]
async fn scenario_c_prose_plan_falls_back_to_template() {
    let services = services(
        FixedLlm(Some("Great idea! I would look at diabetes forums first.")),
        FixedLlm(Some(VERDICT_JSON)),
        Arc::new(RecordingSocial::default()),
        PagedWeb::single(vec!["https://a.example"]),
        Duration::ZERO,
    );
    let (ctx, sink) = context(services);
    let state = assert_ok!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);

    assert_eq!(state.query_plan.get(), Some(&QueryPlan::template(IDEA)));
    assert!(sink.kinds().contains(&EventKind::Plan));
    assert!(!sink.kinds().contains(&EventKind::Warning));
}

#[tokio::test]
async fn scenario_d_overlapping_web_results_are_deduplicated() {
    let web = PagedWeb {
        pages: vec![
            ("market size", vec!["https://a.example", "https://b.example"]),
            ("competitors", vec!["https://b.example", "https://c.example"]),
            ("funding", vec!["https://a.example", "https://c.example", "https://d.example"]),
        ],
        fail: false,
    };
    let services = services(
        FixedLlm(Some(PLAN_JSON)),
        FixedLlm(Some(VERDICT_JSON)),
        Arc::new(RecordingSocial::default()),
        web,
        Duration::ZERO,
    );
    let (ctx, _sink) = context(services);
    let state = assert_ok!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);

    let intel = state.web_intel.get().unwrap();
    let urls: Vec<_> = intel.sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://a.example", "https://b.example", "https://c.example", "https://d.example"]
    );
    assert_eq!(intel.answers.len(), 3);
}

// ============================================================================
// Liveness under stage failures
// ============================================================================

/// Wraps a real stage and fails it on demand, by error or by panic.
struct Sabotaged {
    inner: Box<dyn Stage>,
    fail: bool,
    panic: bool,
}

#[async_trait]
impl Stage for Sabotaged {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn writes(&self) -> &'static [StateField] {
        self.inner.writes()
    }

    async fn run(&self, state: &RunState, ctx: &RunContext) -> Result<StatePatch, StageError> {
        if self.fail {
            if self.panic {
                panic!("sabotaged {}", self.inner.name());
            }
            return Err(StageError::Llm(format!("sabotaged {}", self.inner.name())));
        }
        self.inner.run(state, ctx).await
    }

    fn fallback(&self, state: &RunState, config: &ScoutConfig) -> StatePatch {
        self.inner.fallback(state, config)
    }
}

fn sabotaged_engine(mask: u32) -> PipelineEngine {
    let stages = standard_stages()
        .into_iter()
        .enumerate()
        .map(|(i, inner)| {
            Box::new(Sabotaged {
                inner,
                fail: mask & (1 << i) != 0,
                panic: i % 2 == 1,
            }) as Box<dyn Stage>
        })
        .collect();
    PipelineEngine::new(stages)
}

#[tokio::test]
async fn every_subset_of_failing_stages_still_yields_a_verdict() {
    for mask in 0u32..(1 << 8) {
        let (ctx, sink) = context(healthy_services());
        let state = sabotaged_engine(mask)
            .run(RunInput::new(IDEA), &ctx)
            .await
            .unwrap_or_else(|e| panic!("mask {mask:08b} failed: {e}"));

        assert!(all_slots_ready(&state), "mask {mask:08b} left a slot absent");
        let warnings = sink
            .kinds()
            .into_iter()
            .filter(|k| *k == EventKind::Warning)
            .count();
        assert_eq!(warnings as u32, mask.count_ones(), "mask {mask:08b}");
        assert_eq!(sink.kinds().last(), Some(&EventKind::TerminalResult));
    }
}

// ============================================================================
// Pacing, ordering, cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn social_calls_are_spaced_by_the_rate_interval() {
    let interval = Duration::from_millis(5_600);
    let social = Arc::new(RecordingSocial::default());
    let services = services(
        FixedLlm(Some(PLAN_JSON)),
        FixedLlm(Some(VERDICT_JSON)),
        Arc::clone(&social),
        PagedWeb::single(vec!["https://a.example"]),
        interval,
    );
    let (ctx, sink) = context(services);
    assert_ok!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);

    let mut calls = social.call_times();
    calls.sort();
    assert_eq!(calls.len(), 10);
    for pair in calls.windows(2) {
        assert!(pair[1] - pair[0] >= interval);
    }
    assert!(!sink.kinds().contains(&EventKind::Warning));
}

#[tokio::test]
async fn events_follow_stage_order() {
    let (ctx, sink) = context(healthy_services());
    assert_ok!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);

    let events = sink.events();
    let stage_events: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::StageStart | EventKind::StageComplete))
        .map(|e| (e.kind, e.stage().unwrap_or_default().to_string()))
        .collect();
    let expected: Vec<_> = PipelineEngine::standard()
        .stage_names()
        .into_iter()
        .flat_map(|s| {
            [
                (EventKind::StageStart, s.to_string()),
                (EventKind::StageComplete, s.to_string()),
            ]
        })
        .collect();
    assert_eq!(stage_events, expected);

    let plan_at = events.iter().position(|e| e.kind == EventKind::Plan).unwrap();
    assert_eq!(events[plan_at - 1].kind, EventKind::StageStart);
    assert_eq!(events[plan_at - 1].stage(), Some("plan"));
    assert_eq!(events.last().map(|e| e.kind), Some(EventKind::TerminalResult));
}

#[tokio::test]
async fn cancellation_lets_the_current_stage_finish_then_stops() {
    let cancel = tokio_util::sync::CancellationToken::new();
    let social = Arc::new(RecordingSocial {
        cancel_on_call: Some(cancel.clone()),
        ..Default::default()
    });
    let services = services(
        FixedLlm(Some(PLAN_JSON)),
        FixedLlm(Some(VERDICT_JSON)),
        social,
        PagedWeb::single(vec![]),
        Duration::ZERO,
    );
    let (ctx, sink) = context(services);
    let ctx = ctx.with_cancel(cancel);

    let err = assert_err!(PipelineEngine::standard().run(RunInput::new(IDEA), &ctx).await);
    assert_eq!(err, PipelineError::Cancelled);

    let started: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.kind == EventKind::StageStart)
        .filter_map(|e| e.stage().map(str::to_string))
        .collect();
    assert_eq!(started, vec!["plan", "trends"]);
    assert!(!sink.kinds().contains(&EventKind::TerminalResult));
}

#[tokio::test]
async fn context_is_carried_into_the_description_when_planner_is_down() {
    let services = services(
        FixedLlm(None),
        FixedLlm(Some(VERDICT_JSON)),
        Arc::new(RecordingSocial::default()),
        PagedWeb::single(vec!["https://a.example"]),
        Duration::ZERO,
    );
    let (ctx, _sink) = context(services);
    let state = assert_ok!(
        PipelineEngine::standard()
            .run(RunInput::new(IDEA).with_context("Sold to endocrinology clinics"), &ctx)
            .await
    );

    assert_eq!(
        state.description.get().map(String::as_str),
        Some("Sold to endocrinology clinics")
    );
    assert_eq!(state.query_plan.get(), Some(&QueryPlan::template(IDEA)));
}
