//! In-process collaborators shared by the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use idea_scout::llm::LlmBackend;
use idea_scout::scheduling::RateLimiter;
use idea_scout::sources::{SearchSort, SocialSearch, WebResearch};
use idea_scout::types::{Post, TrendTopic, UserProfile, WebResult, WebSearchResponse};
use idea_scout::{MemorySink, RunContext, ScoutConfig, Services};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const VERDICT_JSON: &str = r#"Here is my assessment:
{"score": 68, "recommendation": "build", "market_timing": "emerging", "competition": "low",
 "headline": "Clear pain with few direct competitors", "summary": "People ask for this weekly.",
 "target_audience": "Newly diagnosed type 2 diabetics", "strengths": ["pain"], "risks": ["retention"],
 "next_steps": ["landing page test"]}"#;

pub const PLAN_JSON: &str = r#"{"description": "Meal plans for diabetics", "trend_scan": "diabetes diet",
 "recent_demand": "diabetic meal planner app", "pain_signal": "diabetes meal planning hard"}"#;

/// LLM returning a fixed reply, or failing when `None`.
pub struct FixedLlm(pub Option<&'static str>);

#[async_trait]
impl LlmBackend for FixedLlm {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| anyhow!("LLM endpoint unreachable"))
    }

    fn backend_name(&self) -> &'static str {
        "fixed"
    }
}

/// Social API stub recording the instant of every call.
#[derive(Default)]
pub struct RecordingSocial {
    pub fail: bool,
    pub calls: Mutex<Vec<Instant>>,
    /// Cancelled on the first call when set
    pub cancel_on_call: Option<CancellationToken>,
}

impl RecordingSocial {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn record(&self) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Instant::now());
        }
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        if self.fail {
            Err(anyhow!("social API returned 429"))
        } else {
            Ok(())
        }
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn post(id: &str, text: &str, likes: u64) -> Post {
    Post {
        id: id.into(),
        text: text.into(),
        author: format!("author{id}"),
        likes,
        ..Default::default()
    }
}

#[async_trait]
impl SocialSearch for RecordingSocial {
    async fn search_posts(&self, _query: &str, _sort: SearchSort, _limit: usize) -> Result<Vec<Post>> {
        self.record()?;
        Ok(vec![
            post("1", "I wish there was an app for diabetic meal planning", 30),
            post("2", "Tired of counting carbs by hand every meal", 14),
            post("3", "Our startup raised a seed round for diabetes care", 6),
        ])
    }

    async fn trending_topics(&self) -> Result<Vec<TrendTopic>> {
        self.record()?;
        Ok(vec![TrendTopic {
            name: "Diabetic recipes".into(),
            post_volume: Some(4_000),
        }])
    }

    async fn search_users(&self, _query: &str, _limit: usize) -> Result<Vec<UserProfile>> {
        self.record()?;
        Ok(vec![
            UserProfile {
                handle: "carbcounter".into(),
                bio: "Type 1 since 2009, sharing meal ideas".into(),
                followers: 3_200,
                ..Default::default()
            },
            UserProfile {
                handle: "healthvc".into(),
                bio: "Partner at Health Ventures".into(),
                followers: 9_000,
                ..Default::default()
            },
        ])
    }
}

/// Web stub answering each query from `pages`, keyed by substring.
pub struct PagedWeb {
    pub pages: Vec<(&'static str, Vec<&'static str>)>,
    pub fail: bool,
}

impl PagedWeb {
    pub fn single(urls: Vec<&'static str>) -> Self {
        Self {
            pages: vec![("", urls)],
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            pages: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl WebResearch for PagedWeb {
    async fn search(&self, query: &str) -> Result<WebSearchResponse> {
        if self.fail {
            return Err(anyhow!("web search quota exhausted"));
        }
        let urls = self
            .pages
            .iter()
            .find(|(needle, _)| query.contains(needle))
            .map(|(_, urls)| urls.clone())
            .unwrap_or_default();
        Ok(WebSearchResponse {
            answer: Some(format!("answer for {query}")),
            results: urls
                .into_iter()
                .map(|url| WebResult {
                    url: url.into(),
                    title: url.into(),
                    content: "content".into(),
                })
                .collect(),
        })
    }
}

pub fn services(
    planner: FixedLlm,
    synthesizer: FixedLlm,
    social: Arc<RecordingSocial>,
    web: PagedWeb,
    interval: Duration,
) -> Services {
    Services {
        planner: Arc::new(planner),
        synthesizer: Arc::new(synthesizer),
        social,
        web: Arc::new(web),
        limiter: Arc::new(RateLimiter::new(interval)),
    }
}

pub fn healthy_services() -> Services {
    services(
        FixedLlm(Some(PLAN_JSON)),
        FixedLlm(Some(VERDICT_JSON)),
        Arc::new(RecordingSocial::default()),
        PagedWeb::single(vec!["https://a.example", "https://b.example"]),
        Duration::ZERO,
    )
}

pub fn context(services: Services) -> (RunContext, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let ctx = RunContext::new(services, Arc::new(ScoutConfig::default()), sink.clone());
    (ctx, sink)
}
