//! In-process collaborators for unit tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{RunContext, Services};
use crate::config::ScoutConfig;
use crate::events::MemorySink;
use crate::llm::LlmBackend;
use crate::scheduling::RateLimiter;
use crate::sources::{SearchSort, SocialSearch, WebResearch};
use crate::types::{Post, TrendTopic, UserProfile, WebResult, WebSearchResponse};

/// Replies in order; `None` is a call error. Repeats the last entry.
pub(crate) struct ScriptedLlm {
    replies: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedLlm {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
        }
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        let mut replies = self.replies.lock().map_err(|_| anyhow!("poisoned"))?;
        let reply = if replies.len() > 1 {
            replies.pop_front().flatten()
        } else {
            replies.front().cloned().flatten()
        };
        reply.ok_or_else(|| anyhow!("llm unavailable"))
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
pub(crate) struct StubSocial {
    pub posts: Vec<Post>,
    pub topics: Vec<TrendTopic>,
    pub users: Vec<UserProfile>,
    pub fail: bool,
}

#[async_trait]
impl SocialSearch for StubSocial {
    async fn search_posts(&self, _query: &str, _sort: SearchSort, limit: usize) -> Result<Vec<Post>> {
        if self.fail {
            return Err(anyhow!("social API returned 503"));
        }
        Ok(self.posts.iter().take(limit).cloned().collect())
    }

    async fn trending_topics(&self) -> Result<Vec<TrendTopic>> {
        if self.fail {
            return Err(anyhow!("social API returned 503"));
        }
        Ok(self.topics.clone())
    }

    async fn search_users(&self, _query: &str, limit: usize) -> Result<Vec<UserProfile>> {
        if self.fail {
            return Err(anyhow!("social API returned 503"));
        }
        Ok(self.users.iter().take(limit).cloned().collect())
    }
}

/// Same response for every query, or an error when `None`.
pub(crate) struct StubWeb(pub Option<WebSearchResponse>);

#[async_trait]
impl WebResearch for StubWeb {
    async fn search(&self, _query: &str) -> Result<WebSearchResponse> {
        self.0.clone().ok_or_else(|| anyhow!("web search unavailable"))
    }
}

pub(crate) fn post(id: &str, text: &str, likes: u64) -> Post {
    Post {
        id: id.to_string(),
        text: text.to_string(),
        author: format!("user_{id}"),
        likes,
        ..Default::default()
    }
}

pub(crate) fn profile(handle: &str, bio: &str, followers: u64) -> UserProfile {
    UserProfile {
        handle: handle.to_string(),
        name: handle.to_string(),
        bio: bio.to_string(),
        followers,
        url: None,
    }
}

pub(crate) fn healthy_social() -> StubSocial {
    StubSocial {
        posts: vec![
            post("1", "I wish there was an app that planned meals for my diabetes", 40),
            post("2", "Meal planning with diabetes is so hard to get right", 12),
            post("3", "Just raised our seed round for a nutrition startup", 8),
            post("4", "Love the new diabetes meal tracker, really helpful", 25),
        ],
        topics: vec![TrendTopic {
            name: "Diabetes awareness".into(),
            post_volume: Some(12_000),
        }],
        users: vec![
            profile("dietcoach", "Registered dietitian helping people with diabetes", 5_000),
            profile("seedvc", "Partner at Seed Ventures, health tech investor", 20_000),
        ],
        fail: false,
    }
}

pub(crate) fn healthy_web() -> StubWeb {
    StubWeb(Some(WebSearchResponse {
        answer: Some("The diabetic meal planning market is growing.".into()),
        results: vec![WebResult {
            url: "https://market.example/report".into(),
            title: "Market report".into(),
            content: "Growing segment".into(),
        }],
    }))
}

pub(crate) const VERDICT_JSON: &str = r#"{"score": 72, "recommendation": "build", "market_timing": "ripe",
"competition": "moderate", "headline": "Real pain, reachable buyers", "summary": "Strong demand signal.",
"strengths": ["clear pain"], "risks": ["regulation"], "next_steps": ["interview users"]}"#;

pub(crate) fn services(
    planner: ScriptedLlm,
    synthesizer: ScriptedLlm,
    social: StubSocial,
    web: StubWeb,
) -> Services {
    Services {
        planner: Arc::new(planner),
        synthesizer: Arc::new(synthesizer),
        social: Arc::new(social),
        web: Arc::new(web),
        limiter: Arc::new(RateLimiter::new(Duration::ZERO)),
    }
}

pub(crate) fn context_with(services: Services, sink: Arc<MemorySink>) -> RunContext {
    RunContext::new(services, Arc::new(ScoutConfig::default()), sink)
}

/// Every collaborator healthy.
pub(crate) fn test_context(sink: Arc<MemorySink>) -> RunContext {
    let planner = ScriptedLlm::new([Some(
        r#"{"description": "Meal planning for people with diabetes", "trend_scan": "diabetes meal planning"}"#,
    )]);
    let synthesizer = ScriptedLlm::new([Some(VERDICT_JSON)]);
    context_with(
        services(planner, synthesizer, healthy_social(), healthy_web()),
        sink,
    )
}
