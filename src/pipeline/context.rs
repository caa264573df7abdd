//! Collaborators and per-run context handed to every stage

use anyhow::{Context as _, Result};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

use crate::config::{ApiKeys, ScoutConfig};
use crate::events::EventSink;
use crate::llm::{LlmBackend, OpenAiCompatClient};
use crate::scheduling::{
    gather_all_paced, gather_one_paced, Envelope, FanoutTask, PrefetchHandle, RateLimiter,
};
use crate::sources::{SocialApiClient, SocialSearch, TavilyClient, WebResearch};
use crate::types::{ProgressEvent, WebIntel};

use super::stages::web_intel::research;

/// External collaborators, shared across runs.
#[derive(Clone)]
pub struct Services {
    pub planner: Arc<dyn LlmBackend>,
    pub synthesizer: Arc<dyn LlmBackend>,
    pub social: Arc<dyn SocialSearch>,
    pub web: Arc<dyn WebResearch>,
    /// Paces every social API call, across all concurrent runs
    pub limiter: Arc<RateLimiter>,
}

impl Services {
    /// Wire the HTTP clients described by `config`.
    pub fn from_config(config: &ScoutConfig, keys: &ApiKeys) -> Result<Self> {
        let llm = &config.llm;
        let planner = OpenAiCompatClient::new(
            &llm.base_url,
            keys.llm.clone(),
            &llm.planner_model,
            llm.temperature,
            llm.planner_max_tokens,
        )
        .context("building planner client")?;
        let synthesizer = OpenAiCompatClient::new(
            &llm.base_url,
            keys.llm.clone(),
            &llm.synthesis_model,
            llm.temperature,
            llm.synthesis_max_tokens,
        )
        .context("building synthesis client")?;
        let social = SocialApiClient::new(&config.social.base_url, keys.social.clone())
            .context("building social client")?;
        let web = TavilyClient::new(&config.web, keys.web.clone()).context("building web client")?;

        Ok(Self {
            planner: Arc::new(planner),
            synthesizer: Arc::new(synthesizer),
            social: Arc::new(social),
            web: Arc::new(web),
            limiter: Arc::new(RateLimiter::new(config.social.rate_interval())),
        })
    }
}

/// Everything a stage needs besides the run state. One per run.
pub struct RunContext {
    run_id: String,
    pub services: Services,
    pub config: Arc<ScoutConfig>,
    pub sink: Arc<dyn EventSink>,
    pub cancel: CancellationToken,
    web_prefetch: OnceLock<PrefetchHandle<WebIntel>>,
}

impl RunContext {
    pub fn new(services: Services, config: Arc<ScoutConfig>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            services,
            config,
            sink,
            cancel: CancellationToken::new(),
            web_prefetch: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.sink.emit(event);
    }

    /// Social API calls fanned out under the shared rate limiter.
    ///
    /// The per-call timeout starts when a call is released by the limiter.
    pub async fn social_fanout<T>(&self, calls: Vec<FanoutTask<'_, T>>) -> Vec<Envelope<T>> {
        gather_all_paced(
            calls,
            &self.services.limiter,
            self.config.pipeline.per_call_timeout(),
        )
        .await
    }

    /// One social API call under the shared rate limiter.
    pub async fn social_single<T>(&self, call: FanoutTask<'_, T>) -> Envelope<T> {
        gather_one_paced(
            call,
            &self.services.limiter,
            self.config.pipeline.per_call_timeout(),
        )
        .await
    }

    /// Web research prefetch for `idea`, started on first use.
    ///
    /// Later calls return the same handle regardless of `idea`.
    pub fn web_prefetch(&self, idea: &str) -> &PrefetchHandle<WebIntel> {
        self.web_prefetch.get_or_init(|| {
            tracing::debug!(run_id = %self.run_id, "Starting web research prefetch");
            PrefetchHandle::start(research(
                Arc::clone(&self.services.web),
                idea.to_string(),
                self.config.pipeline.per_call_timeout(),
            ))
        })
    }

    pub fn web_prefetch_started(&self) -> bool {
        self.web_prefetch.get().is_some()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("web_prefetch_started", &self.web_prefetch_started())
            .finish_non_exhaustive()
    }
}
