//! Scout Configuration Module
//!
//! Configuration is loaded once at startup and handed to the components that
//! need it; nothing reads it through a global.
//!
//! ## Loading Order
//!
//! 1. `IDEA_SCOUT_CONFIG` environment variable (path to TOML file)
//! 2. `scout_config.toml` in the current working directory
//! 3. Built-in defaults from [`defaults`]
//!
//! API keys never live in the TOML file; they are read from the environment
//! (optionally via `.env`) by [`ApiKeys::from_env`].

mod scout_config;
pub mod defaults;

pub use scout_config::*;

/// Credentials for the external collaborators.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub social: Option<String>,
    pub web: Option<String>,
    pub llm: Option<String>,
}

impl ApiKeys {
    pub const SOCIAL_ENV: &'static str = "IDEA_SCOUT_SOCIAL_API_KEY";
    pub const WEB_ENV: &'static str = "IDEA_SCOUT_WEB_API_KEY";
    pub const LLM_ENV: &'static str = "IDEA_SCOUT_LLM_API_KEY";

    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            social: read(Self::SOCIAL_ENV),
            web: read(Self::WEB_ENV),
            llm: read(Self::LLM_ENV),
        }
    }

    /// Names of the variables that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.social.is_none() {
            missing.push(Self::SOCIAL_ENV);
        }
        if self.web.is_none() {
            missing.push(Self::WEB_ENV);
        }
        if self.llm.is_none() {
            missing.push(Self::LLM_ENV);
        }
        missing
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("social", &self.social.as_ref().map(|_| "***"))
            .field("web", &self.web.as_ref().map(|_| "***"))
            .field("llm", &self.llm.as_ref().map(|_| "***"))
            .finish()
    }
}
