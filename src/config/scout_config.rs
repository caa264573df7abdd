//! Scout Configuration - pipeline tuning, collaborator endpoints and scoring
//!
//! Every tuning constant in [`super::defaults`] is a field here. Each section
//! implements `Default` with the built-in values, so a missing or partial
//! `scout_config.toml` behaves exactly like the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "IDEA_SCOUT_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "scout_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an Idea Scout deployment.
///
/// Load with `ScoutConfig::load()` which searches:
/// 1. `$IDEA_SCOUT_CONFIG` env var
/// 2. `./scout_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Social search API (the rate-limited collaborator)
    #[serde(default)]
    pub social: SocialConfig,

    /// Web research API
    #[serde(default)]
    pub web: WebConfig,

    /// Planning and synthesis LLM endpoint
    #[serde(default)]
    pub llm: LlmConfig,

    /// Demand score weights and degraded values
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// WebSocket transport
    #[serde(default)]
    pub server: ServerConfig,
}

impl ScoutConfig {
    /// Load configuration using the standard search order:
    /// 1. `$IDEA_SCOUT_CONFIG` environment variable
    /// 2. `./scout_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded scout config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded scout config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.pipeline.per_call_timeout_ms == 0 {
            errors.push("pipeline.per_call_timeout_ms must be > 0".to_string());
        }
        if self.pipeline.max_idea_chars == 0 {
            errors.push("pipeline.max_idea_chars must be > 0".to_string());
        }
        if self.social.rate_interval_ms == 0 {
            errors.push("social.rate_interval_ms must be > 0".to_string());
        }
        if self.social.post_limit == 0 || self.social.user_limit == 0 {
            errors.push("social.post_limit and social.user_limit must be > 0".to_string());
        }
        if self.server.event_queue_capacity == 0 {
            errors.push("server.event_queue_capacity must be > 0".to_string());
        }
        if self.server.heartbeat_interval_secs == 0 {
            errors.push("server.heartbeat_interval_secs must be > 0".to_string());
        }

        let s = &self.scoring;
        for (name, w) in [
            ("volume_weight", s.volume_weight),
            ("engagement_weight", s.engagement_weight),
            ("pain_weight", s.pain_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                errors.push(format!("scoring.{name} must be within 0.0..=1.0 (got {w})"));
            }
        }
        let total = s.volume_weight + s.engagement_weight + s.pain_weight;
        if (total - 1.0).abs() > 0.01 {
            errors.push(format!("scoring weights must sum to 1.0 (got {total:.2})"));
        }
        if s.degraded_demand_score > 100 {
            errors.push("scoring.degraded_demand_score must be <= 100".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Serialize back to TOML (used by `idea-scout config`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({0}): {1}")]
    Io(String, std::io::Error),
    #[error("Config parse error ({0}): {1}")]
    Parse(String, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Engine-level limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Timeout for each fan-out call (ms)
    pub per_call_timeout_ms: u64,
    /// Longest accepted idea (characters)
    pub max_idea_chars: usize,
    /// Truncation length for error text in warning events
    pub error_preview_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            per_call_timeout_ms: defaults::PER_CALL_TIMEOUT_MS,
            max_idea_chars: defaults::MAX_IDEA_CHARS,
            error_preview_chars: defaults::ERROR_PREVIEW_CHARS,
        }
    }
}

impl PipelineConfig {
    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.per_call_timeout_ms)
    }
}

/// Social search API endpoint and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub base_url: String,
    /// Minimum spacing between requests (ms)
    pub rate_interval_ms: u64,
    pub post_limit: usize,
    pub user_limit: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitterapi.io/twitter".to_string(),
            rate_interval_ms: defaults::SOCIAL_RATE_INTERVAL_MS,
            post_limit: defaults::SOCIAL_POST_LIMIT,
            user_limit: defaults::SOCIAL_USER_LIMIT,
        }
    }
}

impl SocialConfig {
    pub fn rate_interval(&self) -> Duration {
        Duration::from_millis(self.rate_interval_ms)
    }
}

/// Web research API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub base_url: String,
    /// `basic` or `advanced`
    pub search_depth: String,
    pub max_results: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            search_depth: "advanced".to_string(),
            max_results: defaults::WEB_MAX_RESULTS,
        }
    }
}

/// OpenAI-compatible chat completion endpoint used for both LLM slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub planner_model: String,
    pub synthesis_model: String,
    pub temperature: f64,
    pub planner_max_tokens: usize,
    pub synthesis_max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            planner_model: "gpt-4o-mini".to_string(),
            synthesis_model: "gpt-4o".to_string(),
            temperature: defaults::LLM_TEMPERATURE,
            planner_max_tokens: defaults::PLANNER_MAX_TOKENS,
            synthesis_max_tokens: defaults::SYNTHESIS_MAX_TOKENS,
        }
    }
}

/// Demand score weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub volume_weight: f64,
    pub engagement_weight: f64,
    pub pain_weight: f64,
    /// Score reported when no demand data could be gathered
    pub degraded_demand_score: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            volume_weight: defaults::DEMAND_VOLUME_WEIGHT,
            engagement_weight: defaults::DEMAND_ENGAGEMENT_WEIGHT,
            pain_weight: defaults::DEMAND_PAIN_WEIGHT,
            degraded_demand_score: defaults::DEGRADED_DEMAND_SCORE,
        }
    }
}

/// WebSocket transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address, overridable with `IDEA_SCOUT_SERVER_ADDR` or `--addr`
    pub addr: String,
    pub heartbeat_interval_secs: u64,
    pub event_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
            heartbeat_interval_secs: defaults::HEARTBEAT_INTERVAL_SECS,
            event_queue_capacity: defaults::EVENT_QUEUE_CAPACITY,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
