//! System-wide default constants.
//!
//! Centralises the tuning numbers of the research pipeline. Every value here
//! is the built-in default of a `ScoutConfig` field and can be overridden
//! from `scout_config.toml`. Grouped by subsystem for easy discovery.

// ============================================================================
// Pipeline
// ============================================================================

/// Upper bound on a single fan-out call, including any rate-limiter wait (ms).
pub const PER_CALL_TIMEOUT_MS: u64 = 25_000;

/// Longest accepted idea text (characters, after trimming).
pub const MAX_IDEA_CHARS: usize = 500;

/// Error descriptions in warning events are cut to this many characters.
pub const ERROR_PREVIEW_CHARS: usize = 160;

// ============================================================================
// Social Search API
// ============================================================================

/// Minimum spacing between two social API requests (ms).
///
/// The upstream quota allows roughly one request every 5.6 seconds.
pub const SOCIAL_RATE_INTERVAL_MS: u64 = 5_600;

/// Posts requested per social search.
pub const SOCIAL_POST_LIMIT: usize = 50;

/// Profiles requested per user search.
pub const SOCIAL_USER_LIMIT: usize = 20;

/// Adopter / investor profiles kept in the run state.
pub const MAX_PROFILES_KEPT: usize = 10;

/// Sample posts kept per concern for the synthesis prompt.
pub const MAX_SAMPLE_POSTS: usize = 5;

// ============================================================================
// Web Research
// ============================================================================

/// Results requested per web research query.
pub const WEB_MAX_RESULTS: usize = 8;

/// Characters of page content kept per web result.
pub const WEB_CONTENT_PREVIEW_CHARS: usize = 600;

// ============================================================================
// LLM
// ============================================================================

/// Sampling temperature for both planning and synthesis calls.
pub const LLM_TEMPERATURE: f64 = 0.3;

/// Token ceiling for the planning completion.
pub const PLANNER_MAX_TOKENS: usize = 600;

/// Token ceiling for the synthesis completion.
pub const SYNTHESIS_MAX_TOKENS: usize = 1_500;

/// HTTP client timeout for collaborator requests (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Scoring
// ============================================================================

/// Weight of post volume in the demand score.
pub const DEMAND_VOLUME_WEIGHT: f64 = 0.40;

/// Weight of engagement in the demand score.
pub const DEMAND_ENGAGEMENT_WEIGHT: f64 = 0.35;

/// Weight of the pain-signal ratio in the demand score.
pub const DEMAND_PAIN_WEIGHT: f64 = 0.25;

/// Post count at which the volume component saturates.
pub const DEMAND_VOLUME_SATURATION: f64 = 100.0;

/// Engagement total at which the engagement component saturates.
pub const DEMAND_ENGAGEMENT_SATURATION: f64 = 10_000.0;

/// Demand score used when the demand stage could not gather any data.
///
/// Also the score of the context-free fallback verdict when no demand
/// data exists.
pub const DEGRADED_DEMAND_SCORE: u8 = 35;

// ============================================================================
// Transport
// ============================================================================

/// Default bind address for the WebSocket transport.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Interval between heartbeat events on an open research socket (seconds).
pub const HEARTBEAT_INTERVAL_SECS: u64 = 15;

/// Capacity of the per-connection outbound event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;
