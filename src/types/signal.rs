//! Raw items returned by the collaborators and the per-stage data built from them

use serde::{Deserialize, Serialize};

// ============================================================================
// Collaborator Items
// ============================================================================

/// A single post returned by the social search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: String,
    #[serde(default)]
    pub author_followers: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Post {
    /// Likes + reposts + replies, saturating at `u64::MAX`.
    pub fn engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.reposts)
            .saturating_add(self.replies)
    }
}

/// A trending topic reported by the social search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendTopic {
    pub name: String,
    #[serde(default)]
    pub post_volume: Option<u64>,
}

/// A user profile returned by the social user search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    pub handle: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub url: Option<String>,
}

/// One page found by the web research client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Response to a single web research query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WebSearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<WebResult>,
}

// ============================================================================
// Stage Data
// ============================================================================

/// How loudly the idea's topic is being talked about right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    Rising,
    Steady,
    #[default]
    Quiet,
}

impl Momentum {
    /// Classify from matching trending topics and trend-scan volume.
    pub fn classify(matching_topics: usize, scan_posts: usize) -> Self {
        if matching_topics > 0 || scan_posts >= 40 {
            Momentum::Rising
        } else if scan_posts >= 10 {
            Momentum::Steady
        } else {
            Momentum::Quiet
        }
    }
}

/// Output of the `trends` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrendData {
    /// Trending topics that mention one of the idea keywords
    pub matching_topics: Vec<TrendTopic>,
    pub scan_post_count: usize,
    pub scan_engagement: u64,
    pub momentum: Momentum,
    /// Set when the data is a degraded substitute
    pub note: Option<String>,
}

/// Post counts per sentiment bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Output of the `demand` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DemandData {
    pub post_count: usize,
    pub total_engagement: u64,
    pub pain_post_count: usize,
    pub sentiment: SentimentBreakdown,
    /// 0-100
    pub demand_score: u8,
    pub sample_posts: Vec<Post>,
    pub pain_quotes: Vec<String>,
    /// Fan-out calls that failed or timed out
    pub failed_queries: usize,
    pub note: Option<String>,
}

/// Output of the `adopters` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdopterData {
    pub profiles: Vec<UserProfile>,
    pub total_reach: u64,
    pub note: Option<String>,
}

/// Output of the `funders` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FunderData {
    pub investors: Vec<UserProfile>,
    pub funding_post_count: usize,
    pub note: Option<String>,
}

/// Output of the `community` stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommunityData {
    pub discussion_count: usize,
    pub competitor_post_count: usize,
    /// Most active authors in the community discussion
    pub active_voices: Vec<String>,
    pub sample_posts: Vec<Post>,
    pub note: Option<String>,
}

/// Output of the `web_intel` stage (produced by the prefetched research task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WebIntel {
    /// Short answers, one per query that returned one
    pub answers: Vec<String>,
    /// Answers concatenated for the synthesis prompt
    pub digest: String,
    /// Deduplicated by URL, first-seen order
    pub sources: Vec<WebResult>,
    pub failed_queries: usize,
    pub note: Option<String>,
}
