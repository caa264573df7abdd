//! External data sources
//!
//! The pipeline talks to two research services through these traits:
//!
//! - [`SocialSearch`]: post search, trending topics and user search on the
//!   quota-limited social API. Callers pace every call through the shared
//!   [`RateLimiter`](crate::scheduling::RateLimiter).
//! - [`WebResearch`]: web search returning a short answer plus sources.
//!
//! Production implementations are thin `reqwest` clients; tests swap in
//! in-process mocks.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Post, TrendTopic, UserProfile, WebSearchResponse};

mod social;
mod tavily;

pub use social::SocialApiClient;
pub use tavily::TavilyClient;

/// Ordering requested from the post search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    Latest,
    Top,
}

impl SearchSort {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchSort::Latest => "latest",
            SearchSort::Top => "top",
        }
    }
}

#[async_trait]
pub trait SocialSearch: Send + Sync {
    async fn search_posts(&self, query: &str, sort: SearchSort, limit: usize) -> Result<Vec<Post>>;

    async fn trending_topics(&self) -> Result<Vec<TrendTopic>>;

    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<UserProfile>>;
}

#[async_trait]
pub trait WebResearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<WebSearchResponse>;
}

/// Errors shared by the HTTP source clients
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    ServerError(reqwest::StatusCode),
    #[error("Rate limited by upstream (429)")]
    RateLimited,
    #[error("Unauthorized: check the API key")]
    Unauthorized,
}

impl ClientError {
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        match status {
            reqwest::StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                ClientError::Unauthorized
            }
            other => ClientError::ServerError(other),
        }
    }
}
