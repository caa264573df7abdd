//! HTTP client for the social search API

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{ClientError, SearchSort, SocialSearch};
use crate::config::defaults::HTTP_TIMEOUT_SECS;
use crate::types::{Post, TrendTopic, UserProfile};

#[derive(Deserialize)]
struct PostsResponse {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    trends: Vec<TrendTopic>,
}

#[derive(Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<UserProfile>,
}

/// Client for `/search/posts`, `/trends` and `/search/users`.
///
/// The client does not pace itself; the pipeline wraps each call in the
/// shared rate limiter.
#[derive(Clone)]
pub struct SocialApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SocialApiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let mut req = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await?;
        match resp.status() {
            status if status.is_success() => Ok(resp.json().await?),
            status => Err(ClientError::from_status(status)),
        }
    }
}

#[async_trait]
impl SocialSearch for SocialApiClient {
    async fn search_posts(&self, query: &str, sort: SearchSort, limit: usize) -> Result<Vec<Post>> {
        let resp: PostsResponse = self
            .get(
                "/search/posts",
                &[
                    ("q", query.to_string()),
                    ("sort", sort.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        tracing::debug!(query, count = resp.posts.len(), "Social post search");
        Ok(resp.posts)
    }

    async fn trending_topics(&self) -> Result<Vec<TrendTopic>> {
        let resp: TrendsResponse = self.get("/trends", &[]).await?;
        Ok(resp.trends)
    }

    async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<UserProfile>> {
        let resp: UsersResponse = self
            .get(
                "/search/users",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        tracing::debug!(query, count = resp.users.len(), "Social user search");
        Ok(resp.users)
    }
}
