//! Tavily web search client

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ClientError, WebResearch};
use crate::config::defaults::{HTTP_TIMEOUT_SECS, WEB_CONTENT_PREVIEW_CHARS};
use crate::config::WebConfig;
use crate::types::{WebResult, WebSearchResponse};

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Deserialize)]
struct RawResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    search_depth: String,
    max_results: usize,
}

impl TavilyClient {
    pub fn new(config: &WebConfig, api_key: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            search_depth: config.search_depth.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl WebResearch for TavilyClient {
    async fn search(&self, query: &str) -> Result<WebSearchResponse> {
        let body = SearchRequest {
            query,
            search_depth: &self.search_depth,
            max_results: self.max_results,
            include_answer: true,
        };

        let mut req = self
            .http
            .post(format!("{}/search", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await.map_err(ClientError::from)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::from_status(status).into());
        }

        let parsed: SearchResponse = resp.json().await.map_err(ClientError::from)?;
        Ok(into_response(parsed))
    }
}

fn into_response(raw: SearchResponse) -> WebSearchResponse {
    WebSearchResponse {
        answer: raw.answer.filter(|a| !a.trim().is_empty()),
        results: raw
            .results
            .into_iter()
            .map(|r| WebResult {
                url: r.url,
                title: r.title,
                content: r.content.chars().take(WEB_CONTENT_PREVIEW_CHARS).collect(),
            })
            .collect(),
    }
}
