//! LLM Backend Module
//!
//! Provides a unified interface for the two LLM roles in a research run:
//!
//! - **Planner**: turns the idea into a query plan (`complete(system, user)`)
//! - **Synthesizer**: turns the gathered signal into a verdict (`generate(prompt)`)
//!
//! Both roles accept any [`LlmBackend`]; production wiring uses
//! [`OpenAiCompatClient`] against an OpenAI-compatible chat endpoint.
//! Model output is free-form text, so structured results always go through
//! [`extract_json`], which never fails.

use anyhow::Result;
use async_trait::async_trait;

mod extract;
mod openai;
pub mod prompts;

pub use extract::{extract_json, find_json_object, Extraction};
pub use openai::{LlmClientError, OpenAiCompatClient};

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Chat-style completion with a system and a user message
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Single-prompt generation
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete("", prompt).await
    }

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}
