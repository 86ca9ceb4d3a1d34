//! # Generative Text Service
//!
//! The boundary to whatever model produces text. The engine only needs
//! "prompt in, completions out"; transport, auth and model choice live in
//! the implementation.

pub mod json;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use json::load_as_json;

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Sum two usage reports (e.g. when `n` completions were emulated by `n` calls).
    pub fn merge(self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
        }
    }
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    /// Why the model stopped (`"stop"`, `"length"`, ...), if reported.
    pub finish_reason: Option<String>,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), finish_reason: Some("stop".into()) }
    }
}

/// Result of one `generate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResult {
    pub generations: Vec<Generation>,
    pub usage: TokenUsage,
}

impl LlmResult {
    pub fn single(text: impl Into<String>) -> Self {
        Self { generations: vec![Generation::new(text)], usage: TokenUsage::default() }
    }

    /// First completion, trimmed.
    pub fn first_text(&self) -> Option<&str> {
        self.generations.first().map(|g| g.text.trim())
    }
}

/// Generative text service.
///
/// Implementations report transport-level failures (timeouts, connection
/// errors, HTTP 5xx) as `Error::ServiceUnavailable`; the engine never
/// retries those itself.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce `n` candidate completions for `prompt`.
    async fn generate(&self, prompt: &str, n: usize) -> Result<LlmResult>;

    /// Convenience: one completion, trimmed. An empty response is a
    /// generation error.
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let result = self.generate(prompt, 1).await?;
        result
            .first_text()
            .map(str::to_owned)
            .ok_or_else(|| Error::Generation("service returned no completions".into()))
    }
}
