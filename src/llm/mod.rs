//! LLM backends behind a single two-method seam.
//!
//! The pipeline needs exactly two things from a model: a blocking
//! completion for each map call, and a token stream for the reduce call.
//! [`LlmClient`] expresses that and nothing more, which keeps the stages
//! testable with a scripted fake.
//!
//! [`ProviderClient`] implements it over `edgequake-llm`: Groq through the
//! OpenAI-compatible provider, or any named provider (OpenAI, Anthropic,
//! Gemini, Ollama, …) through `ProviderFactory`.

pub mod provider;

pub use provider::ProviderClient;

use crate::config::SummaryConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// A lazy, finite, non-restartable sequence of response tokens.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Sampling options shared by both stages of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

impl GenerationOptions {
    pub fn from_config(config: &SummaryConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A chat model that can answer a single-turn prompt.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short backend label for logs (e.g. "groq").
    fn name(&self) -> &str;

    /// Send `prompt` as one user message and return the full reply.
    async fn complete(&self, prompt: &str, options: &GenerationOptions)
        -> Result<String, LlmError>;

    /// Send `prompt` as one user message and stream the reply.
    ///
    /// Errors may be returned directly or arrive as an `Err` item; an
    /// `Err` item is always the last one.
    async fn stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TokenStream, LlmError>;
}
