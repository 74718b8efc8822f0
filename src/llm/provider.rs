//! Adapter from `edgequake-llm` providers to [`LlmClient`].

use super::{GenerationOptions, LlmClient, TokenStream};
use crate::config::{Secrets, SummaryConfig};
use crate::error::{LlmError, SummaryError};
use async_trait::async_trait;
use edgequake_llm::traits::StreamChunk;
use edgequake_llm::{
    ChatMessage, CompletionOptions, ConfigProviderType, LLMProvider, OpenAICompatibleProvider,
    ProviderConfig, ProviderFactory,
};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const GROQ: &str = "groq";

/// Whole-request timeout; the reduce stream must finish within it.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Runs prompts through any `edgequake-llm` provider.
///
/// The reduce call streams through `chat_with_tools_stream` (no tools).
/// Providers without streaming support fall back to `chat` and yield the
/// whole reply as a single token.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Instantiate a named provider (reads its API key from the environment).
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, SummaryError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            SummaryError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, provider_name))
    }

    /// Groq's OpenAI-compatible endpoint, keyed from `secrets`.
    ///
    /// The key may come from `secrets.toml`, so it is sent as an explicit
    /// `Authorization` header rather than through `api_key_env`.
    pub fn groq(config: &SummaryConfig, secrets: &Secrets) -> Result<Self, SummaryError> {
        let key = secrets.api_key().ok_or(SummaryError::ApiKeyMissing)?;
        let provider_config = ProviderConfig {
            name: GROQ.to_string(),
            display_name: "Groq".to_string(),
            provider_type: ConfigProviderType::OpenAICompatible,
            base_url: Some(config.base_url.clone()),
            default_llm_model: Some(config.model.clone()),
            headers: HashMap::from([("Authorization".to_string(), format!("Bearer {key}"))]),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
            ..Default::default()
        };
        let provider = OpenAICompatibleProvider::from_config(provider_config).map_err(|e| {
            SummaryError::ProviderNotConfigured {
                provider: GROQ.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(Arc::new(provider), GROQ))
    }
}

fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: options.max_tokens,
        ..Default::default()
    }
}

/// Map a provider error onto a structured [`LlmError`].
///
/// OpenAI-compatible providers report HTTP failures as text
/// (`"groq API 429: ..."`, `"Invalid status code: 413 Payload Too Large"`),
/// so the status is recovered from the message when present.
pub(crate) fn map_provider_error(provider: &str, err: edgequake_llm::LlmError) -> LlmError {
    use edgequake_llm::LlmError as E;
    match err {
        E::RateLimited(_) => LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs: None,
        },
        E::TokenLimitExceeded { max, got } => LlmError::ContextLengthExceeded {
            detail: format!("max {max}, got {got}"),
        },
        E::AuthError(detail) => LlmError::Auth {
            provider: provider.to_string(),
            detail,
        },
        E::Timeout => LlmError::Network("request timed out".to_string()),
        other => {
            let message = other.to_string();
            match status_in_message(&message) {
                Some(status) => LlmError::from_status(provider, status, message),
                None if matches!(other, E::NetworkError(_)) => LlmError::Network(message),
                None => LlmError::Provider(message),
            }
        }
    }
}

/// First word of `message` that reads as an HTTP error status (400–599).
fn status_in_message(message: &str) -> Option<u16> {
    message
        .split(|c: char| !c.is_ascii_digit())
        .filter(|w| w.len() == 3)
        .filter_map(|w| w.parse::<u16>().ok())
        .find(|s| (400..600).contains(s))
}

/// Keep the non-empty `Content` chunks; end after the first error.
fn content_tokens(
    chunks: BoxStream<'static, edgequake_llm::Result<StreamChunk>>,
    provider: String,
) -> TokenStream {
    let tokens = stream::unfold(Some(chunks), move |state| {
        let provider = provider.clone();
        async move {
            let mut chunks = state?;
            loop {
                match chunks.next().await? {
                    Ok(StreamChunk::Content(text)) if !text.is_empty() => {
                        return Some((Ok(text), Some(chunks)));
                    }
                    Ok(_) => continue,
                    Err(e) => return Some((Err(map_provider_error(&provider, e)), None)),
                }
            }
        }
    });
    Box::pin(tokens)
}

#[async_trait]
impl LlmClient for ProviderClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&build_options(options)))
            .await
            .map_err(|e| map_provider_error(&self.label, e))?;
        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }

    async fn stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TokenStream, LlmError> {
        let messages = vec![ChatMessage::user(prompt)];
        match self
            .provider
            .chat_with_tools_stream(&messages, &[], None, Some(&build_options(options)))
            .await
        {
            Ok(chunks) => Ok(content_tokens(chunks, self.label.clone())),
            Err(edgequake_llm::LlmError::NotSupported(_)) => {
                debug!("{}: streaming not supported, using chat", self.label);
                let content = self.complete(prompt, options).await?;
                Ok(Box::pin(stream::once(async move { Ok(content) })))
            }
            Err(e) => Err(map_provider_error(&self.label, e)),
        }
    }
}
