//! Configuration types for a summarization run.
//!
//! All run behaviour is controlled through [`SummaryConfig`], built via its
//! [`SummaryConfigBuilder`]. Credentials live separately in [`Secrets`] so a
//! config can be logged with `{:?}` without leaking keys.

use crate::error::SummaryError;
use crate::llm::LlmClient;
use crate::pipeline::pdf::PdfTextLoader;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Smallest accepted target summary length, in words.
pub const MIN_SUMMARY_WORDS: u32 = 50;
/// Largest accepted target summary length, in words.
pub const MAX_SUMMARY_WORDS: u32 = 500;
/// Default target summary length, in words.
pub const DEFAULT_SUMMARY_WORDS: u32 = 200;

/// Default Groq model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Groq's OpenAI-compatible API root.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for a map-reduce summarization run.
///
/// # Example
/// ```rust
/// use summrly::SummaryConfig;
///
/// let config = SummaryConfig::builder()
///     .summary_length(100)
///     .build()
///     .unwrap();
/// assert_eq!(config.summary_length, 100);
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Maximum segment length in characters. Default: 1200.
    pub chunk_size: usize,

    /// Characters shared between neighbouring segments. Default: 100.
    pub chunk_overlap: usize,

    /// Hard cap on the number of segments sent to the map stage. Default: 8.
    ///
    /// Segments beyond the cap are dropped, not merged. With the default
    /// chunk size this bounds a run to roughly the first 9 600 characters of
    /// the document and to nine LLM calls.
    pub max_segments: usize,

    /// Target length of the final summary in words (50–500). Default: 200.
    ///
    /// Advisory only: it is written into the reduce prompt and nothing
    /// checks the model obeyed it.
    pub summary_length: u32,

    /// Sampling temperature for both stages. Default: 0.3.
    pub temperature: f32,

    /// Optional cap on generated tokens per call. Default: provider default.
    pub max_tokens: Option<usize>,

    /// Model identifier. Default: `llama-3.3-70b-versatile`.
    pub model: String,

    /// Base URL of the Groq-compatible endpoint.
    pub base_url: String,

    /// `edgequake-llm` provider name (e.g. "openai", "anthropic", "ollama").
    /// When set, the run goes through that provider instead of Groq.
    pub provider_name: Option<String>,

    /// Pre-constructed client. Takes precedence over everything else.
    pub client: Option<Arc<dyn LlmClient>>,

    /// PDF text loader. If None, pdfium is used.
    pub pdf_loader: Option<Arc<dyn PdfTextLoader>>,

    /// Receives progress and render events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 100,
            max_segments: 8,
            summary_length: DEFAULT_SUMMARY_WORDS,
            temperature: 0.3,
            max_tokens: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            provider_name: None,
            client: None,
            pdf_loader: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("max_segments", &self.max_segments)
            .field("summary_length", &self.summary_length)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .field("pdf_loader", &self.pdf_loader.as_ref().map(|_| "<dyn PdfTextLoader>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SummaryProgressCallback>"),
            )
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SummaryConfig`].
#[derive(Debug)]
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl SummaryConfigBuilder {
    pub fn chunk_size(mut self, chars: usize) -> Self {
        self.config.chunk_size = chars.max(1);
        self
    }

    pub fn chunk_overlap(mut self, chars: usize) -> Self {
        self.config.chunk_overlap = chars;
        self
    }

    pub fn max_segments(mut self, n: usize) -> Self {
        self.config.max_segments = n.max(1);
        self
    }

    pub fn summary_length(mut self, words: u32) -> Self {
        self.config.summary_length = words.clamp(MIN_SUMMARY_WORDS, MAX_SUMMARY_WORDS);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn pdf_loader(mut self, loader: Arc<dyn PdfTextLoader>) -> Self {
        self.config.pdf_loader = Some(loader);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, SummaryError> {
        let c = &self.config;
        if c.chunk_overlap >= c.chunk_size {
            return Err(SummaryError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.model.trim().is_empty() {
            return Err(SummaryError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Input mode ───────────────────────────────────────────────────────────

/// Which input control the user is working with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Upload a PDF (default).
    #[default]
    #[serde(rename = "PDF")]
    Pdf,
    /// Paste plain text.
    #[serde(rename = "Text")]
    Text,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Pdf => f.write_str("PDF"),
            InputMode::Text => f.write_str("Text"),
        }
    }
}

// ── Secrets ──────────────────────────────────────────────────────────────

/// Default tracing project name.
pub const DEFAULT_PROJECT: &str = "Summrly";

/// Credentials read from the secrets file and environment.
#[derive(Clone, Default, Deserialize)]
pub struct Secrets {
    /// Groq API key. Summarization is disabled without it.
    #[serde(rename = "GROQ_API_KEY")]
    pub groq_api_key: Option<String>,

    /// Optional key for a remote tracing backend.
    #[serde(rename = "LANGCHAIN_API_KEY")]
    pub tracing_api_key: Option<String>,

    /// Tracing project name, attached to every run span.
    #[serde(rename = "LANGCHAIN_PROJECT")]
    pub project: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Secrets")
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("tracing_api_key", &redact(&self.tracing_api_key))
            .field("project", &self.project)
            .finish()
    }
}

impl Secrets {
    /// Read secrets from the process environment only.
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// Read a TOML secrets file, then let environment variables override it.
    ///
    /// A missing file is not an error: the environment alone may be enough.
    pub fn load(path: &Path) -> Result<Self, SummaryError> {
        let file = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(SummaryError::InvalidConfig(format!(
                    "cannot read secrets file '{}': {e}",
                    path.display()
                )))
            }
        };
        Ok(file.overlay_env())
    }

    /// Parse the TOML secrets format (`GROQ_API_KEY = "..."`).
    pub fn from_toml(text: &str) -> Result<Self, SummaryError> {
        toml::from_str(text)
            .map_err(|e| SummaryError::InvalidConfig(format!("invalid secrets file: {e}")))
    }

    fn overlay_env(mut self) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if let Some(v) = var("GROQ_API_KEY") {
            self.groq_api_key = Some(v);
        }
        if let Some(v) = var("LANGCHAIN_API_KEY") {
            self.tracing_api_key = Some(v);
        }
        if let Some(v) = var("LANGCHAIN_PROJECT") {
            self.project = Some(v);
        }
        self
    }

    /// The Groq key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.groq_api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn project(&self) -> &str {
        self.project.as_deref().unwrap_or(DEFAULT_PROJECT)
    }

    pub fn tracing_enabled(&self) -> bool {
        self.tracing_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}
