//! Error types for the summrly library.
//!
//! Two error types reflect two distinct layers:
//!
//! * [`LlmError`] — returned by an [`crate::llm::LlmClient`]. The client knows
//!   *why* a call failed (HTTP 429, payload too large, broken stream), so it
//!   says so with a variant instead of leaving callers to sniff message text.
//!
//! * [`SummaryError`] — **Fatal** for the current run. Every failure, from a
//!   blank text box to a dropped stream, ends the run; nothing is
//!   retried and no partial summary is shown.
//!
//! [`ErrorClass`] collapses either of them into the four user-facing
//! outcomes the UI knows how to display.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by an LLM backend.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// HTTP 429 or a provider-specific rate-limit payload.
    #[error("rate_limit exceeded by '{provider}'")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// HTTP 413: the prompt body is larger than the provider accepts.
    #[error("Request too large for '{provider}': {detail}")]
    PayloadTooLarge { provider: String, detail: String },

    /// The prompt exceeds the model's context window.
    #[error("Prompt exceeds the model context window: {detail}")]
    ContextLengthExceeded { detail: String },

    /// HTTP 401/403.
    #[error("Authentication failed for '{provider}': {detail}")]
    Auth { provider: String, detail: String },

    /// Any other non-success HTTP status.
    #[error("LLM API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never reached the provider, or the connection dropped.
    #[error("Network error: {0}")]
    Network(String),

    /// Error surfaced by an `edgequake-llm` provider.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl LlmError {
    /// True for failures a smaller input or a later retry may fix.
    pub fn is_overload_or_size(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::PayloadTooLarge { .. }
                | LlmError::ContextLengthExceeded { .. }
        )
    }

    /// Map an HTTP error status and body into a variant.
    ///
    /// Groq reports context overflow as a 400 with
    /// `"code": "context_length_exceeded"`, so the body is consulted for 400s.
    pub fn from_status(provider: &str, status: u16, body: String) -> Self {
        match status {
            429 => LlmError::RateLimited {
                provider: provider.to_string(),
                retry_after_secs: retry_after_from_body(&body),
            },
            413 => LlmError::PayloadTooLarge {
                provider: provider.to_string(),
                detail: body,
            },
            401 | 403 => LlmError::Auth {
                provider: provider.to_string(),
                detail: body,
            },
            400 if body.contains("context_length_exceeded") => {
                LlmError::ContextLengthExceeded { detail: body }
            }
            _ => LlmError::Api {
                status,
                message: body,
            },
        }
    }
}

fn retry_after_from_body(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["retry_after"]
        .as_u64()
        .or_else(|| value["error"]["retry_after_secs"].as_u64())
}

/// All fatal errors returned by a summarization run.
#[derive(Debug, Error)]
pub enum SummaryError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Neither a usable PDF nor non-blank text was supplied.
    #[error("Please provide input")]
    MissingInput,

    /// The uploaded bytes do not start with the `%PDF` magic.
    #[error("Uploaded file is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF could not be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is encrypted.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// No pdfium library could be loaded.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// `GROQ_API_KEY` is absent and no other provider was selected.
    #[error("API key missing")]
    ApiKeyMissing,

    /// A named `edgequake-llm` provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The map or reduce call failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SummaryError {
    /// Classify this error into the outcome shown to the user.
    pub fn class(&self) -> ErrorClass {
        match self {
            SummaryError::MissingInput => ErrorClass::MissingInput,
            SummaryError::ApiKeyMissing | SummaryError::ProviderNotConfigured { .. } => {
                ErrorClass::Configuration
            }
            SummaryError::Llm(e) if e.is_overload_or_size() => ErrorClass::UpstreamOverloadOrSize,
            other => ErrorClass::from_message(&other.to_string()),
        }
    }

    /// The message shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        self.class().user_message()
    }
}

/// User-facing outcome of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    MissingInput,
    Configuration,
    UpstreamOverloadOrSize,
    Unknown,
}

/// Lowercase substrings that mark an unstructured failure as overload/size.
const OVERLOAD_MARKERS: [&str; 3] = ["token", "rate_limit", "request too large"];

impl ErrorClass {
    /// Coarse classification of an unstructured error message.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if OVERLOAD_MARKERS.iter().any(|m| lower.contains(m)) {
            ErrorClass::UpstreamOverloadOrSize
        } else {
            ErrorClass::Unknown
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            ErrorClass::MissingInput => "Please provide input",
            ErrorClass::Configuration => "API key missing",
            ErrorClass::UpstreamOverloadOrSize => {
                "⚠️ Content too large or server busy. Try smaller input or try again later."
            }
            ErrorClass::Unknown => "⚠️ Something went wrong. Please try again.",
        }
    }
}
