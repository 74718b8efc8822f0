//! Summarization entry points.
//!
//! A run acquires the input, splits it, summarizes up to `max_segments`
//! segments one by one, then streams a single combined summary. Every
//! failure is fatal for the run: there are no retries and no partial output.

use crate::config::{Secrets, SummaryConfig};
use crate::error::SummaryError;
use crate::llm::{GenerationOptions, LlmClient, ProviderClient};
use crate::output::{SummaryOutput, SummaryStats};
use crate::pipeline::chunk::{self, TextSplitter};
use crate::pipeline::input::{self, SourceInput};
use crate::pipeline::pdf::{PdfTextLoader, PdfiumLoader};
use crate::pipeline::{map, reduce};
use crate::progress::{NoopProgressCallback, SummaryProgressCallback};
use crate::render;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Summarize a PDF upload or pasted text.
///
/// Credentials are read from the environment (`GROQ_API_KEY`). Use
/// [`summarize_with_secrets`] to pass them explicitly.
///
/// # Errors
/// - [`SummaryError::ApiKeyMissing`] when no client can be built
/// - [`SummaryError::MissingInput`] for blank text or an empty upload; no
///   LLM call is made
/// - PDF and LLM errors from the stages, see [`SummaryError::class`]
///
/// # Example
/// ```rust,no_run
/// use summrly::{summarize, SourceInput, SummaryConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SummaryConfig::builder().summary_length(100).build()?;
/// let text = std::fs::read_to_string("notes.txt")?;
/// let output = summarize(SourceInput::Text(text), &config).await?;
/// println!("{}", output.summary);
/// # Ok(())
/// # }
/// ```
pub async fn summarize(
    source: SourceInput,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    summarize_with_secrets(source, config, &Secrets::from_env()).await
}

/// Summarize with explicit credentials.
pub async fn summarize_with_secrets(
    source: SourceInput,
    config: &SummaryConfig,
    secrets: &Secrets,
) -> Result<SummaryOutput, SummaryError> {
    let client = resolve_client(config, secrets)?;
    let span = info_span!(
        "summary_run",
        project = %secrets.project(),
        mode = %source.mode(),
        backend = %client.name(),
        length = config.summary_length,
    );
    run(&source, config, client).instrument(span).await
}

/// Synchronous wrapper around [`summarize`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside another runtime.
pub fn summarize_sync(
    source: SourceInput,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SummaryError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarize(source, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the LLM client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`), used as-is.
/// 2. **Named provider** (`config.provider_name`), built through
///    `edgequake-llm` with `config.model`; the provider reads its own key.
/// 3. **Groq** with the key from `secrets`.
pub fn resolve_client(
    config: &SummaryConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn LlmClient>, SummaryError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    if let Some(ref name) = config.provider_name {
        return Ok(Arc::new(ProviderClient::from_name(name, &config.model)?));
    }

    Ok(Arc::new(ProviderClient::groq(config, secrets)?))
}

async fn run(
    source: &SourceInput,
    config: &SummaryConfig,
    client: Arc<dyn LlmClient>,
) -> Result<SummaryOutput, SummaryError> {
    let total_start = Instant::now();
    let noop = NoopProgressCallback;
    let progress: &dyn SummaryProgressCallback = match config.progress_callback {
        Some(ref cb) => cb.as_ref(),
        None => &noop,
    };

    // ── Step 1: Acquire input ────────────────────────────────────────────
    let loader = config
        .pdf_loader
        .clone()
        .unwrap_or_else(|| Arc::new(PdfiumLoader::from_env()) as Arc<dyn PdfTextLoader>);
    let units = input::acquire(source, loader).await?;
    progress.on_pipeline_start(units.len());

    // ── Step 2: Split and cap ────────────────────────────────────────────
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
    let segments = chunk::segment_units(&units, &splitter, config.max_segments);
    if segments.is_empty() {
        return Err(SummaryError::MissingInput);
    }
    progress.on_segments_ready(segments.len(), segments.produced);
    info!(
        "Summarizing {} of {} segments from {} text units",
        segments.len(),
        segments.produced,
        units.len()
    );

    // ── Step 3: Map ──────────────────────────────────────────────────────
    let options = GenerationOptions::from_config(config);
    let map_start = Instant::now();
    let partials =
        map::map_segments(client.as_ref(), &segments.segments, &options, progress).await?;
    let map_duration_ms = map_start.elapsed().as_millis() as u64;

    // ── Step 4: Reduce (streamed) ────────────────────────────────────────
    let reduce_start = Instant::now();
    let tokens =
        reduce::reduce_stream(client.as_ref(), &partials, config.summary_length, &options).await?;
    let (summary, streamed_tokens) = render::render_stream(tokens, progress).await?;
    let reduce_duration_ms = reduce_start.elapsed().as_millis() as u64;

    let stats = SummaryStats {
        text_units: units.len(),
        produced_segments: segments.produced,
        processed_segments: segments.len(),
        truncated: segments.truncated(),
        summary_length: config.summary_length,
        streamed_tokens,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        map_duration_ms,
        reduce_duration_ms,
    };

    info!(
        "Summary complete: {} segments, {} tokens, {}ms total",
        stats.processed_segments, stats.streamed_tokens, stats.total_duration_ms
    );

    Ok(SummaryOutput { summary, stats })
}
