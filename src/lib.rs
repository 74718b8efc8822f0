//! # summrly
//!
//! Summarize PDFs and pasted text with a hosted LLM, in two stages.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload / pasted text
//!  │
//!  ├─ 1. Input   validate, extract page text via pdfium (spawn_blocking)
//!  ├─ 2. Chunk   recursive split to 1200 chars, 100 overlap, first 8 kept
//!  ├─ 3. Map     "Summarize:\n{text}" once per segment, sequentially
//!  ├─ 4. Reduce  "Final summary in {length} words:\n{text}", streamed
//!  └─ 5. Render  growing text with a ▌ cursor, then the plain summary
//! ```
//!
//! Every failure ends the run and is collapsed into one of four
//! user-facing outcomes by [`ErrorClass`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use summrly::{summarize, SourceInput, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Groq key from GROQ_API_KEY
//!     let config = SummaryConfig::builder().summary_length(150).build()?;
//!     let bytes = std::fs::read("report.pdf")?;
//!     let output = summarize(SourceInput::Pdf(bytes), &config).await?;
//!     println!("{}", output.summary);
//!     eprintln!(
//!         "{} of {} segments summarized",
//!         output.stats.processed_segments, output.stats.produced_segments
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `web`   | on      | Enables the [`web`] module and the `summrly` server binary (axum + clap + tracing-subscriber) |
//!
//! Disable `web` when using only the library:
//! ```toml
//! summrly = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod session;
pub mod summarize;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{InputMode, Secrets, SummaryConfig, SummaryConfigBuilder};
pub use error::{ErrorClass, LlmError, SummaryError};
pub use llm::{GenerationOptions, LlmClient, ProviderClient, TokenStream};
pub use output::{SummaryOutput, SummaryStats};
pub use pipeline::input::{SourceInput, TextUnit};
pub use pipeline::pdf::{PdfTextLoader, PdfiumLoader};
pub use progress::{NoopProgressCallback, ProgressCallback, SummaryProgressCallback};
pub use render::SummaryRenderer;
pub use session::SessionState;
pub use summarize::{summarize, summarize_sync, summarize_with_secrets};
