//! Progress-callback trait for summarization events.
//!
//! Inject an [`Arc<dyn SummaryProgressCallback>`] via
//! [`crate::config::SummaryConfigBuilder::progress_callback`] to receive
//! events as the pipeline runs: a progress fraction while segments are being
//! summarized, then the growing final summary after every streamed token.
//!
//! # Example
//!
//! ```rust
//! use summrly::{SummaryConfig, SummaryProgressCallback};
//! use std::sync::Arc;
//!
//! struct PrintProgress;
//!
//! impl SummaryProgressCallback for PrintProgress {
//!     fn on_map_progress(&self, done: usize, total: usize, fraction: f32) {
//!         eprintln!("segment {done}/{total} ({:.0}%)", fraction * 100.0);
//!     }
//! }
//!
//! let config = SummaryConfig::builder()
//!     .progress_callback(Arc::new(PrintProgress))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Receives pipeline events for one run.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. A run calls them from a single task, in order.
pub trait SummaryProgressCallback: Send + Sync {
    /// Called once the input has been acquired.
    ///
    /// # Arguments
    /// * `text_units` — pages (PDF) or 1 (pasted text)
    fn on_pipeline_start(&self, text_units: usize) {
        let _ = text_units;
    }

    /// Called after chunking, before the first LLM call.
    ///
    /// # Arguments
    /// * `kept`     — segments that will be summarized
    /// * `produced` — segments the splitter produced; `produced > kept`
    ///   means the tail of the document was dropped
    fn on_segments_ready(&self, kept: usize, produced: usize) {
        let _ = (kept, produced);
    }

    /// Called after each map-stage call.
    ///
    /// # Arguments
    /// * `done`     — segments summarized so far (1-indexed)
    /// * `total`    — segments in this run
    /// * `fraction` — `done / total`, in `(0, 1]`
    fn on_map_progress(&self, done: usize, total: usize, fraction: f32) {
        let _ = (done, total, fraction);
    }

    /// Called after every streamed token with the text to display,
    /// including the trailing cursor marker.
    fn on_summary_render(&self, text: &str) {
        let _ = text;
    }

    /// Called once the stream has ended, with the plain final summary.
    fn on_summary_complete(&self, summary: &str) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SummaryProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SummaryConfig`].
pub type ProgressCallback = Arc<dyn SummaryProgressCallback>;

/// Progress after `done` of `total` segments.
pub fn progress_fraction(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    (done.min(total) as f64 / total as f64) as f32
}
