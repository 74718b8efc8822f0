//! Result types returned by a completed run.

use serde::{Deserialize, Serialize};

/// The final summary and run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// Final summary, exactly as streamed (no cursor marker).
    pub summary: String,
    pub stats: SummaryStats,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Pages (PDF) or 1 (pasted text).
    pub text_units: usize,
    /// Segments produced by the splitter before the cap.
    pub produced_segments: usize,
    /// Segments actually summarized.
    pub processed_segments: usize,
    /// True when the cap dropped part of the document.
    pub truncated: bool,
    /// Target word count written into the reduce prompt.
    pub summary_length: u32,
    /// Tokens received from the reduce stream.
    pub streamed_tokens: usize,
    pub total_duration_ms: u64,
    pub map_duration_ms: u64,
    pub reduce_duration_ms: u64,
}
