//! Prompt templates for the two summarization stages.
//!
//! Both prompts are deliberately bare. The map prompt asks for a summary of
//! one segment; the reduce prompt asks for a summary of the concatenated
//! partial summaries at a target word count.

/// Map-stage template. `{text}` is replaced with one segment.
pub const MAP_PROMPT: &str = "Summarize:\n{text}";

/// Reduce-stage template. `{length}` is the target word count, `{text}` the
/// joined partial summaries.
pub const REDUCE_PROMPT: &str = "Final summary in {length} words:\n{text}";

/// Build the map prompt for one segment.
pub fn map_prompt(segment: &str) -> String {
    MAP_PROMPT.replace("{text}", segment)
}

/// Build the reduce prompt.
///
/// `{length}` is substituted first so that a literal `{length}` inside the
/// document text is left untouched.
pub fn reduce_prompt(length: u32, combined: &str) -> String {
    REDUCE_PROMPT
        .replace("{length}", &length.to_string())
        .replace("{text}", combined)
}
