//! Reduce stage: merge the partial summaries into one streamed summary.

use crate::error::LlmError;
use crate::llm::{GenerationOptions, LlmClient, TokenStream};
use crate::prompts::reduce_prompt;
use tracing::debug;

/// Join partial summaries with a single space, in segment order.
pub fn combine(partials: &[String]) -> String {
    partials.join(" ")
}

/// Open the token stream for the final summary.
///
/// Exactly one LLM call is made, whatever the number of partials.
pub async fn reduce_stream(
    client: &dyn LlmClient,
    partials: &[String],
    length: u32,
    options: &GenerationOptions,
) -> Result<TokenStream, LlmError> {
    let combined = combine(partials);
    debug!(
        "Reducing {} partial summaries ({} chars) to ~{} words",
        partials.len(),
        combined.chars().count(),
        length
    );
    client.stream(&reduce_prompt(length, &combined), options).await
}
