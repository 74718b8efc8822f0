//! Map stage: one independent summary per segment.
//!
//! Segments are summarized strictly one after another, in document order.
//! The first failure ends the stage; partial results are discarded because
//! the reduce stage needs all of them.

use crate::error::LlmError;
use crate::llm::{GenerationOptions, LlmClient};
use crate::progress::{progress_fraction, SummaryProgressCallback};
use crate::prompts::map_prompt;
use std::time::Instant;
use tracing::{debug, warn};

/// Summarize each segment and return the partial summaries in order.
///
/// After the `k`-th call succeeds `progress.on_map_progress(k, n, k / n)`
/// is invoked, so the last event always carries a fraction of exactly 1.0.
pub async fn map_segments(
    client: &dyn LlmClient,
    segments: &[String],
    options: &GenerationOptions,
    progress: &dyn SummaryProgressCallback,
) -> Result<Vec<String>, LlmError> {
    let total = segments.len();
    let mut partials = Vec::with_capacity(total);

    for (idx, segment) in segments.iter().enumerate() {
        let done = idx + 1;
        let start = Instant::now();

        let partial = match client.complete(&map_prompt(segment), options).await {
            Ok(p) => p,
            Err(e) => {
                warn!("Segment {}/{}: {} call failed: {}", done, total, client.name(), e);
                return Err(e);
            }
        };

        debug!(
            "Segment {}/{}: {} chars -> {} chars in {}ms",
            done,
            total,
            segment.chars().count(),
            partial.chars().count(),
            start.elapsed().as_millis()
        );

        partials.push(partial);
        progress.on_map_progress(done, total, progress_fraction(done, total));
    }

    Ok(partials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TokenStream;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes a numbered summary; fails on the call at `fail_at` (1-indexed).
    struct Scripted {
        prompts: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl Scripted {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl LlmClient for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str, _o: &GenerationOptions) -> Result<String, LlmError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            if Some(prompts.len()) == self.fail_at {
                return Err(LlmError::RateLimited {
                    provider: "scripted".into(),
                    retry_after_secs: None,
                });
            }
            Ok(format!("S{}.", prompts.len()))
        }

        async fn stream(&self, _p: &str, _o: &GenerationOptions) -> Result<TokenStream, LlmError> {
            unreachable!("map stage never streams")
        }
    }

    #[derive(Default)]
    struct Fractions(Mutex<Vec<(usize, usize, f32)>>);

    impl SummaryProgressCallback for Fractions {
        fn on_map_progress(&self, done: usize, total: usize, fraction: f32) {
            self.0.lock().unwrap().push((done, total, fraction));
        }
    }

    fn opts() -> GenerationOptions {
        GenerationOptions {
            temperature: 0.3,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn summaries_follow_segment_order() {
        let client = Scripted::new(None);
        let progress = Fractions::default();
        let segments: Vec<String> = (1..=4).map(|i| format!("segment {i}")).collect();

        let partials = map_segments(&client, &segments, &opts(), &progress).await.unwrap();

        assert_eq!(partials, vec!["S1.", "S2.", "S3.", "S4."]);
        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts[0], "Summarize:\nsegment 1");
        assert_eq!(prompts[3], "Summarize:\nsegment 4");
        let events = progress.0.lock().unwrap();
        assert_eq!(
            *events,
            vec![(1, 4, 0.25), (2, 4, 0.5), (3, 4, 0.75), (4, 4, 1.0)]
        );
    }

    #[tokio::test]
    async fn first_failure_stops_the_stage() {
        let client = Scripted::new(Some(2));
        let progress = Fractions::default();
        let segments: Vec<String> = (1..=5).map(|i| format!("segment {i}")).collect();

        let err = map_segments(&client, &segments, &opts(), &progress)
            .await
            .unwrap_err();

        assert!(err.is_overload_or_size());
        assert_eq!(client.prompts.lock().unwrap().len(), 2);
        assert_eq!(progress.0.lock().unwrap().len(), 1);
    }
}
