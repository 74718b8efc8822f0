//! Live rendering of the streamed final summary.
//!
//! The reduce stage yields tokens one at a time. [`SummaryRenderer`] folds
//! them into the growing summary; every fold step returns the text to show,
//! with [`CURSOR`] appended while the stream is still open. [`finish`]
//! returns the plain text once the stream has ended.
//!
//! [`finish`]: SummaryRenderer::finish

use crate::error::LlmError;
use crate::llm::TokenStream;
use crate::progress::SummaryProgressCallback;
use futures::StreamExt;

/// Trailing marker shown while tokens are still arriving.
pub const CURSOR: char = '▌';

/// Accumulates streamed tokens into the final summary.
#[derive(Debug, Default)]
pub struct SummaryRenderer {
    text: String,
    tokens: usize,
}

impl SummaryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one token and return the in-progress view.
    pub fn push(&mut self, token: &str) -> String {
        self.text.push_str(token);
        self.tokens += 1;
        let mut view = String::with_capacity(self.text.len() + CURSOR.len_utf8());
        view.push_str(&self.text);
        view.push(CURSOR);
        view
    }

    /// Number of tokens folded so far.
    pub fn tokens(&self) -> usize {
        self.tokens
    }

    /// The text so far, without the cursor.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Close the stream and return the final summary.
    pub fn finish(self) -> String {
        self.text
    }
}

/// Drain `tokens` into the final summary.
///
/// Every token triggers `on_summary_render` with the cursor view; a clean
/// end triggers `on_summary_complete`. A stream error is returned as-is and
/// the partial text is discarded. Returns the summary and the token count.
pub async fn render_stream(
    mut tokens: TokenStream,
    progress: &dyn SummaryProgressCallback,
) -> Result<(String, usize), LlmError> {
    let mut renderer = SummaryRenderer::new();
    while let Some(token) = tokens.next().await {
        let view = renderer.push(&token?);
        progress.on_summary_render(&view);
    }
    let count = renderer.tokens();
    let summary = renderer.finish();
    progress.on_summary_complete(&summary);
    Ok((summary, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Views {
        renders: Mutex<Vec<String>>,
        complete: Mutex<Option<String>>,
    }

    impl SummaryProgressCallback for Views {
        fn on_summary_render(&self, text: &str) {
            self.renders.lock().unwrap().push(text.to_string());
        }

        fn on_summary_complete(&self, summary: &str) {
            *self.complete.lock().unwrap() = Some(summary.to_string());
        }
    }

    #[test]
    fn cursor_while_streaming_plain_when_done() {
        let mut r = SummaryRenderer::new();
        assert_eq!(r.push("The"), "The▌");
        assert_eq!(r.push(" fox"), "The fox▌");
        assert_eq!(r.tokens(), 2);
        let done = r.finish();
        assert_eq!(done, "The fox");
        assert!(!done.contains(CURSOR));
    }

    #[test]
    fn empty_tokens_still_render() {
        let mut r = SummaryRenderer::new();
        assert_eq!(r.push(""), "▌");
        assert_eq!(r.text(), "");
    }

    #[tokio::test]
    async fn render_stream_reports_each_token() {
        let views = Views::default();
        let tokens: TokenStream = Box::pin(stream::iter(vec![
            Ok("Short".to_string()),
            Ok(" and".to_string()),
            Ok(" sweet.".to_string()),
        ]));
        let (summary, count) = render_stream(tokens, &views).await.unwrap();
        assert_eq!(summary, "Short and sweet.");
        assert_eq!(count, 3);
        assert_eq!(
            *views.renders.lock().unwrap(),
            vec!["Short▌", "Short and▌", "Short and sweet.▌"]
        );
        assert_eq!(views.complete.lock().unwrap().as_deref(), Some("Short and sweet."));
    }

    #[tokio::test]
    async fn render_stream_stops_on_error() {
        let views = Views::default();
        let tokens: TokenStream = Box::pin(stream::iter(vec![
            Ok("Half".to_string()),
            Err(LlmError::Network("reset".into())),
            Ok("never".to_string()),
        ]));
        let err = render_stream(tokens, &views).await.unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
        assert_eq!(views.renders.lock().unwrap().len(), 1);
        assert!(views.complete.lock().unwrap().is_none());
    }
}
