//! Input acquisition: turn an upload or pasted text into ordered text units.
//!
//! ## Why a temp file?
//!
//! pdfium opens documents by path. Uploaded bytes are written to a
//! [`NamedTempFile`] that lives only for the duration of the load, so the
//! copy is removed on success, on loader failure, and on panic alike.

use crate::config::InputMode;
use crate::error::SummaryError;
use crate::pipeline::pdf::{self, PdfTextLoader};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Raw user input for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// Pasted text, untrimmed.
    Text(String),
    /// Uploaded PDF bytes.
    Pdf(Vec<u8>),
}

impl SourceInput {
    pub fn mode(&self) -> InputMode {
        match self {
            SourceInput::Text(_) => InputMode::Text,
            SourceInput::Pdf(_) => InputMode::Pdf,
        }
    }
}

/// One unit of source text: the whole paste, or one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub text: String,
    /// 1-indexed page number for PDF input.
    pub page: Option<usize>,
}

/// Resolve `source` into one or more non-blank text units.
///
/// # Errors
/// - [`SummaryError::MissingInput`] for blank text, an empty upload, or a
///   PDF without any extractable text
/// - [`SummaryError::NotAPdf`] when the upload lacks the `%PDF` magic
/// - any error from `loader`
pub async fn acquire(
    source: &SourceInput,
    loader: Arc<dyn PdfTextLoader>,
) -> Result<Vec<TextUnit>, SummaryError> {
    match source {
        SourceInput::Text(text) => acquire_text(text),
        SourceInput::Pdf(bytes) => acquire_pdf(bytes, loader).await,
    }
}

fn acquire_text(text: &str) -> Result<Vec<TextUnit>, SummaryError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SummaryError::MissingInput);
    }
    Ok(vec![TextUnit {
        text: trimmed.to_string(),
        page: None,
    }])
}

async fn acquire_pdf(
    bytes: &[u8],
    loader: Arc<dyn PdfTextLoader>,
) -> Result<Vec<TextUnit>, SummaryError> {
    if bytes.is_empty() {
        return Err(SummaryError::MissingInput);
    }
    check_magic(bytes)?;

    let mut tmp = tempfile::Builder::new()
        .prefix("summrly-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| SummaryError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| SummaryError::Internal(format!("tempfile write: {e}")))?;
    debug!("Wrote {} byte upload to {}", bytes.len(), tmp.path().display());

    let pages = load_scoped(&tmp, loader).await;
    // `tmp` is dropped here (file deleted) whether or not loading succeeded.
    drop(tmp);
    let pages = pages?;

    let units: Vec<TextUnit> = pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| TextUnit {
            text,
            page: Some(idx + 1),
        })
        .collect();

    if units.is_empty() {
        return Err(SummaryError::MissingInput);
    }
    info!("Extracted text from {} PDF pages", units.len());
    Ok(units)
}

async fn load_scoped(
    tmp: &NamedTempFile,
    loader: Arc<dyn PdfTextLoader>,
) -> Result<Vec<String>, SummaryError> {
    pdf::load_pages(loader, tmp.path().to_path_buf()).await
}

fn check_magic(bytes: &[u8]) -> Result<(), SummaryError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(SummaryError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Records the path it was given and whether the file existed then.
    struct Probe {
        seen: Mutex<Option<(PathBuf, bool)>>,
        pages: Result<Vec<&'static str>, ()>,
    }

    impl Probe {
        fn ok(pages: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(None),
                pages: Ok(pages),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(None),
                pages: Err(()),
            })
        }

        fn seen_path(&self) -> (PathBuf, bool) {
            self.seen.lock().unwrap().clone().expect("loader was called")
        }
    }

    impl PdfTextLoader for Probe {
        fn load_pages(&self, path: &Path) -> Result<Vec<String>, SummaryError> {
            *self.seen.lock().unwrap() = Some((path.to_path_buf(), path.exists()));
            match &self.pages {
                Ok(p) => Ok(p.iter().map(|s| s.to_string()).collect()),
                Err(()) => Err(SummaryError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: "broken xref".into(),
                }),
            }
        }
    }

    const PDF: &[u8] = b"%PDF-1.7\n%fake body";

    #[tokio::test]
    async fn text_is_trimmed_into_one_unit() {
        let units = acquire(&SourceInput::Text("  hello world \n".into()), Probe::ok(vec![]))
            .await
            .unwrap();
        assert_eq!(
            units,
            vec![TextUnit {
                text: "hello world".into(),
                page: None
            }]
        );
    }

    #[tokio::test]
    async fn blank_text_is_missing_input() {
        for text in ["", "   ", "\n\t \n"] {
            let err = acquire(&SourceInput::Text(text.into()), Probe::ok(vec![]))
                .await
                .unwrap_err();
            assert!(matches!(err, SummaryError::MissingInput), "{text:?}");
        }
    }

    #[tokio::test]
    async fn empty_upload_is_missing_input() {
        let err = acquire(&SourceInput::Pdf(Vec::new()), Probe::ok(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::MissingInput));
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected_before_loading() {
        let probe = Probe::ok(vec!["x"]);
        let err = acquire(&SourceInput::Pdf(b"PK\x03\x04zip".to_vec()), probe.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::NotAPdf { ref magic } if magic == b"PK\x03\x04"));
        assert!(probe.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn pdf_pages_keep_order_and_skip_blank_pages() {
        let probe = Probe::ok(vec!["first page", "  \n ", "third page"]);
        let units = acquire(&SourceInput::Pdf(PDF.to_vec()), probe.clone())
            .await
            .unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].page, Some(1));
        assert_eq!(units[1].text, "third page");
        assert_eq!(units[1].page, Some(3));
    }

    #[tokio::test]
    async fn temp_file_removed_after_success() {
        let probe = Probe::ok(vec!["text"]);
        acquire(&SourceInput::Pdf(PDF.to_vec()), probe.clone())
            .await
            .unwrap();
        let (path, existed) = probe.seen_path();
        assert!(existed, "loader must see the written file");
        assert!(!path.exists(), "temp file must be deleted");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
    }

    #[tokio::test]
    async fn temp_file_removed_after_loader_failure() {
        let probe = Probe::failing();
        let err = acquire(&SourceInput::Pdf(PDF.to_vec()), probe.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::CorruptPdf { .. }));
        let (path, existed) = probe.seen_path();
        assert!(existed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn pdf_without_text_layer_is_missing_input() {
        let err = acquire(&SourceInput::Pdf(PDF.to_vec()), Probe::ok(vec!["", " "]))
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::MissingInput));
    }
}
