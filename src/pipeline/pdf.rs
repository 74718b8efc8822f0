//! PDF text extraction: one text record per page via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! [`load_pages`] moves the work onto the blocking pool so the Tokio worker
//! threads keep serving other sessions while a large document is parsed.

use crate::error::SummaryError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Extracts page-ordered text from a PDF on disk.
///
/// Implementations are called from a blocking thread.
pub trait PdfTextLoader: Send + Sync {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, SummaryError>;
}

/// [`PdfTextLoader`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumLoader {
    library_path: Option<PathBuf>,
}

impl PdfiumLoader {
    /// Bind to the system pdfium library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium library at `path`.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Honour `PDFIUM_LIB_PATH` when set, else use the system library.
    pub fn from_env() -> Self {
        match std::env::var("PDFIUM_LIB_PATH") {
            Ok(p) if !p.trim().is_empty() => Self::with_library(p),
            _ => Self::new(),
        }
    }

    fn bind(&self) -> Result<Pdfium, SummaryError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| SummaryError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PdfTextLoader for PdfiumLoader {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, SummaryError> {
        let pdfium = self.bind()?;

        let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
            let detail = format!("{:?}", e);
            if detail.contains("Password") || detail.contains("password") {
                SummaryError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            } else {
                SummaryError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail,
                }
            }
        })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| SummaryError::CorruptPdf {
                path: path.to_path_buf(),
                detail: format!("text layer of page {}: {:?}", idx + 1, e),
            })?;
            let all = text.all();
            debug!("Page {}: {} chars", idx + 1, all.chars().count());
            texts.push(all);
        }

        Ok(texts)
    }
}

/// Run `loader` on the blocking pool.
pub async fn load_pages(
    loader: Arc<dyn PdfTextLoader>,
    path: PathBuf,
) -> Result<Vec<String>, SummaryError> {
    tokio::task::spawn_blocking(move || loader.load_pages(&path))
        .await
        .map_err(|e| SummaryError::Internal(format!("PDF text task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<&'static str>);

    impl PdfTextLoader for FixedPages {
        fn load_pages(&self, _path: &Path) -> Result<Vec<String>, SummaryError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn load_pages_runs_loader_off_the_async_thread() {
        let loader: Arc<dyn PdfTextLoader> = Arc::new(FixedPages(vec!["one", "two"]));
        let pages = load_pages(loader, PathBuf::from("ignored.pdf")).await.unwrap();
        assert_eq!(pages, vec!["one", "two"]);
    }

    #[test]
    fn library_path_from_builder() {
        let l = PdfiumLoader::with_library("/opt/pdfium/libpdfium.so");
        assert_eq!(
            l.library_path.as_deref(),
            Some(Path::new("/opt/pdfium/libpdfium.so"))
        );
        assert!(PdfiumLoader::new().library_path.is_none());
    }
}
