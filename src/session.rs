//! Per-browser UI state.
//!
//! A [`SessionState`] holds what one visitor has entered so far: the input
//! mode, the uploaded PDF, and the pasted text. Switching mode or pressing
//! "Clear / New" resets it. A run takes a [`SourceInput`] snapshot, so edits
//! made while a summary is streaming do not affect that run. Sessions left
//! idle are dropped by [`SessionStore::sweep`].

use crate::config::InputMode;
use crate::pipeline::input::SourceInput;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Rejected session edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session is in {current} mode; switch to {required} first")]
    WrongMode {
        current: InputMode,
        required: InputMode,
    },
}

/// An uploaded PDF held in memory until the next reset.
#[derive(Clone)]
pub struct UploadedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedPdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedPdf")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Everything one visitor has entered.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub mode: InputMode,
    pub pdf: Option<UploadedPdf>,
    pub text: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a fresh session: PDF mode, nothing uploaded, no text.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Select an input mode. A different mode discards all entered input;
    /// the same mode keeps it. Returns whether the mode changed.
    pub fn set_mode(&mut self, mode: InputMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.reset();
        self.mode = mode;
        true
    }

    pub fn set_pdf(&mut self, pdf: UploadedPdf) -> Result<(), SessionError> {
        self.require(InputMode::Pdf)?;
        self.pdf = Some(pdf);
        Ok(())
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.require(InputMode::Text)?;
        self.text = text.into();
        Ok(())
    }

    fn require(&self, required: InputMode) -> Result<(), SessionError> {
        if self.mode != required {
            return Err(SessionError::WrongMode {
                current: self.mode,
                required,
            });
        }
        Ok(())
    }

    /// Snapshot the input for the current mode.
    ///
    /// PDF mode without an upload yields empty bytes, which the pipeline
    /// rejects as missing input.
    pub fn to_source(&self) -> SourceInput {
        match self.mode {
            InputMode::Pdf => SourceInput::Pdf(
                self.pdf
                    .as_ref()
                    .map(|p| p.bytes.clone())
                    .unwrap_or_default(),
            ),
            InputMode::Text => SourceInput::Text(self.text.clone()),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.mode,
            pdf_name: self.pdf.as_ref().map(|p| p.file_name.clone()),
            pdf_bytes: self.pdf.as_ref().map_or(0, |p| p.bytes.len()),
            text_chars: self.text.chars().count(),
        }
    }
}

/// JSON view of a session for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub mode: InputMode,
    pub pdf_name: Option<String>,
    pub pdf_bytes: usize,
    pub text_chars: usize,
}

#[cfg(feature = "web")]
pub use store::SessionStore;

#[cfg(feature = "web")]
mod store {
    use super::{SessionError, SessionState};
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::RwLock;
    use tokio::time::Instant;
    use uuid::Uuid;

    #[derive(Debug)]
    struct Entry {
        state: SessionState,
        last_seen: Instant,
    }

    impl Entry {
        fn new() -> Self {
            Self {
                state: SessionState::new(),
                last_seen: Instant::now(),
            }
        }
    }

    /// In-memory map of live sessions.
    ///
    /// Every access refreshes a session's idle clock; [`SessionStore::sweep`]
    /// drops the ones left idle for too long, uploaded PDF included.
    #[derive(Debug, Default)]
    pub struct SessionStore {
        sessions: RwLock<HashMap<Uuid, Entry>>,
    }

    impl SessionStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn create(&self) -> Uuid {
            let id = Uuid::new_v4();
            self.sessions.write().await.insert(id, Entry::new());
            id
        }

        /// Clone of the session state.
        pub async fn get(&self, id: &Uuid) -> Result<SessionState, SessionError> {
            self.update(id, |s| s.clone()).await
        }

        /// Apply `f` to the session under the write lock.
        pub async fn update<R>(
            &self,
            id: &Uuid,
            f: impl FnOnce(&mut SessionState) -> R,
        ) -> Result<R, SessionError> {
            let mut sessions = self.sessions.write().await;
            let entry = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
            entry.last_seen = Instant::now();
            Ok(f(&mut entry.state))
        }

        /// Remove sessions idle for at least `idle`. Returns how many went.
        pub async fn sweep(&self, idle: Duration) -> usize {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, entry| entry.last_seen.elapsed() < idle);
            before - sessions.len()
        }

        pub async fn len(&self) -> usize {
            self.sessions.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.sessions.read().await.is_empty()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::config::InputMode;
        use crate::session::UploadedPdf;

        #[tokio::test]
        async fn create_update_get() {
            let store = SessionStore::new();
            let id = store.create().await;
            store
                .update(&id, |s| {
                    s.set_mode(InputMode::Text);
                    s.set_text("hello")
                })
                .await
                .unwrap()
                .unwrap();
            let state = store.get(&id).await.unwrap();
            assert_eq!(state.text, "hello");
            assert_eq!(store.len().await, 1);
        }

        #[tokio::test]
        async fn unknown_session() {
            let store = SessionStore::new();
            assert_eq!(
                store.get(&Uuid::new_v4()).await.unwrap_err(),
                SessionError::NotFound
            );
            assert!(store.is_empty().await);
        }

        #[tokio::test(start_paused = true)]
        async fn idle_sessions_are_swept() {
            let store = SessionStore::new();
            for _ in 0..100 {
                let id = store.create().await;
                store
                    .update(&id, |s| {
                        s.set_pdf(UploadedPdf {
                            file_name: "a.pdf".into(),
                            bytes: vec![0; 1024],
                        })
                    })
                    .await
                    .unwrap()
                    .unwrap();
            }
            assert_eq!(store.sweep(Duration::from_secs(60)).await, 0);

            tokio::time::advance(Duration::from_secs(61)).await;
            assert_eq!(store.sweep(Duration::from_secs(60)).await, 100);
            assert!(store.is_empty().await);
        }

        #[tokio::test(start_paused = true)]
        async fn access_keeps_a_session_alive() {
            let store = SessionStore::new();
            let active = store.create().await;
            let idle = store.create().await;

            tokio::time::advance(Duration::from_secs(45)).await;
            store.get(&active).await.unwrap();
            tokio::time::advance(Duration::from_secs(30)).await;

            assert_eq!(store.sweep(Duration::from_secs(60)).await, 1);
            assert!(store.get(&active).await.is_ok());
            assert_eq!(store.get(&idle).await.unwrap_err(), SessionError::NotFound);
        }
    }
}
