//! HTTP surface: the single page, session endpoints, and the summary stream.
//!
//! ```text
//! GET  /                                 page
//! GET  /health                           liveness
//! GET  /api/config                       slider bounds, API-key warning
//! POST /api/sessions                     new session id
//! GET  /api/sessions/{id}                session view
//! PUT  /api/sessions/{id}/mode           {"mode": "PDF" | "Text"}
//! POST /api/sessions/{id}/pdf            multipart upload
//! PUT  /api/sessions/{id}/text           {"text": "..."}
//! POST /api/sessions/{id}/clear          Clear / New
//! GET  /api/sessions/{id}/summary?length text/event-stream
//! ```
//!
//! The summary stream emits `segments`, `progress` and `render` events while
//! the run is in flight, then exactly one `done` or `error` event. `render`
//! text is provisional: on `error` the page discards it and shows only the
//! message.

use crate::config::{
    InputMode, Secrets, SummaryConfig, DEFAULT_SUMMARY_WORDS, MAX_SUMMARY_WORDS, MIN_SUMMARY_WORDS,
};
use crate::error::{ErrorClass, SummaryError};
use crate::output::SummaryStats;
use crate::progress::{ProgressCallback, SummaryProgressCallback};
use crate::session::{SessionError, SessionStore, SessionView, UploadedPdf};
use crate::summarize::summarize_with_secrets;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("index.html");

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Warning shown when no LLM backend is configured.
pub const MISSING_KEY_WARNING: &str = "Add GROQ_API_KEY in secrets.toml";

/// Shared server state.
pub struct AppState {
    pub sessions: SessionStore,
    pub secrets: Secrets,
    /// Template for every run; `summary_length` and the progress callback
    /// are set per request.
    pub config: SummaryConfig,
}

impl AppState {
    pub fn new(config: SummaryConfig, secrets: Secrets) -> Self {
        Self {
            sessions: SessionStore::new(),
            secrets,
            config,
        }
    }

    /// True when a run could build an LLM client.
    pub fn llm_configured(&self) -> bool {
        self.config.client.is_some()
            || self.config.provider_name.is_some()
            || self.secrets.has_api_key()
    }
}

/// Drop sessions idle for `idle`, checking every `every`.
pub fn spawn_session_sweeper(
    state: Arc<AppState>,
    idle: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = state.sessions.sweep(idle).await;
            if removed > 0 {
                info!("Expired {} idle sessions", removed);
            } else {
                debug!("Session sweep: nothing idle");
            }
        }
    })
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/config", get(config_view))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/mode", put(set_mode))
        .route(
            "/api/sessions/{id}/pdf",
            post(upload_pdf).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/sessions/{id}/text", put(set_text))
        .route("/api/sessions/{id}/clear", post(clear_session))
        .route("/api/sessions/{id}/summary", get(summary_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Errors ───────────────────────────────────────────────────────────────

/// JSON error response: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match e {
            SessionError::NotFound => StatusCode::NOT_FOUND,
            SessionError::WrongMode { .. } => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// ── Page and config ──────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct ConfigView {
    min_length: u32,
    max_length: u32,
    default_length: u32,
    model: String,
    project: String,
    llm_configured: bool,
    warning: Option<&'static str>,
}

async fn config_view(State(state): State<Arc<AppState>>) -> Json<ConfigView> {
    let configured = state.llm_configured();
    Json(ConfigView {
        min_length: MIN_SUMMARY_WORDS,
        max_length: MAX_SUMMARY_WORDS,
        default_length: DEFAULT_SUMMARY_WORDS,
        model: state.config.model.clone(),
        project: state.secrets.project().to_string(),
        llm_configured: configured,
        warning: (!configured).then_some(MISSING_KEY_WARNING),
    })
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Created {
    id: Uuid,
    session: SessionView,
}

async fn create_session(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let id = state.sessions.create().await;
    let session = state.sessions.get(&id).await?.view();
    Ok((StatusCode::CREATED, Json(Created { id, session })).into_response())
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.get(&id).await?.view()))
}

#[derive(Debug, Deserialize)]
struct ModeRequest {
    mode: InputMode,
}

async fn set_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ModeRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .sessions
        .update(&id, |s| {
            s.set_mode(req.mode);
            s.view()
        })
        .await?;
    Ok(Json(view))
}

async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

    if !bytes.starts_with(b"%PDF") {
        return Err(ApiError::bad_request(format!(
            "'{file_name}' is not a PDF"
        )));
    }

    info!(session = %id, "Uploaded '{}' ({} bytes)", file_name, bytes.len());
    let pdf = UploadedPdf {
        file_name,
        bytes: bytes.to_vec(),
    };
    let view = state
        .sessions
        .update(&id, move |s| s.set_pdf(pdf).map(|_| s.view()))
        .await??;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    text: String,
}

async fn set_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .sessions
        .update(&id, move |s| s.set_text(req.text).map(|_| s.view()))
        .await??;
    Ok(Json(view))
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .sessions
        .update(&id, |s| {
            s.reset();
            s.view()
        })
        .await?;
    Ok(Json(view))
}

// ── Summary stream ───────────────────────────────────────────────────────

/// One server-sent event of the summary stream.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UiEvent {
    Segments {
        kept: usize,
        produced: usize,
        truncated: bool,
    },
    Progress {
        done: usize,
        total: usize,
        fraction: f32,
    },
    Render {
        text: String,
    },
    Done {
        summary: String,
        stats: SummaryStats,
    },
    Error {
        class: ErrorClass,
        message: String,
    },
}

impl UiEvent {
    fn from_error(e: &SummaryError) -> Self {
        UiEvent::Error {
            class: e.class(),
            message: e.user_message().to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Segments { .. } => "segments",
            UiEvent::Progress { .. } => "progress",
            UiEvent::Render { .. } => "render",
            UiEvent::Done { .. } => "done",
            UiEvent::Error { .. } => "error",
        }
    }

    fn into_sse(self) -> Event {
        let data = serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string());
        Event::default().event(self.name()).data(data)
    }
}

/// Forwards pipeline events to one SSE response.
struct ChannelProgress {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelProgress {
    fn emit(&self, event: UiEvent) {
        // Receiver gone: the browser closed the stream.
        let _ = self.tx.send(event);
    }
}

impl SummaryProgressCallback for ChannelProgress {
    fn on_segments_ready(&self, kept: usize, produced: usize) {
        self.emit(UiEvent::Segments {
            kept,
            produced,
            truncated: produced > kept,
        });
    }

    fn on_map_progress(&self, done: usize, total: usize, fraction: f32) {
        self.emit(UiEvent::Progress {
            done,
            total,
            fraction,
        });
    }

    fn on_summary_render(&self, text: &str) {
        self.emit(UiEvent::Render {
            text: text.to_string(),
        });
    }
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    length: Option<u32>,
}

async fn summary_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let source = state.sessions.get(&id).await?.to_source();
    let length = query
        .length
        .unwrap_or(DEFAULT_SUMMARY_WORDS)
        .clamp(MIN_SUMMARY_WORDS, MAX_SUMMARY_WORDS);

    let (tx, rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut config = state.config.clone();
    config.summary_length = length;
    let progress: ProgressCallback = Arc::new(ChannelProgress { tx: tx.clone() });
    config.progress_callback = Some(progress);

    info!(session = %id, mode = %source.mode(), length, "Starting summary");
    tokio::spawn(async move {
        let event = match summarize_with_secrets(source, &config, &state.secrets).await {
            Ok(output) => UiEvent::Done {
                summary: output.summary,
                stats: output.stats,
            },
            Err(e) => {
                warn!(session = %id, error = %e, "Summary failed");
                UiEvent::from_error(&e)
            }
        };
        let _ = tx.send(event);
    });

    use tokio_stream::StreamExt;
    let events = UnboundedReceiverStream::new(rx).map(|event| Ok(event.into_sse()));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
