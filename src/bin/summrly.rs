//! Web server binary for summrly.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SummaryConfig`, loads secrets, and serves the single-page UI.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use summrly::config::{DEFAULT_GROQ_BASE_URL, DEFAULT_MODEL};
use summrly::pipeline::pdf::PdfiumLoader;
use summrly::web::{router, spawn_session_sweeper, AppState, MISSING_KEY_WARNING};
use summrly::{Secrets, SummaryConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"SECRETS:
  GROQ_API_KEY        Groq API key (required unless --provider is set)
  LANGCHAIN_API_KEY   Optional tracing key
  LANGCHAIN_PROJECT   Tracing project name (default: Summrly)

  Values are read from the secrets file first; environment variables win.

  secrets.toml:
    GROQ_API_KEY = "gsk_..."

PDF ENGINE:
  Text is extracted with pdfium. Set PDFIUM_LIB_PATH=/path/to/libpdfium
  or install pdfium system-wide.
"#;

const SWEEP_EVERY: Duration = Duration::from_secs(60);

/// Summarize PDFs and pasted text with a hosted LLM.
#[derive(Parser, Debug)]
#[command(
    name = "summrly",
    version,
    about = "Summarize PDFs and pasted text with a hosted LLM",
    long_about = "Serves a single-page web UI. Upload a PDF or paste text, pick a target \
length, and get a streamed summary produced in two stages: each section is summarized \
on its own, then the partial summaries are merged.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "SUMMRLY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "SUMMRLY_PORT", default_value_t = 8501)]
    port: u16,

    /// TOML secrets file. A missing file is fine when the environment has the keys.
    #[arg(long, env = "SUMMRLY_SECRETS", default_value = "secrets.toml")]
    secrets: PathBuf,

    /// LLM model ID.
    #[arg(long, env = "SUMMRLY_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Groq-compatible API.
    #[arg(long, env = "GROQ_BASE_URL", default_value = DEFAULT_GROQ_BASE_URL)]
    base_url: String,

    /// Use an edgequake-llm provider (openai, anthropic, gemini, ollama, …)
    /// instead of Groq. The provider reads its own API key variable.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SUMMRLY_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "SUMMRLY_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Minutes a browser session may sit idle before its input is dropped.
    #[arg(long, env = "SUMMRLY_SESSION_TTL_MINS", default_value_t = 60)]
    session_ttl_mins: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SUMMRLY_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Secrets and config ───────────────────────────────────────────────
    let secrets = Secrets::load(&cli.secrets)
        .with_context(|| format!("Failed to load secrets from {:?}", cli.secrets))?;

    let loader = match cli.pdfium_lib {
        Some(ref path) => PdfiumLoader::with_library(path),
        None => PdfiumLoader::new(),
    };

    let mut builder = SummaryConfig::builder()
        .model(&cli.model)
        .base_url(&cli.base_url)
        .temperature(cli.temperature)
        .pdf_loader(Arc::new(loader));
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name);
    }
    let config = builder.build().context("Invalid configuration")?;

    let state = Arc::new(AppState::new(config, secrets));
    if !state.llm_configured() {
        warn!("{}", MISSING_KEY_WARNING);
    }
    if state.secrets.tracing_enabled() {
        info!(project = %state.secrets.project(), "Run tracing enabled");
    }

    let ttl = Duration::from_secs(cli.session_ttl_mins.max(1) * 60);
    spawn_session_sweeper(Arc::clone(&state), ttl, SWEEP_EVERY.min(ttl));

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cli.host, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Summrly listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;
    Ok(())
}
