//! Pipeline stages for map-reduce summarization.
//!
//! Each submodule implements exactly one step, so each can be tested
//! against a scripted [`crate::llm::LlmClient`] without a network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ chunk ──▶ map ──▶ reduce ──▶ render
//! (PDF/text) (split+cap) (N calls) (1 streamed call) (cursor)
//! ```
//!
//! 1. [`input`]  — validate the upload or paste and produce text units;
//!    PDF pages come from [`pdf`], which runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 2. [`chunk`]  — recursive character splitting, then keep the first
//!    `max_segments` segments
//! 3. [`map`]    — one sequential LLM call per segment, reporting progress
//! 4. [`reduce`] — join the partials and open the streamed final call
//!
//! Folding the stream into the displayed summary lives in
//! [`crate::render`].

pub mod chunk;
pub mod input;
pub mod map;
pub mod pdf;
pub mod reduce;
