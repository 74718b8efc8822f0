//! Recursive character splitting and the segment cap.
//!
//! [`TextSplitter`] splits on the coarsest separator present in the text
//! (paragraph break, then line break, then space, then between characters),
//! recursing into any piece that is still too long, and greedily merges
//! neighbouring pieces back up to `chunk_size` characters. When a segment is
//! emitted, pieces from its tail are carried into the next segment until at
//! most `chunk_overlap` characters remain, which is what produces the overlap.
//!
//! Separators are kept at the start of the piece that follows them, so
//! joining pieces needs no extra glue. All lengths are in `char`s.

use crate::pipeline::input::TextUnit;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Separators tried in order, coarsest first. `""` means "between chars".
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character splitter.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty segments of at most
    /// `chunk_size` characters, in document order.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = "";
        let mut finer: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut out = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                out.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                out.push(piece.to_string());
            } else {
                out.extend(self.split_recursive(piece, finer));
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge(&fitting));
        }
        out
    }

    /// Greedily pack `pieces` (each shorter than `chunk_size`) into segments.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut segments = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(seg) = join_trimmed(&window) {
                    segments.push(seg);
                }
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(first) => total -= char_len(first),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        if let Some(seg) = join_trimmed(&window) {
            segments.push(seg);
        }
        segments
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1200, 100)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split on `sep`, keeping each separator at the start of the next piece.
/// An empty separator splits between characters.
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    if sep.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    let mut bounds: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices(sep).map(|(i, _)| i))
        .collect();
    bounds.push(text.len());
    bounds
        .windows(2)
        .map(|w| &text[w[0]..w[1]])
        .filter(|s| !s.is_empty())
        .collect()
}

// ── Segment cap ──────────────────────────────────────────────────────────

/// Segments selected for the map stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    /// The first `max_segments` segments, in document order.
    pub segments: Vec<String>,
    /// How many segments the splitter produced before the cap.
    pub produced: usize,
}

impl Segments {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when trailing segments were dropped.
    pub fn truncated(&self) -> bool {
        self.produced > self.segments.len()
    }
}

/// Split every unit independently and concatenate the results in order.
pub fn split_units(units: &[TextUnit], splitter: &TextSplitter) -> Vec<String> {
    units
        .iter()
        .flat_map(|unit| splitter.split_text(&unit.text))
        .collect()
}

/// Keep the first `max_segments` segments.
pub fn cap_segments(all: Vec<String>, max_segments: usize) -> Segments {
    let produced = all.len();
    let segments: Vec<String> = all.into_iter().take(max_segments).collect();
    if produced > segments.len() {
        warn!(
            "Document produced {} segments; only the first {} are summarized",
            produced,
            segments.len()
        );
    }
    Segments { segments, produced }
}

/// [`split_units`] followed by [`cap_segments`].
pub fn segment_units(units: &[TextUnit], splitter: &TextSplitter, max_segments: usize) -> Segments {
    let all = split_units(units, splitter);
    debug!("Split {} text units into {} segments", units.len(), all.len());
    cap_segments(all, max_segments)
}
