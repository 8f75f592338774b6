//! Transcript segment chunking
//!
//! Splits each transcript segment's text into pieces no longer than a fixed
//! character bound, preferring paragraph, sentence and word boundaries over
//! hard cuts. Splitting is lossless: concatenating the pieces of a segment
//! reproduces its text byte for byte, and a segment already within the bound
//! becomes exactly one chunk.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyzerError, Result};
use crate::transcript::TranscriptSegment;

/// Boundary preference order: paragraph, line, sentence, word
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// One bounded-length piece of transcript text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Chunk text, verbatim from the source segment
    pub text: String,
    /// Position in the flat chunk sequence (segment order, then split order)
    pub order: usize,
}

/// Deterministic text splitter over transcript segments
pub struct SegmentChunker {
    max_chunk_size: usize,
}

impl SegmentChunker {
    /// Create a chunker with the given size bound (characters, minimum 1)
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    /// Split segments into a flat ordered chunk sequence
    pub fn chunk(&self, segments: &[TranscriptSegment]) -> Result<Vec<TranscriptChunk>> {
        if segments.is_empty() {
            return Err(AnalyzerError::InvalidInput(
                "transcript has no segments".to_string(),
            ));
        }

        let mut chunks = Vec::new();
        for segment in segments {
            for text in split_recursive(&segment.text, self.max_chunk_size, SEPARATORS) {
                chunks.push(TranscriptChunk {
                    text,
                    order: chunks.len(),
                });
            }
        }

        debug!(
            "Chunked {} segments into {} chunks (max size {})",
            segments.len(),
            chunks.len(),
            self.max_chunk_size
        );
        Ok(chunks)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into pieces of at most `max` characters, trying each
/// separator in preference order and recursing with the remaining separators
/// on any piece that is still too long. Separators stay attached to the
/// preceding piece so no characters are dropped.
fn split_recursive(text: &str, max: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= max {
        return vec![text.to_string()];
    }

    let Some((separator, rest)) = separators.split_first() else {
        return hard_split(text, max);
    };
    if !text.contains(separator) {
        return split_recursive(text, max, rest);
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for part in text.split_inclusive(separator) {
        let part_len = char_len(part);
        if part_len > max {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.extend(split_recursive(part, max, rest));
        } else if char_len(&current) + part_len > max {
            pieces.push(std::mem::replace(&mut current, part.to_string()));
        } else {
            current.push_str(part);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Last resort: cut on character boundaries
fn hard_split(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max)
        .map(|piece| piece.iter().collect())
        .collect()
}
