//! Text chunking with configurable size and overlap.

use crate::types::{ChunkCandidate, EpisodeMetadata};

/// Chunk text into overlapping segments.
///
/// Sizes are in bytes, with both ends snapped to UTF-8 boundaries. Every
/// chunk carries a copy of the episode metadata.
pub fn chunk_text(
    text: &str,
    metadata: &EpisodeMetadata,
    chunk_size: usize,
    overlap: usize,
) -> Vec<ChunkCandidate> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    // Move forward by (chunk_size - overlap)
    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // chunk_size smaller than one char
            end = next_boundary(text, start + 1);
        }

        let trimmed = text[start..end].trim();
        if !trimmed.is_empty() {
            chunks.push(ChunkCandidate {
                position,
                text: trimmed.to_string(),
                metadata: metadata.clone(),
            });
            position += 1;
        }

        if end == text.len() {
            break;
        }

        start = next_boundary(text, start + step);
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

fn next_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}
