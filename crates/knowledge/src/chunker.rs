//! Recursive character text splitting with configurable size and overlap.
//!
//! Text is split on the coarsest separator it contains; pieces that fit are
//! merged greedily up to the target size, pieces that do not are split again
//! with the next finer separator. Sizes count characters, never bytes.

use crate::config::ChunkOptions;
use std::collections::VecDeque;

/// Separator preference, coarsest first. The empty separator is a hard cut.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "•", "\n", ".", " ", ""];

/// Split `text` into trimmed, non-empty chunks of at most `chunk_size` chars.
pub fn split_text(text: &str, options: &ChunkOptions) -> Vec<String> {
    if text.trim().is_empty() || options.chunk_size == 0 {
        return vec![];
    }

    let overlap = options.chunk_overlap.min(options.chunk_size.saturating_sub(1));
    let chunks = split_recursive(text, DEFAULT_SEPARATORS, options.chunk_size, overlap);

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        options.chunk_size,
        overlap
    );

    chunks
}

fn split_recursive(text: &str, separators: &[&str], size: usize, overlap: usize) -> Vec<String> {
    let idx = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));

    let separator = separators.get(idx).copied().unwrap_or("");
    if separator.is_empty() {
        return hard_split(text, size, overlap);
    }
    let finer = &separators[idx + 1..];

    let mut chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    // Separators stay attached to the end of the piece they terminate
    for piece in text.split_inclusive(separator) {
        if char_len(piece) <= size {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, size, overlap));
            fitting.clear();
        }

        if finer.is_empty() {
            chunks.extend(hard_split(piece, size, overlap));
        } else {
            chunks.extend(split_recursive(piece, finer, size, overlap));
        }
    }

    if !fitting.is_empty() {
        chunks.extend(merge_pieces(&fitting, size, overlap));
    }

    chunks
}

/// Greedily merge pieces up to `size`, carrying up to `overlap` chars of
/// trailing pieces into the next chunk.
fn merge_pieces(pieces: &[&str], size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);

        if total + len > size && !window.is_empty() {
            push_trimmed(&mut chunks, window.iter().copied().collect::<String>());

            while total > overlap || (total + len > size && total > 0) {
                match window.pop_front() {
                    Some(first) => total -= char_len(first),
                    None => break,
                }
            }
        }

        window.push_back(piece);
        total += len;
    }

    if !window.is_empty() {
        push_trimmed(&mut chunks, window.iter().copied().collect::<String>());
    }

    chunks
}

/// Cut on character boundaries when no separator applies.
fn hard_split(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        push_trimmed(&mut chunks, chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
