//! Mapping retrieved chunks to user-facing source references.

use crate::rag::types::SourceRef;
use crate::types::Chunk;
use std::collections::HashSet;
use std::path::Path;

/// Maximum snippet length for source references, in characters.
pub const MAX_SNIPPET_LENGTH: usize = 150;

/// Map chunks to source references, one per (source, location).
pub fn map_chunks_to_sources(chunks: &[Chunk]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for chunk in chunks {
        let source = source_name(&chunk.source_id);
        let location = chunk.location();

        if seen.insert((source.clone(), location.clone())) {
            sources.push(SourceRef {
                source,
                location,
                snippet: truncate_snippet(chunk.text.trim(), MAX_SNIPPET_LENGTH),
            });
        }
    }

    sources
}

/// File name of a source path, or the id itself.
fn source_name(source_id: &str) -> String {
    Path::new(source_id)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_id.to_string())
}

/// Truncate to `max_chars`, preferring a word boundary.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}
