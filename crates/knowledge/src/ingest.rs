//! Document ingestion: load, normalize, chunk, attach provenance.

use crate::chunker::split_text;
use crate::config::ChunkOptions;
use crate::parser::{normalize_whitespace, DocumentLoader};
use crate::types::Chunk;
use resume_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Turn the source document into chunks.
///
/// Each page is normalized and chunked on its own, so no chunk spans a page
/// boundary. Fails with `NotFound` if the file is missing and
/// `EmptyDocument` if no text survives normalization.
pub fn ingest(
    loader: &dyn DocumentLoader,
    path: &Path,
    options: &ChunkOptions,
) -> AppResult<Vec<Chunk>> {
    if !path.exists() {
        return Err(AppError::NotFound(path.display().to_string()));
    }

    let source_id = path.display().to_string();
    let pages = loader.load_pages(path)?;

    let mut chunks = Vec::new();
    for page in &pages {
        let text = normalize_whitespace(&page.text);
        if text.is_empty() {
            continue;
        }

        chunks.extend(
            split_text(&text, options)
                .into_iter()
                .map(|chunk| Chunk::new(chunk, source_id.clone(), page.page)),
        );
    }

    if chunks.is_empty() {
        return Err(AppError::EmptyDocument(source_id));
    }

    tracing::info!(
        "Ingested {} chunks from {} page(s) of {} using {}",
        chunks.len(),
        pages.len(),
        source_id,
        loader.name()
    );

    Ok(chunks)
}

/// SHA-256 of the file's exact bytes, lowercase hex.
pub fn fingerprint_file(path: &Path) -> AppResult<String> {
    if !path.exists() {
        return Err(AppError::NotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    Ok(calculate_hash(&bytes))
}

/// Calculate SHA256 hash of content.
pub fn calculate_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
