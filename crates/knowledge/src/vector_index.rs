//! Persistent vector index over the source document's chunks.
//!
//! The index lives in a directory holding `index.sqlite` (the embedded
//! chunks) and `metadata.json`. Metadata is written last and removed first,
//! so a directory without it always reads as "rebuild needed".
//!
//! In memory the index is an immutable [`Snapshot`] behind a
//! `RwLock<Option<Arc<_>>>`: searches clone the `Arc` and score without
//! holding the lock, while build and invalidate hold the write guard for
//! their whole duration.

use crate::config::{get_index_path, get_metadata_path, temp_path, ChunkOptions};
use crate::embeddings::{matches_metadata, EmbeddingProvider};
use crate::index;
use crate::ingest::{fingerprint_file, ingest};
use crate::mmr::mmr_select;
use crate::parser::DocumentLoader;
use crate::types::{
    Chunk, EmbeddedChunk, IndexMetadata, IndexOutcome, IndexStatus, RebuildReason,
};
use chrono::Utc;
use resume_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Snapshot {
    entries: Vec<EmbeddedChunk>,
    metadata: IndexMetadata,
}

impl Snapshot {
    fn dimensions(&self) -> usize {
        self.metadata
            .dimensions
            .or_else(|| self.entries.first().map(|e| e.embedding.len()))
            .unwrap_or(0)
    }
}

/// Vector index bound to one directory on disk.
#[derive(Debug)]
pub struct VectorIndex {
    dir: PathBuf,
    state: RwLock<Option<Arc<Snapshot>>>,
}

impl VectorIndex {
    /// Create an index handle; nothing is read until [`load`](Self::load).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            state: RwLock::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Embed `chunks` and persist them as the new index.
    pub async fn build(
        &self,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        content_hash: &str,
    ) -> AppResult<IndexMetadata> {
        let mut state = self.state.write().await;
        *state = None;
        self.build_locked(&mut state, chunks, embedder, content_hash)
            .await
    }

    /// Invalidate then build, as one exclusive operation.
    pub async fn rebuild(
        &self,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        content_hash: &str,
    ) -> AppResult<IndexMetadata> {
        let mut state = self.state.write().await;
        self.invalidate_locked(&mut state).await?;
        self.build_locked(&mut state, chunks, embedder, content_hash)
            .await
    }

    /// Load the persisted index into memory.
    ///
    /// Returns `None` when anything is missing or inconsistent; the caller
    /// should rebuild in that case.
    pub async fn load(&self) -> AppResult<Option<IndexMetadata>> {
        let mut state = self.state.write().await;

        let dir = self.dir.clone();
        let snapshot = tokio::task::spawn_blocking(move || read_snapshot(&dir))
            .await
            .map_err(|e| AppError::Knowledge(format!("Index read task failed: {}", e)))?;

        match snapshot {
            Some(snapshot) => {
                let metadata = snapshot.metadata.clone();
                tracing::info!(
                    "Loaded index with {} chunks from {:?}",
                    metadata.chunk_count,
                    self.dir
                );
                *state = Some(Arc::new(snapshot));
                Ok(Some(metadata))
            }
            None => {
                *state = None;
                Ok(None)
            }
        }
    }

    /// Diversified search for `query`.
    pub async fn search(
        &self,
        query: &[f32],
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> AppResult<Vec<Chunk>> {
        let snapshot = self
            .state
            .read()
            .await
            .clone()
            .ok_or(AppError::IndexUnavailable)?;

        let dimensions = snapshot.dimensions();
        if query.len() != dimensions {
            return Err(AppError::Knowledge(format!(
                "Query vector has {} dimensions, index has {}",
                query.len(),
                dimensions
            )));
        }

        let candidates: Vec<&[f32]> = snapshot
            .entries
            .iter()
            .map(|e| e.embedding.as_slice())
            .collect();

        let selected = mmr_select(query, &candidates, k, fetch_k, lambda);

        tracing::debug!(
            "Selected {} of {} chunks (k={}, fetch_k={}, lambda={})",
            selected.len(),
            candidates.len(),
            k,
            fetch_k,
            lambda
        );

        Ok(selected
            .into_iter()
            .map(|i| snapshot.entries[i].chunk.clone())
            .collect())
    }

    /// Drop the in-memory snapshot and delete the persisted index.
    ///
    /// Returns whether anything existed.
    pub async fn invalidate(&self) -> AppResult<bool> {
        let mut state = self.state.write().await;
        self.invalidate_locked(&mut state).await
    }

    /// Bring the index in line with the source document.
    ///
    /// Reuses the persisted index when the source bytes and the embedder
    /// match what it was built from; otherwise ingests and rebuilds.
    pub async fn prepare(
        &self,
        source_path: &Path,
        loader: &dyn DocumentLoader,
        embedder: &dyn EmbeddingProvider,
        options: &ChunkOptions,
        force: bool,
    ) -> AppResult<IndexOutcome> {
        let content_hash = fingerprint_file(source_path)?;

        let reason = if force {
            RebuildReason::Forced
        } else {
            match self.stored_metadata().await? {
                None => RebuildReason::Missing,
                Some(stored) if stored.content_hash != content_hash => {
                    RebuildReason::HashChanged
                }
                Some(stored) if !matches_metadata(embedder, &stored) => {
                    RebuildReason::EmbedderChanged
                }
                Some(_) => match self.load().await? {
                    Some(metadata) => {
                        tracing::info!("Source unchanged, reusing index");
                        return Ok(IndexOutcome::Reused { metadata });
                    }
                    None => RebuildReason::Missing,
                },
            }
        };

        tracing::info!("Rebuilding index ({})", reason.as_str());

        let chunks = ingest(loader, source_path, options)?;
        let metadata = self.rebuild(chunks, embedder, &content_hash).await?;

        Ok(IndexOutcome::Rebuilt { reason, metadata })
    }

    /// Readiness plus whatever metadata is known.
    pub async fn status(&self) -> AppResult<IndexStatus> {
        if let Some(snapshot) = self.state.read().await.clone() {
            return Ok(IndexStatus {
                ready: true,
                metadata: Some(snapshot.metadata.clone()),
            });
        }

        Ok(IndexStatus {
            ready: false,
            metadata: self.stored_metadata().await?,
        })
    }

    pub async fn is_ready(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Metadata on disk, without loading the data.
    pub async fn stored_metadata(&self) -> AppResult<Option<IndexMetadata>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || read_metadata(&dir))
            .await
            .map_err(|e| AppError::Knowledge(format!("Metadata read task failed: {}", e)))
    }

    async fn build_locked(
        &self,
        state: &mut Option<Arc<Snapshot>>,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        content_hash: &str,
    ) -> AppResult<IndexMetadata> {
        if chunks.is_empty() {
            return Err(AppError::EmptyDocument(self.dir.display().to_string()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(AppError::Knowledge(format!(
                "Embedding has {} dimensions, expected {}",
                bad.len(),
                dimensions
            )));
        }

        let entries: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();

        let metadata = IndexMetadata {
            content_hash: content_hash.to_string(),
            chunk_count: entries.len(),
            embedding_provider: Some(embedder.provider_name().to_string()),
            embedding_model: Some(embedder.model_name().to_string()),
            dimensions: Some(dimensions),
            built_at: Some(Utc::now()),
        };

        let dir = self.dir.clone();
        let to_write = metadata.clone();
        let entries = tokio::task::spawn_blocking(move || {
            write_index(&dir, &entries, &to_write)?;
            Ok::<_, AppError>(entries)
        })
        .await
        .map_err(|e| AppError::Knowledge(format!("Index write task failed: {}", e)))??;

        tracing::info!(
            "Built index with {} chunks ({} {}d) at {:?}",
            metadata.chunk_count,
            embedder.model_name(),
            dimensions,
            self.dir
        );

        *state = Some(Arc::new(Snapshot {
            entries,
            metadata: metadata.clone(),
        }));

        Ok(metadata)
    }

    async fn invalidate_locked(&self, state: &mut Option<Arc<Snapshot>>) -> AppResult<bool> {
        let had_snapshot = state.take().is_some();

        let dir = self.dir.clone();
        let had_files = tokio::task::spawn_blocking(move || remove_index_files(&dir))
            .await
            .map_err(|e| AppError::Knowledge(format!("Index removal task failed: {}", e)))??;

        if had_snapshot || had_files {
            tracing::info!("Invalidated index at {:?}", self.dir);
        }

        Ok(had_snapshot || had_files)
    }
}

fn read_metadata(dir: &Path) -> Option<IndexMetadata> {
    let path = get_metadata_path(dir);
    let content = fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&content) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::warn!("Ignoring unreadable index metadata {:?}: {}", path, e);
            None
        }
    }
}

fn read_snapshot(dir: &Path) -> Option<Snapshot> {
    let metadata = read_metadata(dir)?;

    let db_path = get_index_path(dir);
    if !db_path.exists() {
        return None;
    }

    let entries = match index::read_entries(&db_path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Ignoring unreadable index data {:?}: {}", db_path, e);
            return None;
        }
    };

    if entries.len() != metadata.chunk_count {
        tracing::warn!(
            "Index metadata lists {} chunks but data holds {}",
            metadata.chunk_count,
            entries.len()
        );
        return None;
    }

    let expected = metadata
        .dimensions
        .or_else(|| entries.first().map(|e| e.embedding.len()));
    if entries
        .iter()
        .any(|e| Some(e.embedding.len()) != expected)
    {
        tracing::warn!("Index data has inconsistent embedding dimensions");
        return None;
    }

    Some(Snapshot { entries, metadata })
}

fn write_index(dir: &Path, entries: &[EmbeddedChunk], metadata: &IndexMetadata) -> AppResult<()> {
    fs::create_dir_all(dir)?;

    let metadata_path = get_metadata_path(dir);
    remove_if_exists(&metadata_path)?;

    let db_path = get_index_path(dir);
    let db_tmp = temp_path(&db_path);
    remove_if_exists(&db_tmp)?;

    let mut conn = index::init_index(&db_tmp)?;
    index::write_entries(&mut conn, entries)?;
    drop(conn);
    fs::rename(&db_tmp, &db_path)?;

    let metadata_tmp = temp_path(&metadata_path);
    fs::write(&metadata_tmp, serde_json::to_string_pretty(metadata)?)?;
    fs::rename(&metadata_tmp, &metadata_path)?;

    Ok(())
}

/// Metadata first, then data.
fn remove_index_files(dir: &Path) -> AppResult<bool> {
    let metadata_path = get_metadata_path(dir);
    let db_path = get_index_path(dir);

    let mut removed = remove_if_exists(&metadata_path)?;
    removed |= remove_if_exists(&db_path)?;
    remove_if_exists(&temp_path(&metadata_path))?;
    remove_if_exists(&temp_path(&db_path))?;

    Ok(removed)
}

fn remove_if_exists(path: &Path) -> AppResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
