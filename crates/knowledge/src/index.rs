//! SQLite storage for embedded chunks.

use crate::types::{Chunk, EmbeddedChunk};
use resume_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// Create a fresh index database at `db_path`, replacing nothing.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            ordinal INTEGER PRIMARY KEY,
            text TEXT NOT NULL,
            source_id TEXT NOT NULL,
            page INTEGER,
            embedding BLOB NOT NULL
        );
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Write all entries in one transaction, preserving their order.
pub fn write_entries(conn: &mut Connection, entries: &[EmbeddedChunk]) -> AppResult<()> {
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Knowledge(format!("Failed to start transaction: {}", e)))?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO chunks (ordinal, text, source_id, page, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

        for (ordinal, entry) in entries.iter().enumerate() {
            stmt.execute(params![
                ordinal as i64,
                entry.chunk.text,
                entry.chunk.source_id,
                entry.chunk.page.map(i64::from),
                embedding_to_bytes(&entry.embedding),
            ])
            .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
        }
    }

    tx.commit()
        .map_err(|e| AppError::Knowledge(format!("Failed to commit index: {}", e)))?;

    Ok(())
}

/// Read every entry back in insertion order.
pub fn read_entries(db_path: &Path) -> AppResult<Vec<EmbeddedChunk>> {
    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    let mut stmt = conn
        .prepare("SELECT text, source_id, page, embedding FROM chunks ORDER BY ordinal")
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let page: Option<i64> = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((
                Chunk::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    page.map(|p| p as u32),
                ),
                embedding_bytes,
            ))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

    let mut entries = Vec::new();
    for row in rows {
        let (chunk, bytes) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;
        entries.push(EmbeddedChunk {
            chunk,
            embedding: bytes_to_embedding(&bytes)?,
        });
    }

    tracing::debug!("Read {} chunks from {:?}", entries.len(), db_path);
    Ok(entries)
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(text: &str, page: Option<u32>, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk::new(text, "resume.txt", page),
            embedding,
        }
    }

    #[test]
    fn test_write_and_read_preserves_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("index.sqlite");

        let mut conn = init_index(&path).unwrap();
        write_entries(
            &mut conn,
            &[
                entry("second in text", Some(1), vec![0.0, 1.0]),
                entry("first in text", None, vec![1.0, -0.5]),
            ],
        )
        .unwrap();
        drop(conn);

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].chunk.text, "second in text");
        assert_eq!(entries[0].chunk.page, Some(1));
        assert_eq!(entries[1].chunk.page, None);
        assert_eq!(entries[1].embedding, vec![1.0, -0.5]);
    }

    #[test]
    fn test_bytes_roundtrip_rejects_truncated_blob() {
        let bytes = embedding_to_bytes(&[0.25, 3.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), vec![0.25, 3.5]);
        assert!(bytes_to_embedding(&bytes[..7]).is_err());
    }
}
