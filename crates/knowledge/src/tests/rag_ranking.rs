//! Tests for retrieval ranking through the vector index.

use super::support::KeywordEmbedder;
use crate::embeddings::EmbeddingProvider;
use crate::types::Chunk;
use crate::vector_index::VectorIndex;
use tempfile::TempDir;

fn chunk(text: &str) -> Chunk {
    Chunk::new(text, "resume.txt", Some(0))
}

async fn built_index(temp: &TempDir, chunks: Vec<Chunk>) -> (VectorIndex, std::sync::Arc<KeywordEmbedder>) {
    let embedder = KeywordEmbedder::new();
    let index = VectorIndex::new(temp.path().join("index"));
    index.build(chunks, embedder.as_ref(), "hash").await.unwrap();
    (index, embedder)
}

#[tokio::test]
async fn test_relevant_chunk_ranks_first() {
    let temp = TempDir::new().unwrap();
    let (index, embedder) = built_index(
        &temp,
        vec![
            chunk("Interests: hiking and chess"),
            chunk("Led the payments platform team at Acme"),
            chunk("Education: State University"),
        ],
    )
    .await;

    let query = embedder.embed("payments experience?").await.unwrap();
    let results = index.search(&query, 1, 3, 1.0).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "Led the payments platform team at Acme");
}

#[tokio::test]
async fn test_diversity_skips_near_duplicates() {
    let temp = TempDir::new().unwrap();
    let (index, embedder) = built_index(
        &temp,
        vec![
            chunk("Python developer, Python tooling"),
            chunk("Python scripting and Python services"),
            chunk("Python and Rust at Acme"),
        ],
    )
    .await;

    let query = embedder.embed("Python").await.unwrap();

    let top_k = index.search(&query, 2, 3, 1.0).await.unwrap();
    assert_eq!(top_k[0].text, "Python developer, Python tooling");
    assert_eq!(top_k[1].text, "Python scripting and Python services");

    let diverse = index.search(&query, 2, 3, 0.3).await.unwrap();
    assert_eq!(diverse[0].text, "Python developer, Python tooling");
    assert_eq!(diverse[1].text, "Python and Rust at Acme");
}

#[tokio::test]
async fn test_k_beyond_index_size_returns_everything() {
    let temp = TempDir::new().unwrap();
    let (index, embedder) = built_index(
        &temp,
        vec![chunk("Rust"), chunk("Python")],
    )
    .await;

    let query = embedder.embed("Rust").await.unwrap();
    let results = index.search(&query, 4, 12, 0.7).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "Rust");
}
