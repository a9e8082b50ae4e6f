//! Embedding provider trait and factory.

use super::providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
use crate::types::IndexMetadata;
use resume_core::config::EmbeddingSettings;
use resume_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Whether vectors stored under `metadata` are comparable with `provider`'s.
///
/// Fields absent from the metadata are not compared.
pub fn matches_metadata(provider: &dyn EmbeddingProvider, metadata: &IndexMetadata) -> bool {
    let provider_ok = metadata
        .embedding_provider
        .as_deref()
        .map_or(true, |p| p == provider.provider_name());
    let model_ok = metadata
        .embedding_model
        .as_deref()
        .map_or(true, |m| m == provider.model_name());
    let dims_ok = metadata
        .dimensions
        .map_or(true, |d| d == provider.dimensions());

    provider_ok && model_ok && dims_ok
}

/// Create an embedding provider based on configuration.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let model = settings.resolved_model();
    let dimensions = settings.resolved_dimensions();

    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(dimensions))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            settings.endpoint.clone(),
            model,
            dimensions,
        )?)),

        "openai" => {
            let api_key = settings.api_key().ok_or_else(|| {
                AppError::Config("OpenAI embeddings require an API key".to_string())
            })?;
            Ok(Arc::new(OpenAiProvider::new(
                settings.endpoint.clone(),
                api_key,
                model,
                dimensions,
            )?))
        }

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, openai, ollama",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_trigram_provider() {
        let provider = create_provider(&settings("trigram")).unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_provider_uses_model_defaults() {
        let provider = create_provider(&settings("ollama")).unwrap();
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_openai_requires_key() {
        let mut s = settings("openai");
        s.api_key_env = Some("RESUME_TEST_EMBED_KEY_NEVER_SET".to_string());
        assert!(create_provider(&s).is_err());
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&settings("unknown"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[test]
    fn test_matches_metadata() {
        let provider = TrigramProvider::new(384);
        let mut metadata = IndexMetadata {
            content_hash: "h".to_string(),
            chunk_count: 1,
            embedding_provider: Some("trigram".to_string()),
            embedding_model: Some("trigram-v1".to_string()),
            dimensions: Some(384),
            built_at: None,
        };
        assert!(matches_metadata(&provider, &metadata));

        metadata.dimensions = Some(768);
        assert!(!matches_metadata(&provider, &metadata));

        metadata.dimensions = None;
        metadata.embedding_provider = None;
        metadata.embedding_model = None;
        assert!(matches_metadata(&provider, &metadata));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&settings("trigram")).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
