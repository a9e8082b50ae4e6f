//! The answer pipeline: condense, embed, retrieve, generate.

use crate::config::{GenerationOptions, RetrievalOptions};
use crate::embeddings::EmbeddingProvider;
use crate::rag::condense::QueryCondenser;
use crate::rag::generate::{complete_prompt, render_prompt};
use crate::rag::types::QueryContext;
use crate::types::Chunk;
use crate::vector_index::VectorIndex;
use resume_core::{AppError, AppResult, PipelineStage};
use resume_llm::{ChatMessage, LlmClient};
use resume_prompt::PromptDefinition;
use std::collections::HashMap;
use std::sync::Arc;

/// Separator placed between retrieved passages in the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Grounded question answering over the vector index.
///
/// Each stage failure aborts the whole answer and is reported as a single
/// `AppError::Pipeline` naming the stage.
pub struct AnswerChain {
    condenser: QueryCondenser,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    client: Arc<dyn LlmClient>,
    answer_prompt: PromptDefinition,
    retrieval: RetrievalOptions,
    generation: GenerationOptions,
}

impl AnswerChain {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        client: Arc<dyn LlmClient>,
        condense_prompt: PromptDefinition,
        answer_prompt: PromptDefinition,
        retrieval: RetrievalOptions,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            condenser: QueryCondenser::new(Arc::clone(&client), condense_prompt, generation.clone()),
            index,
            embedder,
            client,
            answer_prompt,
            retrieval,
            generation,
        }
    }

    /// Answer `raw_question` given the session's prior turns.
    pub async fn answer(
        &self,
        raw_question: &str,
        history: &[ChatMessage],
    ) -> AppResult<QueryContext> {
        let standalone_question = self
            .condenser
            .condense(raw_question, history)
            .await
            .map_err(|e| AppError::pipeline(PipelineStage::Condense, e))?;

        let query = self
            .embedder
            .embed(&standalone_question)
            .await
            .map_err(|e| AppError::pipeline(PipelineStage::Embed, e))?;

        let retrieved = self
            .index
            .search(
                &query,
                self.retrieval.k,
                self.retrieval.fetch_k,
                self.retrieval.lambda,
            )
            .await
            .map_err(|e| AppError::pipeline(PipelineStage::Retrieve, e))?;

        tracing::info!(
            "Retrieved {} passages for '{}'",
            retrieved.len(),
            standalone_question
        );

        let answer = self
            .generate(&standalone_question, &build_context(&retrieved))
            .await
            .map_err(|e| AppError::pipeline(PipelineStage::Generate, e))?;

        Ok(QueryContext {
            raw_question: raw_question.to_string(),
            standalone_question,
            retrieved,
            answer,
        })
    }

    async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context.to_string());
        let prompt = render_prompt(&self.answer_prompt, variables)?;

        complete_prompt(self.client.as_ref(), prompt, &[], &self.generation).await
    }
}

/// Join trimmed passage texts for the answer prompt.
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.trim())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context() {
        let chunks = vec![
            Chunk::new("  First chunk ", "cv.txt", None),
            Chunk::new("Second chunk", "cv.txt", None),
        ];

        assert_eq!(build_context(&chunks), "First chunk\n\n---\n\nSecond chunk");
        assert_eq!(build_context(&[]), "");
    }
}
