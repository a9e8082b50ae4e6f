//! Follow-up question rewriting.

use crate::config::GenerationOptions;
use crate::rag::generate::{complete_prompt, render_prompt};
use resume_core::AppResult;
use resume_llm::{ChatMessage, LlmClient};
use resume_prompt::PromptDefinition;
use std::collections::HashMap;
use std::sync::Arc;

/// Rewrites a follow-up question into a standalone one using the history.
pub struct QueryCondenser {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    generation: GenerationOptions,
}

impl QueryCondenser {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            client,
            prompt,
            generation,
        }
    }

    /// Standalone form of `question`.
    ///
    /// Without history the question is returned as is and the model is not
    /// called. An empty model reply also falls back to the raw question.
    pub async fn condense(&self, question: &str, history: &[ChatMessage]) -> AppResult<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        let prompt = render_prompt(&self.prompt, variables)?;

        let standalone =
            complete_prompt(self.client.as_ref(), prompt, history, &self.generation).await?;

        if standalone.is_empty() {
            tracing::warn!("Condenser returned nothing, using the original question");
            return Ok(question.to_string());
        }

        tracing::debug!("Condensed '{}' to '{}'", question, standalone);
        Ok(standalone)
    }
}
