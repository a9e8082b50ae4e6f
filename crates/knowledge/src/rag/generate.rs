//! Language model calls shared by the condenser and the answer chain.

use crate::config::GenerationOptions;
use resume_core::{AppError, AppResult};
use resume_llm::{ChatMessage, LlmClient, LlmRequest};
use resume_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::collections::HashMap;

/// Render a prompt for a model call.
///
/// A template that cannot be rendered is a failed generation.
pub(crate) fn render_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    build_prompt(definition, variables).map_err(|e| {
        AppError::Generation(format!("Cannot render prompt {}: {}", definition.id, e))
    })
}

/// Send a rendered prompt after `history` and return the trimmed reply.
///
/// Every failure comes back as `AppError::Generation`.
pub(crate) async fn complete_prompt(
    client: &dyn LlmClient,
    prompt: BuiltPrompt,
    history: &[ChatMessage],
    generation: &GenerationOptions,
) -> AppResult<String> {
    let mut request = LlmRequest::new(prompt.user, generation.model.clone())
        .with_history(history.to_vec())
        .with_temperature(generation.temperature);

    if let Some(system) = prompt.system {
        request = request.with_system(system);
    }
    if let Some(max_tokens) = generation.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    tracing::debug!(
        "Calling {} ({}) with {} prior turns",
        client.provider_name(),
        request.model,
        history.len()
    );

    let response = client.complete(&request).await.map_err(|e| match e {
        AppError::Generation(_) => e,
        other => AppError::Generation(other.to_string()),
    })?;

    Ok(response.content.trim().to_string())
}
