//! LLM provider factory.
//!
//! This module builds LLM clients from application configuration. It handles
//! provider resolution, secret injection and the streaming fallback wrapper.

use crate::client::LlmClient;
use crate::fallback::FallbackClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use resume_core::config::LlmSettings;
use resume_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the configured provider.
///
/// This function performs the following:
/// 1. Matches the provider string to a known provider type
/// 2. Resolves required secrets from environment variables
/// 3. Creates the appropriate client implementation
/// 4. Wraps it in a [`FallbackClient`]
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - Required secrets are missing
pub fn create_client(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;

    let endpoint = settings
        .endpoint
        .clone()
        .unwrap_or_else(|| provider.default_endpoint().to_string());

    let client: Arc<dyn LlmClient> = match provider {
        ProviderType::Ollama => Arc::new(OllamaClient::with_base_url(endpoint)),
        ProviderType::OpenAI => {
            let api_key = settings.api_key().ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            Arc::new(OpenAiClient::with_base_url(endpoint, api_key))
        }
    };

    tracing::debug!(
        "Created {} client (model: {})",
        provider.as_str(),
        settings.resolved_model()
    );

    Ok(Arc::new(FallbackClient::new(client)))
}
