//! LLM integration crate for the Resume Assistant.
//!
//! This crate provides a provider-agnostic abstraction for chat completions.
//! Requests carry a system instruction, prior conversation turns and the
//! current user prompt; providers translate them to their wire format.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: `/v1/chat/completions` and compatible endpoints
//!
//! Clients built by [`create_client`] are wrapped in a [`FallbackClient`]:
//! a streaming attempt first, then one single-shot attempt.
//!
//! # Example
//! ```no_run
//! use resume_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod fallback;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    collect_stream, ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk,
    LlmUsage, Role,
};
pub use factory::create_client;
pub use fallback::FallbackClient;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
