//! Embedding providers.
//!
//! Provider-agnostic embedding generation: a remote API, a local model
//! server, or an offline hashing embedder, selected by name.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, matches_metadata, EmbeddingProvider};
pub use providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
