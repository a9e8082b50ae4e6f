//! Knowledge layer of the Resume Assistant.
//!
//! Ingests the resume, keeps a persistent vector index of its passages and
//! answers interview questions grounded in them:
//!
//! - [`ingest`]: load pages, normalize, chunk
//! - [`vector_index`]: SQLite-backed index with MMR search
//! - [`memory`]: bounded per-session history
//! - [`rag`]: condense, retrieve, generate, escalate
//! - [`service`]: [`ResumeAssistant`], the inbound surface

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod mmr;
pub mod notify;
pub mod parser;
pub mod rag;
pub mod service;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::{AssistantSettings, ChunkOptions, GenerationOptions, RetrievalOptions};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use ingest::{fingerprint_file, ingest};
pub use memory::ConversationMemory;
pub use notify::{create_notifier, LogNotifier, Notifier, WebhookNotifier};
pub use parser::{loader_for_path, DocumentLoader, PdfLoader, PlainTextLoader};
pub use rag::{ChatReply, QueryContext, SourceRef};
pub use service::{AssistantComponents, ResumeAssistant};
pub use types::{
    Chunk, Exchange, IndexMetadata, IndexOutcome, IndexStatus, PageText, RebuildReason,
};
pub use vector_index::VectorIndex;
