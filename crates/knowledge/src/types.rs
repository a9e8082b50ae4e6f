//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text of one page as reported by a document loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Zero-based page index; `None` for sources without pages
    pub page: Option<u32>,
    pub text: String,
}

/// A bounded span of source text with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,

    /// Source path as given to the ingestor
    pub source_id: String,

    /// Zero-based page index
    pub page: Option<u32>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_id: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            page,
        }
    }

    /// Page number as shown to people, counted from one.
    pub fn page_number(&self) -> Option<u32> {
        self.page.map(|page| page + 1)
    }

    /// Human-readable location: "page 2" or "document".
    pub fn location(&self) -> String {
        match self.page_number() {
            Some(page) => format!("page {}", page),
            None => "document".to_string(),
        }
    }
}

/// A chunk with its embedding, owned by the vector index.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Metadata persisted next to the index data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// SHA-256 of the exact source bytes the index was built from
    #[serde(rename = "resume_sha256")]
    pub content_hash: String,

    #[serde(rename = "docs_count")]
    pub chunk_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
}

/// One question/answer pair in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

impl Exchange {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Why an index was rebuilt instead of reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildReason {
    /// No usable index on disk
    Missing,
    /// Source bytes differ from the indexed ones
    HashChanged,
    /// Stored vectors come from a different embedder
    EmbedderChanged,
    /// Explicitly requested
    Forced,
}

impl RebuildReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::HashChanged => "hash_changed",
            Self::EmbedderChanged => "embedder_changed",
            Self::Forced => "forced",
        }
    }
}

/// Result of preparing the index at startup or on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IndexOutcome {
    Reused {
        metadata: IndexMetadata,
    },
    Rebuilt {
        reason: RebuildReason,
        metadata: IndexMetadata,
    },
}

impl IndexOutcome {
    pub fn metadata(&self) -> &IndexMetadata {
        match self {
            Self::Reused { metadata } | Self::Rebuilt { metadata, .. } => metadata,
        }
    }

    pub fn was_rebuilt(&self) -> bool {
        matches!(self, Self::Rebuilt { .. })
    }
}

/// Index readiness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub metadata: Option<IndexMetadata>,
}
