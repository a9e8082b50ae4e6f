//! RAG response types.

use crate::types::Chunk;
use serde::{Deserialize, Serialize};

/// A single source reference used to answer a question.
///
/// This is the user-facing representation of where information came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source file name (e.g., "resume.pdf")
    pub source: String,

    /// "page 2" or "document"
    pub location: String,

    /// Short snippet showing the relevant evidence (truncated if needed)
    pub snippet: String,
}

/// Everything the answer pipeline produced for one question.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub raw_question: String,
    pub standalone_question: String,
    pub retrieved: Vec<Chunk>,
    pub answer: String,
}

/// Reply returned to the caller of the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Grounded answer, or the escalation fallback
    pub response: String,

    /// Passages the answer was grounded on; empty when escalated
    pub sources: Vec<SourceRef>,

    /// Whether the question was forwarded for review
    pub escalated: bool,
}

impl ChatReply {
    pub fn answered(response: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self {
            response: response.into(),
            sources,
            escalated: false,
        }
    }

    pub fn escalated(fallback: impl Into<String>) -> Self {
        Self {
            response: fallback.into(),
            sources: Vec::new(),
            escalated: true,
        }
    }
}
