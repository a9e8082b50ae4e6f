//! RAG (Retrieval-Augmented Generation) answering system.
//!
//! Condenses follow-ups, retrieves resume passages and generates grounded
//! answers; unknown answers are escalated for human review.

pub mod chain;
pub mod condense;
pub mod gate;
mod generate;
pub mod sources;
pub mod types;

pub use chain::AnswerChain;
pub use condense::QueryCondenser;
pub use gate::{
    escalate, escalate_with_context, UnknownAnswerGate, ESCALATION_SUBJECT, FALLBACK_ANSWER,
};
pub use sources::map_chunks_to_sources;
pub use types::{ChatReply, QueryContext, SourceRef};
