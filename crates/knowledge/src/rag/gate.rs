//! Unknown-answer detection and escalation.

use crate::notify::Notifier;
use crate::types::Chunk;
use chrono::{SecondsFormat, Utc};

/// Subject of every escalation message.
pub const ESCALATION_SUBJECT: &str = "Interview Question - Needs Review";

/// Reply given in place of an answer that was escalated.
pub const FALLBACK_ANSWER: &str =
    "I couldn't find that information in the resume. The question has been forwarded for review.";

/// Lowercase phrases marking an answer as "not in the resume".
pub const UNKNOWN_PHRASES: &[&str] = &["i don't know", "idk", "not found in", "cannot find"];

/// Characters of each retrieved passage included in an escalation.
const SNIPPET_CHARS: usize = 200;

/// Decides whether a generated answer counts as unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownAnswerGate {
    /// Trimmed answers shorter than this are unknown; off when `None`
    pub min_answer_chars: Option<usize>,
}

impl UnknownAnswerGate {
    pub fn new(min_answer_chars: Option<usize>) -> Self {
        Self { min_answer_chars }
    }

    pub fn is_unknown(&self, answer: &str) -> bool {
        let normalized = answer.replace('\u{2019}', "'").to_lowercase();

        if UNKNOWN_PHRASES.iter().any(|p| normalized.contains(p)) {
            return true;
        }

        self.min_answer_chars
            .is_some_and(|min| answer.trim().chars().count() < min)
    }
}

/// Notify a reviewer about `question` and return the fallback reply.
///
/// Notifier failures are logged and never reach the caller.
pub async fn escalate(question: &str, session_id: &str, notifier: &dyn Notifier) -> String {
    let body = format!(
        "Unanswered interview question detected.\n\nQuestion: {}\n\nSession: {}\nTimestamp: {}\n",
        question,
        session_id,
        timestamp()
    );

    send(notifier, session_id, &body).await;
    FALLBACK_ANSWER.to_string()
}

/// Like [`escalate`], listing the passages that were retrieved.
pub async fn escalate_with_context(
    question: &str,
    session_id: &str,
    retrieved: &[Chunk],
    notifier: &dyn Notifier,
) -> String {
    let snippets = retrieved
        .iter()
        .map(|chunk| {
            let page = chunk
                .page_number()
                .map_or_else(|| "?".to_string(), |p| p.to_string());
            let snippet: String = chunk.text.chars().take(SNIPPET_CHARS).collect();
            format!("- Page {}: {}...", page, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let context = if snippets.is_empty() {
        "(no relevant context found)".to_string()
    } else {
        snippets
    };

    let body = format!(
        "Unanswered interview question detected.\n\nQuestion: {}\n\nRetrieved context:\n{}\n\nSession: {}\nTimestamp: {}\n",
        question,
        context,
        session_id,
        timestamp()
    );

    send(notifier, session_id, &body).await;
    FALLBACK_ANSWER.to_string()
}

async fn send(notifier: &dyn Notifier, session_id: &str, body: &str) {
    tracing::warn!(
        "Escalating unanswered question for session {} via {}",
        session_id,
        notifier.name()
    );

    if let Err(e) = notifier.notify(ESCALATION_SUBJECT, body).await {
        tracing::error!("Failed to send escalation via {}: {}", notifier.name(), e);
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
