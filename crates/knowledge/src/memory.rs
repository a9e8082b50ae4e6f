//! Per-session conversation memory.

use crate::types::Exchange;
use resume_llm::ChatMessage;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Session = Arc<Mutex<VecDeque<Exchange>>>;

/// Bounded question/answer history keyed by session id.
///
/// The map lock is held only to find or insert a session; appends to one
/// session serialize on that session's own mutex.
#[derive(Debug)]
pub struct ConversationMemory {
    max_history: usize,
    sessions: RwLock<HashMap<String, Session>>,
}

impl ConversationMemory {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Record an exchange, evicting the oldest beyond the bound.
    pub async fn append(
        &self,
        session_id: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) {
        let session = self.session_or_insert(session_id).await;
        let mut exchanges = session.lock().await;

        exchanges.push_back(Exchange::new(question, answer));
        while exchanges.len() > self.max_history {
            exchanges.pop_front();
        }
    }

    /// Exchanges for a session, oldest first. Unknown sessions are empty.
    pub async fn history(&self, session_id: &str) -> Vec<Exchange> {
        let Some(session) = self.session(session_id).await else {
            return Vec::new();
        };

        let exchanges = session.lock().await;
        exchanges.iter().cloned().collect()
    }

    /// History as alternating user/assistant turns.
    pub async fn turns(&self, session_id: &str) -> Vec<ChatMessage> {
        self.history(session_id)
            .await
            .into_iter()
            .flat_map(|e| [ChatMessage::user(e.question), ChatMessage::assistant(e.answer)])
            .collect()
    }

    /// Forget a session; returns whether it existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Session ids with their exchange counts.
    pub async fn list_sessions(&self) -> BTreeMap<String, usize> {
        let sessions: Vec<(String, Session)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), Arc::clone(s)))
            .collect();

        let mut counts = BTreeMap::new();
        for (id, session) in sessions {
            counts.insert(id, session.lock().await.len());
        }
        counts
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn session_or_insert(&self, session_id: &str) -> Session {
        if let Some(session) = self.session(session_id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(session_id.to_string()).or_default())
    }
}
