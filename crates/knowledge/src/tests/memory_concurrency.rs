//! Concurrent access to conversation memory and the assistant.

use super::support::*;
use crate::memory::ConversationMemory;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_session_appends_are_not_lost() {
    let memory = Arc::new(ConversationMemory::new(1000));
    let mut tasks = JoinSet::new();

    for worker in 0..8 {
        let memory = Arc::clone(&memory);
        tasks.spawn(async move {
            for i in 0..25 {
                memory
                    .append("shared", format!("q{}-{}", worker, i), "a")
                    .await;
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    assert_eq!(memory.history("shared").await.len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_respect_bound() {
    let memory = Arc::new(ConversationMemory::new(50));
    let mut tasks = JoinSet::new();

    for worker in 0..8 {
        let memory = Arc::clone(&memory);
        tasks.spawn(async move {
            for i in 0..25 {
                memory
                    .append("shared", format!("q{}-{}", worker, i), "a")
                    .await;
                assert!(memory.history("shared").await.len() <= 50);
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    assert_eq!(memory.history("shared").await.len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_worker_order_is_preserved() {
    let memory = Arc::new(ConversationMemory::new(1000));
    let mut tasks = JoinSet::new();

    for worker in 0..4 {
        let memory = Arc::clone(&memory);
        tasks.spawn(async move {
            for i in 0..20 {
                memory.append("shared", format!("{}", worker), format!("{}", i)).await;
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let history = memory.history("shared").await;
    for worker in 0..4 {
        let answers: Vec<usize> = history
            .iter()
            .filter(|e| e.question == worker.to_string())
            .map(|e| e.answer.parse().unwrap())
            .collect();
        assert_eq!(answers, (0..20).collect::<Vec<_>>());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_questions_across_sessions() {
    let temp = TempDir::new().unwrap();
    let assistant = Arc::new(
        assistant(
            temp.path(),
            ScriptedLlm::answering("Yes, Rust at Acme Corp."),
            RecordingNotifier::new(),
        )
        .await,
    );

    let mut tasks = JoinSet::new();
    for session in 0..6 {
        let assistant = Arc::clone(&assistant);
        tasks.spawn(async move {
            for _ in 0..3 {
                assistant
                    .answer_question("Does she know Rust?", &format!("session-{}", session))
                    .await
                    .unwrap();
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let sessions = assistant.list_sessions().await;
    assert_eq!(sessions.len(), 6);
    assert!(sessions.values().all(|&count| count == 3));
}
