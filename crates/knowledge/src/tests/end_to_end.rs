//! Question answering through the full assistant.

use super::support::*;
use crate::rag::{ESCALATION_SUBJECT, FALLBACK_ANSWER};
use resume_core::AppError;
use resume_llm::{FallbackClient, Role};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_grounded_answer_with_sources() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::answering("Yes. Jane led the payments platform team at Acme Corp.");
    let notifier = RecordingNotifier::new();
    let assistant = assistant(temp.path(), llm.clone(), notifier.clone()).await;

    let reply = assistant
        .answer_question("Does she have payments experience?", "s1")
        .await
        .unwrap();

    assert!(!reply.escalated);
    assert_eq!(
        reply.response,
        "Yes. Jane led the payments platform team at Acme Corp."
    );
    assert!(!reply.sources.is_empty());
    assert!(reply.sources.iter().all(|s| s.source == "resume.txt"));
    assert!(reply.sources.iter().any(|s| s.snippet.contains("payments")));
    assert!(notifier.sent().is_empty());

    // No history: the condenser is skipped and the answer prompt carries context
    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let system = requests[0].system.as_deref().unwrap();
    assert!(system.contains("payments platform"));
    assert_eq!(requests[0].prompt, "Does she have payments experience?");
    assert!(requests[0].history.is_empty());

    let history = assistant.get_history("s1").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].answer, reply.response);
}

#[tokio::test]
async fn test_unknown_answer_is_escalated_once() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::answering("I don't know.");
    let notifier = RecordingNotifier::new();
    let assistant = assistant(temp.path(), llm, notifier.clone()).await;

    let reply = assistant
        .answer_question("Does she know Kubernetes?", "s2")
        .await
        .unwrap();

    assert!(reply.escalated);
    assert_eq!(reply.response, FALLBACK_ANSWER);
    assert!(reply.sources.is_empty());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ESCALATION_SUBJECT);
    assert!(sent[0].1.contains("Question: Does she know Kubernetes?"));
    assert!(sent[0].1.contains("Session: s2"));
    assert!(sent[0].1.contains("- Page "));

    let history = assistant.get_history("s2").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].question, "Does she know Kubernetes?");
    assert_eq!(history[0].answer, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_notifier_failure_still_returns_fallback() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::answering("I cannot find that in the resume.");
    let assistant = assistant(temp.path(), llm, Arc::new(FailingNotifier)).await;

    let reply = assistant
        .answer_question("What is her salary expectation?", "s3")
        .await
        .unwrap();

    assert!(reply.escalated);
    assert_eq!(reply.response, FALLBACK_ANSWER);
    assert_eq!(assistant.get_history("s3").await.len(), 1);
}

#[tokio::test]
async fn test_follow_up_is_condensed_with_history() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::condensing(
        "Where did Jane work on payments?",
        "She worked on payments at Acme Corp.",
    );
    let assistant = assistant(temp.path(), llm.clone(), RecordingNotifier::new()).await;

    assistant
        .answer_question("Tell me about her payments work.", "s4")
        .await
        .unwrap();
    assistant
        .answer_question("Where was that?", "s4")
        .await
        .unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);

    let condense = &requests[1];
    assert!(is_condense_request(condense));
    assert_eq!(condense.prompt, "Where was that?");
    let roles: Vec<Role> = condense.history.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);

    // The answer step sees the standalone question, not the raw follow-up
    assert_eq!(requests[2].prompt, "Where did Jane work on payments?");

    let history = assistant.get_history("s4").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].question, "Where was that?");
}

#[tokio::test]
async fn test_generation_failure_is_generic_and_not_recorded() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::failing();
    let notifier = RecordingNotifier::new();
    let assistant = assistant(temp.path(), llm, notifier.clone()).await;

    let result = assistant.answer_question("Does she know Rust?", "s5").await;

    assert!(matches!(result, Err(AppError::ProcessingFailed)));
    assert!(assistant.get_history("s5").await.is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let temp = TempDir::new().unwrap();
    let assistant = assistant(
        temp.path(),
        ScriptedLlm::answering("unused"),
        RecordingNotifier::new(),
    )
    .await;

    assert!(assistant.answer_question("   ", "s6").await.is_err());
    assert_eq!(assistant.list_sessions().await.len(), 0);
}

#[tokio::test]
async fn test_fallback_client_recovers_from_stream_failure() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::answering("Yes, Python and Rust.");
    let client = Arc::new(FallbackClient::new(llm.clone()));
    let assistant = assistant(temp.path(), client, RecordingNotifier::new()).await;

    let reply = assistant
        .answer_question("Which languages does she use?", "s7")
        .await
        .unwrap();

    assert_eq!(reply.response, "Yes, Python and Rust.");
    assert_eq!(llm.requests().len(), 1);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let temp = TempDir::new().unwrap();
    let assistant = assistant(
        temp.path(),
        ScriptedLlm::answering("Yes, at Acme Corp."),
        RecordingNotifier::new(),
    )
    .await;

    assistant.answer_question("Payments?", "a").await.unwrap();
    assistant.answer_question("Rust?", "b").await.unwrap();
    assistant.answer_question("Python?", "b").await.unwrap();

    let sessions = assistant.list_sessions().await;
    assert_eq!(sessions.get("a"), Some(&1));
    assert_eq!(sessions.get("b"), Some(&2));

    assert!(assistant.clear_session("a").await);
    assert!(!assistant.clear_session("a").await);
    assert!(assistant.get_history("a").await.is_empty());
    assert_eq!(assistant.get_history("b").await.len(), 2);
}
