//! The assistant context: index, memory, answer chain and escalation.

use crate::config::AssistantSettings;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::memory::ConversationMemory;
use crate::notify::{create_notifier, Notifier};
use crate::parser::{loader_for_path, DocumentLoader};
use crate::rag::{
    escalate_with_context, map_chunks_to_sources, AnswerChain, ChatReply, UnknownAnswerGate,
};
use crate::types::{Exchange, IndexOutcome, IndexStatus};
use crate::vector_index::VectorIndex;
use resume_core::{AppConfig, AppError, AppResult};
use resume_llm::{create_client, LlmClient};
use resume_prompt::{load_prompt, ANSWER_PROMPT_ID, CONDENSE_PROMPT_ID};
use std::collections::BTreeMap;
use std::sync::Arc;

/// External collaborators of the assistant.
#[derive(Clone)]
pub struct AssistantComponents {
    pub loader: Arc<dyn DocumentLoader>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
    pub notifier: Arc<dyn Notifier>,
}

impl AssistantComponents {
    /// Components selected by the configuration.
    ///
    /// The loader follows the resume's format: PDF or plain text.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            loader: loader_for_path(&config.source_path()?),
            embedder: create_provider(&config.embeddings)?,
            llm: create_client(&config.llm)?,
            notifier: create_notifier(&config.escalation)?,
        })
    }
}

/// Resume question-answering assistant.
///
/// Construction prepares the index, so an assistant that exists is ready
/// to answer. Safe to share across tasks behind an `Arc`.
pub struct ResumeAssistant {
    settings: AssistantSettings,
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn EmbeddingProvider>,
    notifier: Arc<dyn Notifier>,
    index: Arc<VectorIndex>,
    memory: ConversationMemory,
    chain: AnswerChain,
    gate: UnknownAnswerGate,
    startup: IndexOutcome,
}

impl ResumeAssistant {
    /// Build an assistant from the application configuration.
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        let settings = AssistantSettings::from_app_config(config)?;
        let components = AssistantComponents::from_config(config)?;
        Self::initialize_with(settings, components).await
    }

    /// Build an assistant from explicit settings and collaborators.
    ///
    /// Fails if the source document cannot be ingested or the index cannot
    /// be built.
    pub async fn initialize_with(
        settings: AssistantSettings,
        components: AssistantComponents,
    ) -> AppResult<Self> {
        let condense_prompt = load_prompt(&settings.workspace, CONDENSE_PROMPT_ID)?;
        let answer_prompt = load_prompt(&settings.workspace, ANSWER_PROMPT_ID)?;

        let index = Arc::new(VectorIndex::new(&settings.index_dir));
        let startup = index
            .prepare(
                &settings.source_path,
                components.loader.as_ref(),
                components.embedder.as_ref(),
                &settings.chunking,
                false,
            )
            .await?;

        log_outcome(&startup);

        let chain = AnswerChain::new(
            Arc::clone(&index),
            Arc::clone(&components.embedder),
            Arc::clone(&components.llm),
            condense_prompt,
            answer_prompt,
            settings.retrieval,
            settings.generation.clone(),
        );

        tracing::info!(
            "Assistant ready (llm: {}, embeddings: {}/{}, escalation: {})",
            components.llm.provider_name(),
            components.embedder.provider_name(),
            components.embedder.model_name(),
            components.notifier.name()
        );

        Ok(Self {
            memory: ConversationMemory::new(settings.max_history),
            gate: UnknownAnswerGate::new(settings.min_answer_chars),
            loader: components.loader,
            embedder: components.embedder,
            notifier: components.notifier,
            index,
            chain,
            startup,
            settings,
        })
    }

    /// Answer a question within a session.
    ///
    /// Unknown answers are escalated and replaced by the fallback reply. The
    /// exchange is recorded only once the reply is final. Pipeline failures
    /// are logged and reported as `ProcessingFailed`.
    pub async fn answer_question(&self, question: &str, session_id: &str) -> AppResult<ChatReply> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Other("Question must not be empty".to_string()));
        }

        if !self.index.is_ready().await {
            return Err(AppError::IndexUnavailable);
        }

        tracing::info!("Answering question for session {}", session_id);

        let history = self.memory.turns(session_id).await;
        let context = match self.chain.answer(question, &history).await {
            Ok(context) => context,
            Err(e) => {
                tracing::error!("Failed to answer question for session {}: {}", session_id, e);
                return Err(match e {
                    AppError::Pipeline { source, .. }
                        if matches!(*source, AppError::IndexUnavailable) =>
                    {
                        AppError::IndexUnavailable
                    }
                    _ => AppError::ProcessingFailed,
                });
            }
        };

        let reply = if self.gate.is_unknown(&context.answer) {
            let fallback = escalate_with_context(
                question,
                session_id,
                &context.retrieved,
                self.notifier.as_ref(),
            )
            .await;
            ChatReply::escalated(fallback)
        } else {
            ChatReply::answered(
                context.answer.as_str(),
                map_chunks_to_sources(&context.retrieved),
            )
        };

        self.memory
            .append(session_id, question, reply.response.as_str())
            .await;

        Ok(reply)
    }

    pub async fn get_history(&self, session_id: &str) -> Vec<Exchange> {
        self.memory.history(session_id).await
    }

    pub async fn clear_session(&self, session_id: &str) -> bool {
        self.memory.clear(session_id).await
    }

    pub async fn list_sessions(&self) -> BTreeMap<String, usize> {
        self.memory.list_sessions().await
    }

    /// Re-ingest the source document and rebuild the index unconditionally.
    pub async fn rebuild_index(&self) -> AppResult<IndexOutcome> {
        let outcome = self
            .index
            .prepare(
                &self.settings.source_path,
                self.loader.as_ref(),
                self.embedder.as_ref(),
                &self.settings.chunking,
                true,
            )
            .await?;

        log_outcome(&outcome);
        Ok(outcome)
    }

    pub async fn index_status(&self) -> AppResult<IndexStatus> {
        self.index.status().await
    }

    pub async fn is_ready(&self) -> bool {
        self.index.is_ready().await
    }

    /// How the index was prepared at construction.
    pub fn startup_outcome(&self) -> &IndexOutcome {
        &self.startup
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }
}

fn log_outcome(outcome: &IndexOutcome) {
    match outcome {
        IndexOutcome::Reused { metadata } => {
            tracing::info!("Reused index ({} chunks)", metadata.chunk_count)
        }
        IndexOutcome::Rebuilt { reason, metadata } => tracing::info!(
            "Rebuilt index ({}): {} chunks",
            reason.as_str(),
            metadata.chunk_count
        ),
    }
}
