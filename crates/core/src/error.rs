//! Error types for the Resume Assistant.
//!
//! This module defines a unified error enum covering every failure category
//! of the question-answering pipeline (ingestion, indexing, generation) and
//! the ambient concerns around it (configuration, I/O, prompts, notifications).

use std::fmt;
use thiserror::Error;

/// Stage of the answer pipeline that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Condense,
    Embed,
    Retrieve,
    Generate,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Condense => "condense",
            Self::Embed => "embed",
            Self::Retrieve => "retrieve",
            Self::Generate => "generate",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the Resume Assistant.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Source document is missing
    #[error("Source document not found: {0}")]
    NotFound(String),

    /// Source document produced no text
    #[error("No text could be extracted from {0}")]
    EmptyDocument(String),

    /// Index queried before a build or load completed
    #[error("Vector index is not available; build or load it first")]
    IndexUnavailable,

    /// Language model call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// A stage of the answer pipeline failed
    #[error("Pipeline failed at {stage} stage: {source}")]
    Pipeline {
        stage: PipelineStage,
        #[source]
        source: Box<AppError>,
    },

    /// Request failed; details are logged, never shown to the caller
    #[error("Processing failed. Please try again.")]
    ProcessingFailed,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index, embedding and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Escalation transport errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Wrap an error as the failure of a pipeline stage.
    ///
    /// Already-wrapped errors are returned unchanged so the innermost stage
    /// is the one reported.
    pub fn pipeline(stage: PipelineStage, source: AppError) -> Self {
        match source {
            AppError::Pipeline { .. } => source,
            other => AppError::Pipeline {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The failed stage, if this is a pipeline error.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            AppError::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_pipeline_wraps_cause() {
        let err = AppError::pipeline(
            PipelineStage::Generate,
            AppError::Generation("timeout".to_string()),
        );

        assert_eq!(err.stage(), Some(PipelineStage::Generate));
        assert!(err.to_string().contains("generate"));
        assert!(err.source().unwrap().to_string().contains("timeout"));
    }

    #[test]
    fn test_pipeline_does_not_double_wrap() {
        let inner = AppError::pipeline(PipelineStage::Embed, AppError::Other("x".to_string()));
        let outer = AppError::pipeline(PipelineStage::Retrieve, inner);
        assert_eq!(outer.stage(), Some(PipelineStage::Embed));
    }

    #[test]
    fn test_processing_failed_hides_detail() {
        let msg = AppError::ProcessingFailed.to_string();
        assert_eq!(msg, "Processing failed. Please try again.");
    }
}
