//! Prompt system for the Resume Assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in prompts compiled into the binary
//! - Workspace overrides under `.resume/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, ANSWER_PROMPT_ID, CONDENSE_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOrigin, PromptSummary};
