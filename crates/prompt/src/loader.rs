//! Prompt loader for built-in and workspace YAML prompt definitions.

use crate::types::{PromptDefinition, PromptOrigin, PromptSummary};
use resume_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Rewrites a follow-up into a standalone question.
pub const CONDENSE_PROMPT_ID: &str = "resume.condense";

/// Answers from retrieved context only.
pub const ANSWER_PROMPT_ID: &str = "resume.answer";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        CONDENSE_PROMPT_ID,
        include_str!("../prompts/resume.condense.yml"),
    ),
    (ANSWER_PROMPT_ID, include_str!("../prompts/resume.answer.yml")),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".resume/prompts")
}

/// Load a prompt definition by ID.
///
/// A file named `<id>.yml` in `.resume/prompts/` takes precedence over the
/// built-in definition with the same ID.
///
/// # Example
/// ```no_run
/// use resume_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "resume.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let mut definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id {}, expected {}",
                prompt_file, definition.id, prompt_id
            )));
        }
        definition.origin = PromptOrigin::Workspace;

        tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    let (_, contents) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))?;

    parse_prompt(contents, prompt_id)
}

/// List built-in prompts and workspace prompts, sorted by ID.
///
/// A workspace file with a built-in's ID is reported once, as an override.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<PromptSummary>> {
    let mut prompts = BTreeMap::new();

    for (id, contents) in BUILTIN_PROMPTS {
        let def = parse_prompt(contents, id)?;
        prompts.insert(
            def.id.clone(),
            PromptSummary {
                id: def.id,
                title: def.title,
                origin: PromptOrigin::Builtin,
            },
        );
    }

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("yml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match load_prompt(workspace_path, stem) {
                Ok(def) => {
                    prompts.insert(
                        def.id.clone(),
                        PromptSummary {
                            id: def.id,
                            title: def.title,
                            origin: PromptOrigin::Workspace,
                        },
                    );
                }
                Err(e) => tracing::warn!("Skipping invalid prompt file {:?}: {}", path, e),
            }
        }
    }

    Ok(prompts.into_values().collect())
}

fn parse_prompt(contents: &str, source: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", source, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
