//! Assistant settings derived from the application configuration.

use resume_core::{AppConfig, AppResult};
use std::path::{Path, PathBuf};

/// Chunking parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 450,
            chunk_overlap: 60,
        }
    }
}

/// Diversified retrieval parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    pub k: usize,
    pub fetch_k: usize,
    pub lambda: f32,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            k: 4,
            fetch_k: 12,
            lambda: 0.7,
        }
    }
}

/// Language model parameters for condensation and answering.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            temperature: 0.2,
            max_tokens: None,
        }
    }
}

/// Everything the assistant needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Workspace root, used to find prompt overrides
    pub workspace: PathBuf,
    pub source_path: PathBuf,
    pub index_dir: PathBuf,
    pub chunking: ChunkOptions,
    pub retrieval: RetrievalOptions,
    pub generation: GenerationOptions,
    pub max_history: usize,
    pub min_answer_chars: Option<usize>,
}

impl AssistantSettings {
    /// Settings with defaults for everything but the paths.
    pub fn new(workspace: impl Into<PathBuf>, source_path: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        Self {
            index_dir: workspace.join(".resume").join("index"),
            workspace,
            source_path: source_path.into(),
            chunking: ChunkOptions::default(),
            retrieval: RetrievalOptions::default(),
            generation: GenerationOptions::default(),
            max_history: 50,
            min_answer_chars: None,
        }
    }

    /// Build settings from a loaded and validated configuration.
    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            workspace: config.workspace.clone(),
            source_path: config.source_path()?,
            index_dir: config.index_path(),
            chunking: ChunkOptions {
                chunk_size: config.chunking.chunk_size,
                chunk_overlap: config.chunking.chunk_overlap,
            },
            retrieval: RetrievalOptions {
                k: config.retrieval.k,
                fetch_k: config.retrieval.fetch_k,
                lambda: config.retrieval.mmr_lambda,
            },
            generation: GenerationOptions {
                model: config.llm.resolved_model(),
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
            max_history: config.memory.max_history,
            min_answer_chars: config.escalation.min_answer_chars,
        })
    }
}

/// Get the SQLite data path inside an index directory.
pub fn get_index_path(index_dir: &Path) -> PathBuf {
    index_dir.join("index.sqlite")
}

/// Get the metadata path inside an index directory.
pub fn get_metadata_path(index_dir: &Path) -> PathBuf {
    index_dir.join("metadata.json")
}

/// Temporary sibling used for write-then-rename.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_config() {
        let mut config = AppConfig {
            workspace: PathBuf::from("/srv/bot"),
            resume_path: Some(PathBuf::from("resume.txt")),
            ..Default::default()
        };
        config.retrieval.k = 6;
        config.llm.provider = "openai".to_string();
        config.escalation.min_answer_chars = Some(10);

        let settings = AssistantSettings::from_app_config(&config).unwrap();
        assert_eq!(settings.source_path, PathBuf::from("/srv/bot/resume.txt"));
        assert_eq!(settings.index_dir, PathBuf::from("/srv/bot/.resume/index"));
        assert_eq!(settings.retrieval.k, 6);
        assert_eq!(settings.retrieval.fetch_k, 12);
        assert_eq!(settings.generation.model, "gpt-4o-mini");
        assert_eq!(settings.min_answer_chars, Some(10));
    }

    #[test]
    fn test_from_app_config_requires_source() {
        let config = AppConfig::default();
        assert!(AssistantSettings::from_app_config(&config).is_err());
    }

    #[test]
    fn test_paths() {
        let dir = Path::new("/tmp/idx");
        assert_eq!(get_index_path(dir), PathBuf::from("/tmp/idx/index.sqlite"));
        assert_eq!(get_metadata_path(dir), PathBuf::from("/tmp/idx/metadata.json"));
        assert_eq!(
            temp_path(&get_metadata_path(dir)),
            PathBuf::from("/tmp/idx/metadata.json.tmp")
        );
    }
}
