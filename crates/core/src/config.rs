//! Configuration management for the Resume Assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.resume/config.yaml` in the workspace)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: the vector index, prompt overrides
//! and config file all live under `.resume/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Known completion providers.
pub const LLM_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Known embedding providers.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["ollama", "openai", "trigram"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .resume/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Source document answered over
    pub resume_path: Option<PathBuf>,

    /// Directory holding the persisted vector index
    pub index_dir: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub llm: LlmSettings,
    pub embeddings: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub chunking: ChunkingSettings,
    pub memory: MemorySettings,
    pub escalation: EscalationSettings,
}

/// Completion model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider name ("ollama", "openai")
    pub provider: String,

    /// Model identifier; provider default when unset
    pub model: Option<String>,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(), // Local-first default
            model: None,
            endpoint: None,
            api_key_env: None,
            temperature: 0.2,
            max_tokens: None,
        }
    }
}

impl LlmSettings {
    /// Model to use, falling back to the provider's default.
    pub fn resolved_model(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "openai" => "gpt-4o-mini".to_string(),
            _ => "llama3.2".to_string(),
        }
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(&self.provider, self.api_key_env.as_deref())
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name ("ollama", "openai", "trigram")
    pub provider: String,

    /// Model identifier; provider default when unset
    pub model: Option<String>,

    /// Vector dimensions; model default when unset
    pub dimensions: Option<usize>,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: None,
            dimensions: None,
            endpoint: None,
            api_key_env: None,
        }
    }
}

impl EmbeddingSettings {
    pub fn resolved_model(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "openai" => "text-embedding-3-small".to_string(),
            "trigram" => "trigram-v1".to_string(),
            _ => "nomic-embed-text".to_string(),
        }
    }

    pub fn resolved_dimensions(&self) -> usize {
        if let Some(dimensions) = self.dimensions {
            return dimensions;
        }
        match self.resolved_model().as_str() {
            "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
            "text-embedding-3-large" => 3072,
            "nomic-embed-text" => 768,
            _ => 384,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(&self.provider, self.api_key_env.as_deref())
    }

    /// Switch between the local model server and the remote API.
    ///
    /// Only flips between "ollama" and "openai"; any other provider is kept.
    /// Model and dimensions reset to the new provider's defaults.
    pub fn use_local(&mut self, local: bool) {
        let target = match (local, self.provider.as_str()) {
            (true, "openai") => "ollama",
            (false, "ollama") => "openai",
            _ => return,
        };
        self.provider = target.to_string();
        self.model = None;
        self.dimensions = None;
    }
}

/// Diversified retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Chunks handed to the answer generator
    pub k: usize,

    /// Nearest candidates considered by MMR
    pub fetch_k: usize,

    /// 0.0 = pure diversity, 1.0 = pure relevance
    pub mmr_lambda: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: 4,
            fetch_k: 12,
            mmr_lambda: 0.7,
        }
    }
}

/// Chunking settings, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 450,
            chunk_overlap: 60,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemorySettings {
    /// Exchanges kept per session
    pub max_history: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self { max_history: 50 }
    }
}

/// Unknown-answer escalation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EscalationSettings {
    /// Webhook receiving `{subject, body}`; log-only when unset
    pub webhook_url: Option<String>,

    /// Answers shorter than this are treated as unknown; disabled when unset
    pub min_answer_chars: Option<usize>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    resume: Option<ResumeFileConfig>,
    logging: Option<LoggingConfig>,
    llm: Option<LlmSettings>,
    embeddings: Option<EmbeddingSettings>,
    retrieval: Option<RetrievalSettings>,
    chunking: Option<ChunkingSettings>,
    memory: Option<MemorySettings>,
    escalation: Option<EscalationSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResumeFileConfig {
    path: Option<String>,
    index_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            resume_path: None,
            index_dir: None,
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embeddings: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            chunking: ChunkingSettings::default(),
            memory: MemorySettings::default(),
            escalation: EscalationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, the config file and defaults.
    ///
    /// Environment variables:
    /// - `RESUME_WORKSPACE`: Override workspace path
    /// - `RESUME_CONFIG`: Path to config file
    /// - `RESUME_PATH`: Source document
    /// - `VECTORSTORE_PATH`: Index directory
    /// - `LLM_PROVIDER`, `LLM_MODEL`, `LLM_ENDPOINT`, `LLM_TEMPERATURE`
    /// - `EMBEDDINGS_PROVIDER`, `EMBEDDINGS_MODEL`, `USE_LOCAL_EMBEDDINGS`
    /// - `RETRIEVER_K`, `RETRIEVER_FETCH_K`, `MMR_LAMBDA`
    /// - `MAX_HISTORY_PER_SESSION`
    /// - `ESCALATION_WEBHOOK_URL`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use resume_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration for an explicit workspace and/or config file.
    ///
    /// Arguments take precedence over `RESUME_WORKSPACE` / `RESUME_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("RESUME_WORKSPACE")) {
            config.workspace = workspace;
        }
        config.config_file = config_file.or_else(|| env_path("RESUME_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.resume_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        config.apply_env()?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        Ok(self.clone().merge_file(config_file))
    }

    fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(resume) = file.resume {
            if let Some(path) = resume.path {
                self.resume_path = Some(PathBuf::from(path));
            }
            if let Some(dir) = resume.index_dir {
                self.index_dir = Some(PathBuf::from(dir));
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }

        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(embeddings) = file.embeddings {
            self.embeddings = embeddings;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(chunking) = file.chunking {
            self.chunking = chunking;
        }
        if let Some(memory) = file.memory {
            self.memory = memory;
        }
        if let Some(escalation) = file.escalation {
            self.escalation = escalation;
        }

        self
    }

    fn apply_env(&mut self) -> AppResult<()> {
        if let Some(path) = env_path("RESUME_PATH") {
            self.resume_path = Some(path);
        }
        if let Some(dir) = env_path("VECTORSTORE_PATH") {
            self.index_dir = Some(dir);
        }

        if let Some(provider) = env_string("LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = env_string("LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(endpoint) = env_string("LLM_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Some(temperature) = env_parse::<f32>("LLM_TEMPERATURE")? {
            self.llm.temperature = temperature;
        }

        if let Some(provider) = env_string("EMBEDDINGS_PROVIDER") {
            self.embeddings.provider = provider;
        }
        if let Some(local) = env_parse::<bool>("USE_LOCAL_EMBEDDINGS")? {
            self.embeddings.use_local(local);
        }
        if let Some(model) = env_string("EMBEDDINGS_MODEL") {
            self.embeddings.model = Some(model);
        }

        if let Some(k) = env_parse::<usize>("RETRIEVER_K")? {
            self.retrieval.k = k;
        }
        if let Some(fetch_k) = env_parse::<usize>("RETRIEVER_FETCH_K")? {
            self.retrieval.fetch_k = fetch_k;
        }
        if let Some(lambda) = env_parse::<f32>("MMR_LAMBDA")? {
            self.retrieval.mmr_lambda = lambda;
        }

        if let Some(max_history) = env_parse::<usize>("MAX_HISTORY_PER_SESSION")? {
            self.memory.max_history = max_history;
        }

        if let Some(url) = env_string("ESCALATION_WEBHOOK_URL") {
            self.escalation.webhook_url = Some(url);
        }

        if let Some(level) = env_string("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        resume_path: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(resume_path) = resume_path {
            self.resume_path = Some(resume_path);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = Some(model);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .resume directory.
    pub fn resume_dir(&self) -> PathBuf {
        self.workspace.join(".resume")
    }

    /// Ensure the .resume directory exists.
    pub fn ensure_resume_dir(&self) -> AppResult<()> {
        let resume_dir = self.resume_dir();
        if !resume_dir.exists() {
            std::fs::create_dir_all(&resume_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .resume directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Source document path, resolved against the workspace.
    pub fn source_path(&self) -> AppResult<PathBuf> {
        let path = self.resume_path.as_ref().ok_or_else(|| {
            AppError::Config(
                "No resume configured. Set RESUME_PATH, resume.path in config.yaml, or --resume"
                    .to_string(),
            )
        })?;
        Ok(self.resolve(path))
    }

    /// Index directory, resolved against the workspace.
    pub fn index_path(&self) -> PathBuf {
        match &self.index_dir {
            Some(dir) => self.resolve(dir),
            None => self.resume_dir().join("index"),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate configuration values and provider requirements.
    pub fn validate(&self) -> AppResult<()> {
        if !LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                LLM_PROVIDERS.join(", ")
            )));
        }

        if !EMBEDDING_PROVIDERS.contains(&self.embeddings.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embeddings.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        let retrieval = &self.retrieval;
        if !(1..=20).contains(&retrieval.k) {
            return Err(AppError::Config(format!(
                "Retriever k must be between 1 and 20, got {}",
                retrieval.k
            )));
        }
        if !(1..=50).contains(&retrieval.fetch_k) {
            return Err(AppError::Config(format!(
                "Retriever fetch_k must be between 1 and 50, got {}",
                retrieval.fetch_k
            )));
        }
        if !(0.0..=1.0).contains(&retrieval.mmr_lambda) {
            return Err(AppError::Config(format!(
                "MMR lambda must be between 0.0 and 1.0, got {}",
                retrieval.mmr_lambda
            )));
        }

        if self.memory.max_history < 1 {
            return Err(AppError::Config(
                "Max history per session must be at least 1".to_string(),
            ));
        }

        if self.chunking.chunk_size == 0 || self.chunking.chunk_overlap >= self.chunking.chunk_size
        {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.llm.provider == "openai" && self.llm.api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                api_key_env_name(&self.llm.provider, self.llm.api_key_env.as_deref())
            )));
        }

        if self.embeddings.provider == "openai" && self.embeddings.api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                api_key_env_name(
                    &self.embeddings.provider,
                    self.embeddings.api_key_env.as_deref()
                )
            )));
        }

        Ok(())
    }
}

fn api_key_env_name(provider: &str, configured: Option<&str>) -> String {
    match configured {
        Some(name) => name.to_string(),
        None if provider == "openai" => "OPENAI_API_KEY".to_string(),
        None => format!("{}_API_KEY", provider.to_uppercase()),
    }
}

fn resolve_api_key(provider: &str, configured: Option<&str>) -> Option<String> {
    std::env::var(api_key_env_name(provider, configured))
        .ok()
        .filter(|key| !key.trim().is_empty())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

fn env_parse<T>(name: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .to_lowercase()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {} ({})", name, raw, e))),
        None => Ok(None),
    }
}
