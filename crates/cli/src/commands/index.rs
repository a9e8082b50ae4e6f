//! Index command handler.
//!
//! Inspects, builds and clears the persisted resume index without starting
//! a conversation.

use clap::{Args, Subcommand};
use resume_core::{config::AppConfig, AppResult};
use resume_knowledge::{
    create_provider, fingerprint_file, loader_for_path, AssistantSettings, IndexOutcome,
    VectorIndex,
};

/// Inspect, build or clear the resume index
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Show index metadata and whether it matches the resume
    Status(IndexStatusCommand),
    /// Build the index if the resume changed
    Build(IndexBuildCommand),
    /// Delete the persisted index
    Clear(IndexClearCommand),
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Status(cmd) => cmd.execute(config).await,
            IndexAction::Build(cmd) => cmd.execute(config).await,
            IndexAction::Clear(cmd) => cmd.execute(config).await,
        }
    }
}

/// Show index status
#[derive(Args, Debug)]
pub struct IndexStatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index_dir = config.index_path();
        tracing::info!("Executing index status command for {:?}", index_dir);

        let index = VectorIndex::new(&index_dir);
        index.load().await?;
        let status = index.status().await?;

        // Compare against the resume when one is configured and present
        let current_hash = config
            .source_path()
            .ok()
            .and_then(|path| fingerprint_file(&path).ok());
        let up_to_date = match (&status.metadata, &current_hash) {
            (Some(metadata), Some(hash)) => Some(&metadata.content_hash == hash),
            _ => None,
        };

        if self.json {
            let output = serde_json::json!({
                "indexDir": index_dir,
                "ready": status.ready,
                "upToDate": up_to_date,
                "metadata": status.metadata,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Index: {}", index_dir.display());
        let Some(metadata) = status.metadata else {
            println!("Status: not built");
            return Ok(());
        };

        println!("Status: {}", if status.ready { "ready" } else { "unreadable" });
        println!("Chunks: {}", metadata.chunk_count);
        println!("Resume SHA-256: {}", metadata.content_hash);
        if let (Some(provider), Some(model)) = (&metadata.embedding_provider, &metadata.embedding_model) {
            println!(
                "Embeddings: {}/{} ({} dims)",
                provider,
                model,
                metadata.dimensions.unwrap_or_default()
            );
        }
        if let Some(built_at) = metadata.built_at {
            println!("Built: {}", built_at.to_rfc3339());
        }
        match up_to_date {
            Some(true) => println!("Resume: unchanged"),
            Some(false) => println!("Resume: changed since build (run `index build`)"),
            None => println!("Resume: not found"),
        }

        Ok(())
    }
}

/// Build the index
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// Rebuild even if the resume is unchanged
    #[arg(short, long)]
    pub force: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let settings = AssistantSettings::from_app_config(config)?;
        tracing::info!("Executing index build command for {:?}", settings.source_path);

        let embedder = create_provider(&config.embeddings)?;
        let loader = loader_for_path(&settings.source_path);
        let index = VectorIndex::new(&settings.index_dir);

        let outcome = index
            .prepare(
                &settings.source_path,
                loader.as_ref(),
                embedder.as_ref(),
                &settings.chunking,
                self.force,
            )
            .await?;

        match outcome {
            IndexOutcome::Reused { metadata } => println!(
                "Index is up to date ({} chunks)",
                metadata.chunk_count
            ),
            IndexOutcome::Rebuilt { reason, metadata } => println!(
                "Built index from {} ({} chunks, reason: {})",
                settings.source_path.display(),
                metadata.chunk_count,
                reason.as_str()
            ),
        }

        Ok(())
    }
}

/// Clear the index
#[derive(Args, Debug)]
pub struct IndexClearCommand {}

impl IndexClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index_dir = config.index_path();
        tracing::info!("Executing index clear command for {:?}", index_dir);

        if VectorIndex::new(&index_dir).invalidate().await? {
            println!("Cleared index at {}", index_dir.display());
        } else {
            println!("No index at {}", index_dir.display());
        }

        Ok(())
    }
}
