//! Resume Assistant CLI
//!
//! Main entry point for the resume-assistant command-line tool.
//! Answers interview questions about a candidate from their resume.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, IndexCommand, PromptsCommand};
use resume_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Resume Assistant - grounded answers to interview questions about a resume
#[derive(Parser, Debug)]
#[command(name = "resume-assistant")]
#[command(about = "Answer interview questions from a candidate's resume", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RESUME_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RESUME_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Resume file to answer from
    #[arg(short, long, global = true)]
    resume: Option<PathBuf>,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive interview session
    Chat(ChatCommand),

    /// Inspect, build or clear the resume index
    Index(IndexCommand),

    /// List available prompts
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file, then environment
    let config = AppConfig::load_from(cli.workspace, cli.config)
        .context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.resume,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    config.validate().context("Invalid configuration")?;

    tracing::info!("Resume Assistant CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "LLM: {} ({})",
        config.llm.provider,
        config.llm.resolved_model()
    );

    config.ensure_resume_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Index(_) => "index",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("{} failed", command_name))
}
