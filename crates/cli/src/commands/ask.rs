//! Ask command handler.
//!
//! Answers one question against the resume and exits.

use clap::Args;
use resume_core::{config::AppConfig, AppResult};
use resume_knowledge::{ChatReply, ResumeAssistant};

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The interviewer's question
    pub question: String,

    /// Session id for conversation history
    #[arg(short, long, default_value = "cli")]
    pub session: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let assistant = ResumeAssistant::initialize(config).await?;
        let reply = assistant
            .answer_question(&self.question, &self.session)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reply)?);
        } else {
            print_reply(&reply);
        }

        Ok(())
    }
}

/// Print a reply with its sources for a terminal.
pub(crate) fn print_reply(reply: &ChatReply) {
    println!("{}", reply.response);

    if reply.escalated {
        println!("\n(forwarded for review)");
        return;
    }

    if !reply.sources.is_empty() {
        println!("\nSources:");
        for source in &reply.sources {
            println!("  - {} ({}): {}", source.source, source.location, source.snippet);
        }
    }
}
