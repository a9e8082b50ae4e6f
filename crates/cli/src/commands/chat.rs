//! Chat command handler.
//!
//! Interactive session: each line is a question, slash commands manage the
//! conversation.

use super::ask::print_reply;
use clap::Args;
use resume_core::{config::AppConfig, AppError, AppResult};
use resume_knowledge::ResumeAssistant;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive interview session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Session id (default: a new random id)
    #[arg(short, long)]
    pub session: Option<String>,
}

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Question(&'a str),
    History,
    Clear,
    Sessions,
    Quit,
    Help,
    Empty,
}

fn parse_input(line: &str) -> ChatInput<'_> {
    match line.trim() {
        "" => ChatInput::Empty,
        "/history" => ChatInput::History,
        "/clear" => ChatInput::Clear,
        "/sessions" => ChatInput::Sessions,
        "/quit" | "/exit" => ChatInput::Quit,
        "/help" => ChatInput::Help,
        question => ChatInput::Question(question),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let session = self
            .session
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        tracing::info!("Starting chat session {}", session);

        let assistant = ResumeAssistant::initialize(config).await?;

        println!("Resume assistant ready (session {}).", session);
        println!("Ask a question, or /history, /clear, /sessions, /quit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                ChatInput::Empty => continue,
                ChatInput::Quit => break,
                ChatInput::Help => {
                    println!("/history  show this session's exchanges");
                    println!("/clear    forget this session");
                    println!("/sessions list sessions");
                    println!("/quit     leave");
                }
                ChatInput::History => {
                    let history = assistant.get_history(&session).await;
                    if history.is_empty() {
                        println!("(no history)");
                    }
                    for (i, exchange) in history.iter().enumerate() {
                        println!("{}. Q: {}", i + 1, exchange.question);
                        println!("   A: {}", exchange.answer);
                    }
                }
                ChatInput::Clear => {
                    if assistant.clear_session(&session).await {
                        println!("Session cleared.");
                    } else {
                        println!("Nothing to clear.");
                    }
                }
                ChatInput::Sessions => {
                    for (id, count) in assistant.list_sessions().await {
                        println!("{} ({} exchanges)", id, count);
                    }
                }
                ChatInput::Question(question) => {
                    match assistant.answer_question(question, &session).await {
                        Ok(reply) => print_reply(&reply),
                        Err(e @ (AppError::ProcessingFailed | AppError::IndexUnavailable)) => {
                            println!("{}", e)
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            println!();
        }

        Ok(())
    }
}
