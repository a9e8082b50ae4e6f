//! Prompts command handler.

use clap::Args;
use resume_core::{config::AppConfig, AppResult};
use resume_prompt::{list_prompts, PromptOrigin};

/// List available prompts
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let prompts = list_prompts(&config.workspace)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&prompts)?);
            return Ok(());
        }

        for prompt in prompts {
            let origin = match prompt.origin {
                PromptOrigin::Builtin => "built-in",
                PromptOrigin::Workspace => "workspace",
            };
            println!("{:<20} {:<10} {}", prompt.id, origin, prompt.title);
        }

        Ok(())
    }
}
