//! LLM provider implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use resume_core::{AppError, AppResult};

/// Append a network chunk to `buffer` and drain every complete line.
///
/// Lines may be split across chunks; the unterminated tail stays buffered.
pub(crate) fn drain_lines(buffer: &mut String, bytes: &[u8]) -> Vec<String> {
    buffer.push_str(&String::from_utf8_lossy(bytes));

    let mut lines = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Turn a non-2xx response into a generation error.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::Generation(format!(
        "{} API error ({}): {}",
        provider, status, error_text
    )))
}
