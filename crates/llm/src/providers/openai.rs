//! OpenAI chat completions provider.
//!
//! Works against `api.openai.com` and any server exposing the same
//! `/v1/chat/completions` contract. Streaming uses server-sent events.

use super::{check_status, drain_lines};
use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use crate::types::DEFAULT_OPENAI_URL;
use futures::StreamExt;
use resume_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<ChatMessage> for OpenAiMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamEvent {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_OPENAI_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_openai_request(&self, request: &LlmRequest, stream: bool) -> OpenAiRequest {
        OpenAiRequest {
            model: request.model.clone(),
            messages: request.messages().into_iter().map(Into::into).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn send(&self, request: &LlmRequest, stream: bool) -> AppResult<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.to_openai_request(request, stream);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("OpenAI request failed: {}", e)))?;

        check_status("OpenAI", response).await
    }
}

/// Parse one SSE line. `None` for comments, keep-alives and non-data fields.
fn parse_event(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let data = line.strip_prefix("data:")?.trim();

    if data == "[DONE]" {
        return Some(Ok(LlmStreamChunk {
            content: String::new(),
            model: String::new(),
            done: true,
            usage: None,
        }));
    }

    let event: OpenAiStreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(AppError::Generation(format!(
                "Failed to parse OpenAI stream event: {}",
                e
            ))))
        }
    };

    let choice = event.choices.into_iter().next();
    let finished = choice
        .as_ref()
        .map(|c| c.finish_reason.is_some())
        .unwrap_or(false);

    Some(Ok(LlmStreamChunk {
        content: choice.and_then(|c| c.delta.content).unwrap_or_default(),
        model: event.model,
        done: finished,
        usage: None,
    }))
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!("Sending chat completion to OpenAI (model: {})", request.model);

        let response = self.send(request, false).await?;

        let oai_response: OpenAiResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let choice = oai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Generation("No choices in OpenAI response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content,
            model: oai_response.model,
            usage: oai_response
                .usage
                .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
                .unwrap_or_default(),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::debug!("Starting streaming chat completion to OpenAI (model: {})", request.model);

        let response = self.send(request, true).await?;

        let stream = response
            .bytes_stream()
            .scan(String::new(), |buffer, result| {
                let chunks: Vec<AppResult<LlmStreamChunk>> = match result {
                    Ok(bytes) => drain_lines(buffer, &bytes)
                        .iter()
                        .filter_map(|line| parse_event(line))
                        .collect(),
                    Err(e) => vec![Err(AppError::Generation(format!("Stream error: {}", e)))],
                };
                futures::future::ready(Some(futures::stream::iter(chunks)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_matches_openai_format() {
        let client = OpenAiClient::new("sk-test");
        let request = LlmRequest::new("Hello", "gpt-4o-mini")
            .with_system("Be helpful.")
            .with_history(vec![
                ChatMessage::user("Earlier"),
                ChatMessage::assistant("Reply"),
            ])
            .with_temperature(0.5)
            .with_max_tokens(512);

        let json = serde_json::to_value(client.to_openai_request(&request, false)).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["max_tokens"], 512);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "Hello");
    }

    #[test]
    fn test_parse_sse_delta() {
        let line = r#"data: {"model":"gpt-4o-mini","choices":[{"delta":{"content":"Go"},"finish_reason":null}]}"#;
        let chunk = parse_event(line).unwrap().unwrap();
        assert_eq!(chunk.content, "Go");
        assert!(!chunk.done);
    }

    #[test]
    fn test_parse_sse_done_and_noise() {
        assert!(parse_event("data: [DONE]").unwrap().unwrap().done);
        assert!(parse_event(": keep-alive").is_none());
        assert!(parse_event("event: ping").is_none());
        assert!(parse_event("data: {not json").unwrap().is_err());
    }
}
