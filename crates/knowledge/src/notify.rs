//! Escalation transports.

use async_trait::async_trait;
use reqwest::Client;
use resume_core::config::EscalationSettings;
use resume_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Delivers escalation messages to a human reviewer.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, subject: &str, body: &str) -> AppResult<()>;
}

/// Writes escalations to the log; used when no transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, subject: &str, body: &str) -> AppResult<()> {
        tracing::warn!("{}\n{}", subject, body);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
}

/// POSTs `{subject, body}` as JSON to a URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Notification(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, subject: &str, body: &str) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { subject, body })
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification(format!(
                "Webhook returned {}",
                status
            )));
        }

        tracing::debug!("Escalation delivered to webhook ({})", status);
        Ok(())
    }
}

/// Webhook when a URL is configured, log otherwise.
pub fn create_notifier(settings: &EscalationSettings) -> AppResult<Arc<dyn Notifier>> {
    match settings.webhook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Arc::new(WebhookNotifier::new(url)?)),
        _ => Ok(Arc::new(LogNotifier)),
    }
}
