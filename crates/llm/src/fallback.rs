//! Streaming-first completion with a single-shot fallback.

use crate::client::{collect_stream, LlmClient, LlmRequest, LlmResponse, LlmStream};
use resume_core::{AppError, AppResult};
use std::sync::Arc;

/// Wraps a provider so `complete` first streams, then retries once without
/// streaming.
///
/// This is the only automatic retry in the answer pipeline. A failed
/// streaming attempt discards any partial text.
pub struct FallbackClient {
    inner: Arc<dyn LlmClient>,
}

impl FallbackClient {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self { inner }
    }

    async fn try_stream(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let stream = self.inner.stream(request).await?;
        collect_stream(stream).await
    }
}

#[async_trait::async_trait]
impl LlmClient for FallbackClient {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let stream_err = match self.try_stream(request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        tracing::warn!(
            "Streaming completion via {} failed, retrying single-shot: {}",
            self.inner.provider_name(),
            stream_err
        );

        self.inner.complete(request).await.map_err(|single_err| {
            AppError::Generation(format!(
                "streaming attempt failed: {}; single-shot attempt failed: {}",
                stream_err, single_err
            ))
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.inner.stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LlmStreamChunk, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        stream_ok: bool,
        complete_ok: bool,
        stream_calls: AtomicUsize,
        complete_calls: AtomicUsize,
    }

    impl Scripted {
        fn new(stream_ok: bool, complete_ok: bool) -> Arc<Self> {
            Arc::new(Self {
                stream_ok,
                complete_ok,
                stream_calls: AtomicUsize::new(0),
                complete_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for Scripted {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            self.complete_calls.fetch_add(1, Ordering::SeqCst);
            if !self.complete_ok {
                return Err(AppError::Generation("503 unavailable".to_string()));
            }
            Ok(LlmResponse {
                content: "single".to_string(),
                model: "m".to_string(),
                usage: LlmUsage::default(),
                done: true,
            })
        }

        async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
            self.stream_calls.fetch_add(1, Ordering::SeqCst);
            if !self.stream_ok {
                return Err(AppError::Generation("stream refused".to_string()));
            }
            Ok(Box::pin(futures::stream::iter(vec![Ok(LlmStreamChunk {
                content: "streamed".to_string(),
                model: "m".to_string(),
                done: true,
                usage: None,
            })])))
        }
    }

    #[tokio::test]
    async fn test_stream_success_skips_single_shot() {
        let inner = Scripted::new(true, true);
        let client = FallbackClient::new(inner.clone());

        let response = client.complete(&LlmRequest::new("q", "m")).await.unwrap();
        assert_eq!(response.content, "streamed");
        assert_eq!(inner.complete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_once() {
        let inner = Scripted::new(false, true);
        let client = FallbackClient::new(inner.clone());

        let response = client.complete(&LlmRequest::new("q", "m")).await.unwrap();
        assert_eq!(response.content, "single");
        assert_eq!(inner.stream_calls.load(Ordering::SeqCst), 1);
        assert_eq!(inner.complete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_total_failure_reports_both_causes() {
        let inner = Scripted::new(false, false);
        let client = FallbackClient::new(inner.clone());

        let err = client.complete(&LlmRequest::new("q", "m")).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("stream refused"));
        assert!(msg.contains("503 unavailable"));
        assert_eq!(inner.complete_calls.load(Ordering::SeqCst), 1);
    }
}
