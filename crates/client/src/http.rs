// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! reqwest-based inference endpoint client.
//!
//! One [`HttpInferenceClient`] targets one region. Streaming responses
//! arrive as server-sent-event lines (`data: {json-event}`); the
//! adapter splits them into [`StreamEvent`]s. Transient failures
//! (throttling, server errors, connect timeouts) are retried with a
//! bounded attempt budget before surfacing a terminal error.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::types::{ConverseOutput, ConverseRequest, StreamEvent};
use crate::{ClientFactory, EventStream, InferenceClient};

/// Placeholder substituted with the target region in endpoint
/// templates.
pub const REGION_PLACEHOLDER: &str = "{region}";

/// Default bounded retry budget for transient failures.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 5;

/// Connection configuration shared by all per-region clients.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Endpoint URL template, e.g.
    /// `https://runtime.{region}.example.com`.
    pub endpoint_template: String,
    /// Optional bearer token attached to every request.
    pub api_key: Option<String>,
    /// Bounded attempt budget for transient failures.
    pub max_retry_attempts: u32,
    /// Per-request timeout covering the full round trip, including the
    /// duration of streaming.
    pub request_timeout: Duration,
    /// Base delay for exponential retry backoff.
    pub retry_base_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            endpoint_template: format!("https://runtime.{REGION_PLACEHOLDER}.example.com"),
            api_key: None,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            request_timeout: Duration::from_secs(300),
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

/// HTTP client for one inference endpoint region.
#[derive(Debug)]
pub struct HttpInferenceClient {
    http: reqwest::Client,
    base_url: String,
    config: HttpClientConfig,
}

impl HttpInferenceClient {
    /// Build a client for the given region.
    ///
    /// This is cheap and side-effect free beyond holding connection
    /// configuration.
    pub fn for_region(config: &HttpClientConfig, region: &str) -> Result<Self> {
        if config.endpoint_template.trim().is_empty() {
            return Err(ClientError::Configuration(
                "endpoint template is empty".to_string(),
            ));
        }
        let base_url = config
            .endpoint_template
            .replace(REGION_PLACEHOLDER, region)
            .trim_end_matches('/')
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            config: config.clone(),
        })
    }

    fn request_body(request: &ConverseRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "messages": request.messages,
            "inferenceConfig": request.inference,
        });
        if let Some(profile) = &request.latency_profile {
            body["performanceConfig"] = serde_json::json!({ "latency": profile });
        }
        body
    }

    async fn classify_failure(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        match status {
            429 => ClientError::Throttling { message },
            400 | 422 => ClientError::Validation { message },
            401 | 403 => ClientError::AccessDenied { message },
            404 => ClientError::NotFound { message },
            _ => ClientError::Service { status, message },
        }
    }

    /// Send a request, retrying transient failures up to the bounded
    /// attempt budget. Retry is opaque to callers.
    async fn send_with_retry(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let mut request = self.http.post(url).json(body);
            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => Self::classify_failure(response).await,
                Err(err) => ClientError::Transport(err),
            };

            if error.is_retryable() && attempt < self.config.max_retry_attempts {
                let delay = self.config.retry_base_delay * 2u32.saturating_pow(attempt - 1);
                debug!(
                    attempt,
                    max_attempts = self.config.max_retry_attempts,
                    code = error.code(),
                    "retrying transient endpoint failure in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            warn!(code = error.code(), "terminal endpoint failure: {error}");
            return Err(error);
        }
    }
}

struct SseState {
    inner: futures::stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    buffer: Vec<u8>,
    pending: VecDeque<StreamEvent>,
    done: bool,
}

impl SseState {
    /// Drain complete lines from the buffer into pending events.
    ///
    /// The buffer holds raw bytes: a multi-byte UTF-8 character may be
    /// split across network chunks, so decoding happens per complete
    /// line, never per chunk.
    fn drain_lines(&mut self) -> Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end();
            if let Some(payload) = line.strip_prefix("data: ") {
                if payload == "[DONE]" {
                    self.done = true;
                    break;
                }
                if let Some(event) = StreamEvent::from_json_str(payload)? {
                    self.pending.push_back(event);
                }
            }
        }
        Ok(())
    }
}

fn event_stream_from_response(response: reqwest::Response) -> EventStream {
    let state = SseState {
        inner: response.bytes_stream().boxed(),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    if let Err(err) = state.drain_lines() {
                        state.done = true;
                        return Some((Err(err), state));
                    }
                }
                Some(Err(err)) => {
                    state.done = true;
                    return Some((Err(ClientError::Transport(err)), state));
                }
                None => {
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseOutput> {
        let url = format!("{}/model/{}/converse", self.base_url, request.model_id);
        let body = Self::request_body(request);
        let response = self.send_with_retry(&url, &body).await?;
        let value: serde_json::Value = response.json().await?;
        ConverseOutput::from_json(value)
    }

    async fn converse_stream(&self, request: &ConverseRequest) -> Result<EventStream> {
        let url = format!(
            "{}/model/{}/converse-stream",
            self.base_url, request.model_id
        );
        let body = Self::request_body(request);
        let response = self.send_with_retry(&url, &body).await?;
        Ok(event_stream_from_response(response))
    }
}

/// Factory producing one [`HttpInferenceClient`] per target region.
pub struct HttpClientFactory {
    config: HttpClientConfig,
}

impl HttpClientFactory {
    /// Create a factory from shared connection configuration.
    pub fn new(config: HttpClientConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn client_for_region(&self, region: &str) -> Result<Arc<dyn InferenceClient>> {
        Ok(Arc::new(HttpInferenceClient::for_region(
            &self.config,
            region,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::build_task_request;

    fn request() -> ConverseRequest {
        let (messages, inference) = build_task_request("hi", 16, "qa", "c", 1.0, 1.0);
        ConverseRequest {
            model_id: "provider.model-v1".to_string(),
            messages,
            inference,
            latency_profile: Some("optimized".to_string()),
        }
    }

    #[test]
    fn test_region_substitution() {
        let config = HttpClientConfig {
            endpoint_template: "https://runtime.{region}.example.com/".to_string(),
            ..HttpClientConfig::default()
        };
        let client = HttpInferenceClient::for_region(&config, "us-east-1").unwrap();
        assert_eq!(client.base_url, "https://runtime.us-east-1.example.com");
    }

    #[test]
    fn test_empty_template_rejected() {
        let config = HttpClientConfig {
            endpoint_template: "  ".to_string(),
            ..HttpClientConfig::default()
        };
        let err = HttpInferenceClient::for_region(&config, "us-east-1").unwrap_err();
        assert_eq!(err.code(), "ConfigurationError");
    }

    #[test]
    fn test_request_body_includes_latency_profile() {
        let body = HttpInferenceClient::request_body(&request());
        assert_eq!(body["performanceConfig"]["latency"], "optimized");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 16);
        assert!(body["messages"].is_array());
    }

    #[test]
    fn test_request_body_omits_absent_profile() {
        let mut req = request();
        req.latency_profile = None;
        let body = HttpInferenceClient::request_body(&req);
        assert!(body.get("performanceConfig").is_none());
    }

    fn empty_state() -> SseState {
        SseState {
            inner: futures::stream::empty().boxed(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    #[test]
    fn test_sse_line_draining() {
        let mut state = empty_state();
        state.buffer.extend_from_slice(
            b"data: {\"contentBlockDelta\":{\"delta\":{\"text\":\"a\"}}}\n\ndata: {\"messageStop\":{\"stopReason\":\"end_turn\"}}\ndata: [DONE]\n",
        );
        state.drain_lines().unwrap();
        assert!(state.done);
        assert_eq!(state.pending.len(), 2);
        assert_eq!(
            state.pending.pop_front(),
            Some(StreamEvent::ContentDelta { text: "a".into() })
        );
    }

    #[test]
    fn test_partial_line_stays_buffered() {
        let mut state = empty_state();
        state.buffer.extend_from_slice(b"data: {\"contentBlock");
        state.drain_lines().unwrap();
        assert!(state.pending.is_empty());
        assert_eq!(state.buffer, b"data: {\"contentBlock");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let frame = "data: {\"contentBlockDelta\":{\"delta\":{\"text\":\"\u{e9}\"}}}\n".as_bytes();
        // Split inside the two-byte sequence of 'é'.
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut state = empty_state();
        state.buffer.extend_from_slice(&frame[..split]);
        state.drain_lines().unwrap();
        assert!(state.pending.is_empty());

        state.buffer.extend_from_slice(&frame[split..]);
        state.drain_lines().unwrap();
        assert_eq!(
            state.pending.pop_front(),
            Some(StreamEvent::ContentDelta {
                text: "\u{e9}".into()
            })
        );
    }
}
