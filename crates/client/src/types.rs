// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire types for the converse request/response boundary.
//!
//! The request carries role/content-block messages, an inference
//! configuration, and an optional latency-profile hint. A streaming
//! response is a sequence of content-delta events, a terminal stop
//! event with a stop reason, and a terminal metadata event carrying
//! input/output token counts.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user message.
    User,
    /// Model-generated message.
    Assistant,
}

/// A single block of text content within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Text payload.
    pub text: String,
}

/// One conversational message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Content blocks.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Build a user message with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock { text: text.into() }],
        }
    }
}

/// Sampling configuration for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
}

/// A fully assembled request for either call shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseRequest {
    /// Target model identifier.
    pub model_id: String,
    /// Conversation payload.
    pub messages: Vec<Message>,
    /// Sampling configuration.
    pub inference: InferenceConfig,
    /// Optional latency-profile hint ("standard" or "optimized").
    pub latency_profile: Option<String>,
}

/// Token usage counters reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input/prompt tokens.
    pub input_tokens: u32,
    /// Output/completion tokens.
    pub output_tokens: u32,
}

/// Events produced by a streaming call.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A partial text fragment.
    ContentDelta {
        /// Text appended to the response.
        text: String,
    },
    /// Terminal stop event.
    MessageStop {
        /// Reason the stream ended (e.g. "end_turn", "max_tokens").
        stop_reason: String,
    },
    /// Terminal metadata event carrying usage counters.
    Metadata {
        /// Token usage for the call.
        usage: TokenUsage,
    },
}

#[derive(Debug, Deserialize)]
struct WireDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContentBlockDelta {
    #[serde(default)]
    delta: Option<WireDelta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessageStop {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(default)]
    content_block_delta: Option<WireContentBlockDelta>,
    #[serde(default)]
    message_stop: Option<WireMessageStop>,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

impl StreamEvent {
    /// Parse one wire event from its JSON payload.
    ///
    /// Returns `Ok(None)` for event types the engine does not consume
    /// (e.g. content-block start/stop markers); the stream simply
    /// skips them.
    pub fn from_json_str(payload: &str) -> Result<Option<Self>> {
        let wire: WireEvent = serde_json::from_str(payload)
            .map_err(|err| ClientError::Protocol(format!("unparseable stream event: {err}")))?;

        if let Some(delta) = wire.content_block_delta {
            let text = delta.delta.and_then(|d| d.text).unwrap_or_default();
            return Ok(Some(StreamEvent::ContentDelta { text }));
        }
        if let Some(stop) = wire.message_stop {
            return Ok(Some(StreamEvent::MessageStop {
                stop_reason: stop.stop_reason.unwrap_or_else(|| "Unknown".to_string()),
            }));
        }
        if let Some(metadata) = wire.metadata {
            if let Some(usage) = metadata.usage {
                return Ok(Some(StreamEvent::Metadata { usage }));
            }
            return Ok(None);
        }
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct WireOutputMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct WireOutput {
    message: WireOutputMessage,
}

#[derive(Debug, Deserialize)]
struct WireConverseResponse {
    output: WireOutput,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

/// Full message body returned by a non-streaming call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverseOutput {
    /// Concatenated response text.
    pub text: String,
    /// Token usage, when the endpoint reported it.
    pub usage: Option<TokenUsage>,
}

impl ConverseOutput {
    /// Parse the non-streaming response body.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let wire: WireConverseResponse = serde_json::from_value(value)
            .map_err(|err| ClientError::Protocol(format!("unparseable converse body: {err}")))?;
        let text = wire
            .output
            .message
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        Ok(Self {
            text,
            usage: wire.usage,
        })
    }
}
