// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference endpoint adapter for the LLM benchmark engine.
//!
//! This crate wraps calls to the model-inference endpoint, both for
//! the model under test and for the judge model. It exposes a
//! streaming call (`converse_stream`) yielding content deltas plus
//! terminal usage metadata, and a non-streaming call (`converse`)
//! returning the full message body.
//!
//! Transient throttling is retried at the transport layer with a
//! bounded attempt budget; this retry is opaque to callers. A call
//! either eventually succeeds or fails with a terminal
//! [`ClientError`] carrying a structured error code.
//!
//! # Modules
//!
//! - [`types`] - Wire types for the converse request/response boundary
//! - [`request`] - Pure request body builders (task and judge payloads)
//! - [`error`] - Structured client errors and retry classification
//! - [`http`] - reqwest-based HTTP client and per-region factory

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod request;
pub mod types;

pub use error::{ClientError, Result};
pub use http::{
    HttpClientConfig, HttpClientFactory, HttpInferenceClient, DEFAULT_MAX_RETRY_ATTEMPTS,
};
pub use types::{
    ContentBlock, ConverseOutput, ConverseRequest, InferenceConfig, Message, Role, StreamEvent,
    TokenUsage,
};

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Stream of content-delta events terminated by stop and metadata
/// events.
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// A client for one inference endpoint region.
///
/// Implementations must be cheap to construct and side-effect free
/// beyond holding connection configuration; the executor builds one
/// per scenario rather than sharing.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Issue a non-streaming call and return the full message body.
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseOutput>;

    /// Issue a streaming call and return a stream of content deltas
    /// plus terminal usage metadata.
    async fn converse_stream(&self, request: &ConverseRequest) -> Result<EventStream>;
}

/// Builds [`InferenceClient`] handles per target region.
pub trait ClientFactory: Send + Sync {
    /// Obtain a client for the given region.
    fn client_for_region(&self, region: &str) -> Result<Arc<dyn InferenceClient>>;
}
