// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured client errors.
//!
//! Every terminal failure carries a stable error code string so the
//! engine can record it on the invocation record and the aggregator
//! can separate throttled calls from other failures.

use thiserror::Error;

/// Errors that can occur during inference endpoint calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint rejected the call due to rate limiting.
    #[error("throttled by inference endpoint: {message}")]
    Throttling {
        /// Endpoint-provided detail.
        message: String,
    },

    /// The endpoint rejected the request as malformed.
    #[error("request rejected by inference endpoint: {message}")]
    Validation {
        /// Endpoint-provided detail.
        message: String,
    },

    /// The caller is not authorized for this model or region.
    #[error("access denied by inference endpoint: {message}")]
    AccessDenied {
        /// Endpoint-provided detail.
        message: String,
    },

    /// The requested model does not exist at this endpoint.
    #[error("model not found: {message}")]
    NotFound {
        /// Endpoint-provided detail.
        message: String,
    },

    /// The endpoint failed with a server-side error.
    #[error("inference endpoint error (HTTP {status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Endpoint-provided detail.
        message: String,
    },

    /// The request never completed at the transport level.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint produced a payload the adapter cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The endpoint configuration is unusable (bad template, no URL).
    #[error("invalid endpoint configuration: {0}")]
    Configuration(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Stable structured code recorded on invocation records.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Throttling { .. } => "ThrottlingException",
            ClientError::Validation { .. } => "ValidationException",
            ClientError::AccessDenied { .. } => "AccessDeniedException",
            ClientError::NotFound { .. } => "ResourceNotFoundException",
            ClientError::Service { status, .. } if *status == 503 => {
                "ServiceUnavailableException"
            }
            ClientError::Service { .. } => "InternalServerException",
            ClientError::Transport(_) => "TransportError",
            ClientError::Protocol(_) => "ProtocolError",
            ClientError::Configuration(_) => "ConfigurationError",
        }
    }

    /// Whether the transport layer may retry this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Throttling { .. } | ClientError::Service { .. } => true,
            ClientError::Transport(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
