// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-invocation result records.
//!
//! [`InvocationRecord`] is the atomic unit of benchmark output: one
//! flat record per call attempt, created once and never mutated.
//! Telemetry that was not captured on an error path stays `None` to
//! distinguish "didn't happen" from "happened instantly".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured status code recorded for throttled calls.
pub const THROTTLING_STATUS: &str = "ThrottlingException";

/// Outcome of the primary inference call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    /// The call completed and produced a response.
    Success,
    /// The call terminally failed with a structured error code
    /// (e.g. `ThrottlingException`, `ValidationException`).
    Error(String),
}

impl CallStatus {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CallStatus::Success)
    }

    /// Whether the call was terminally throttled.
    pub fn is_throttled(&self) -> bool {
        matches!(self, CallStatus::Error(code) if code == THROTTLING_STATUS)
    }

    /// The status as a stable string code.
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Success => "Success",
            CallStatus::Error(code) => code,
        }
    }
}

impl From<String> for CallStatus {
    fn from(value: String) -> Self {
        if value == "Success" {
            CallStatus::Success
        } else {
            CallStatus::Error(value)
        }
    }
}

impl From<CallStatus> for String {
    fn from(value: CallStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Verdict produced by the judge model for one response.
///
/// `None` on the record means the judge was not invoked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JudgeVerdict {
    /// The response meets the golden answer criteria.
    Pass,
    /// The response fails one or more evaluation criteria.
    Fail,
    /// The judge call itself failed or produced unusable output.
    Error,
}

/// Compute the monetary cost of one invocation.
///
/// Exactly `input_tokens * input_token_cost + output_tokens *
/// output_token_cost`, for any combination of nonnegative token counts
/// and unit costs.
pub fn compute_cost(
    input_tokens: u32,
    output_tokens: u32,
    input_token_cost: f64,
    output_token_cost: f64,
) -> f64 {
    f64::from(input_tokens) * input_token_cost + f64::from(output_tokens) * output_token_cost
}

/// One flat record per call attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Model under test.
    pub model: String,
    /// Region the call targeted.
    pub region: String,
    /// Latency profile requested for the call.
    pub inference_profile: String,
    /// Task type of the scenario.
    pub task_type: String,
    /// Sequence number within the scenario, strictly monotonic.
    pub invocation_id: u32,
    /// UTC timestamp taken when the call started.
    pub timestamp: DateTime<Utc>,
    /// Seconds from call start to the first streamed content fragment.
    pub time_to_first_byte: Option<f64>,
    /// Seconds from call start to stream completion.
    pub time_to_last_byte: Option<f64>,
    /// Input token count reported by the endpoint.
    pub input_tokens: Option<u32>,
    /// Output token count reported by the endpoint.
    pub output_tokens: Option<u32>,
    /// Computed cost of this invocation; absent when token usage never
    /// arrived.
    pub response_cost: Option<f64>,
    /// Accumulated response text (possibly partial on error).
    pub model_response: String,
    /// Reference answer from the scenario.
    pub golden_answer: String,
    /// Call outcome.
    pub api_call_status: CallStatus,
    /// Full error text for failed calls.
    pub error_message: Option<String>,
    /// Judge verdict; `None` when the judge was not invoked.
    pub judge_verdict: Option<JudgeVerdict>,
    /// Normalized judge explanation.
    pub judge_explanation: Option<String>,
    /// Reserved automatic task-completion signal. Nothing populates it
    /// yet; it is always 0.0.
    pub task_completion: f64,
    /// Output token budget that was requested.
    pub configured_output_tokens: u32,
    /// Unit cost per input token from the scenario.
    pub input_token_cost: f64,
    /// Unit cost per output token from the scenario.
    pub output_token_cost: f64,
    /// Sampling temperature echoed from the run configuration.
    pub temperature: f32,
    /// Nucleus sampling parameter echoed from the run configuration.
    pub top_p: f32,
    /// Experiment label echoed from the run configuration.
    pub experiment_name: String,
}

impl InvocationRecord {
    /// Whether the primary call succeeded.
    pub fn is_success(&self) -> bool {
        self.api_call_status.is_success()
    }

    /// Whether the judge passed this response.
    pub fn judge_passed(&self) -> Option<bool> {
        match self.judge_verdict {
            Some(JudgeVerdict::Pass) => Some(true),
            Some(JudgeVerdict::Fail) => Some(false),
            // ERROR verdicts carry no quality signal.
            Some(JudgeVerdict::Error) | None => None,
        }
    }

    /// Output tokens per second, when both inputs are available.
    pub fn output_tokens_per_second(&self) -> Option<f64> {
        let tokens = self.output_tokens?;
        let ttlb = self.time_to_last_byte?;
        if ttlb <= 0.0 {
            return None;
        }
        Some(f64::from(tokens) / ttlb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> InvocationRecord {
        InvocationRecord {
            model: "provider.model-v1".to_string(),
            region: "us-east-1".to_string(),
            inference_profile: "optimized".to_string(),
            task_type: "qa".to_string(),
            invocation_id: 0,
            timestamp: Utc::now(),
            time_to_first_byte: Some(0.4),
            time_to_last_byte: Some(2.0),
            input_tokens: Some(100),
            output_tokens: Some(50),
            response_cost: Some(compute_cost(100, 50, 0.000003, 0.000015)),
            model_response: "answer".to_string(),
            golden_answer: "answer".to_string(),
            api_call_status: CallStatus::Success,
            error_message: None,
            judge_verdict: Some(JudgeVerdict::Pass),
            judge_explanation: Some("Model output meets golden answer criteria".to_string()),
            task_completion: 0.0,
            configured_output_tokens: 100,
            input_token_cost: 0.000003,
            output_token_cost: 0.000015,
            temperature: 1.0,
            top_p: 1.0,
            experiment_name: "test".to_string(),
        }
    }

    #[test]
    fn test_compute_cost_identity() {
        assert_eq!(compute_cost(10, 20, 0.5, 0.25), 10.0 * 0.5 + 20.0 * 0.25);
        assert_eq!(compute_cost(0, 0, 1.0, 1.0), 0.0);
        assert_eq!(compute_cost(100, 50, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_call_status_roundtrip() {
        let throttled = CallStatus::from(THROTTLING_STATUS.to_string());
        assert!(throttled.is_throttled());
        assert!(!throttled.is_success());
        assert_eq!(String::from(throttled), THROTTLING_STATUS);

        let success = CallStatus::from("Success".to_string());
        assert!(success.is_success());
    }

    #[test]
    fn test_call_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&CallStatus::Error("ValidationException".into())).unwrap();
        assert_eq!(json, "\"ValidationException\"");
        let back: CallStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CallStatus::Error("ValidationException".into()));
    }

    #[test]
    fn test_judge_passed_mapping() {
        let mut rec = record();
        assert_eq!(rec.judge_passed(), Some(true));
        rec.judge_verdict = Some(JudgeVerdict::Fail);
        assert_eq!(rec.judge_passed(), Some(false));
        rec.judge_verdict = Some(JudgeVerdict::Error);
        assert_eq!(rec.judge_passed(), None);
        rec.judge_verdict = None;
        assert_eq!(rec.judge_passed(), None);
    }

    #[test]
    fn test_output_tokens_per_second() {
        let rec = record();
        assert_eq!(rec.output_tokens_per_second(), Some(25.0));

        let zero_ttlb = InvocationRecord {
            time_to_last_byte: Some(0.0),
            ..record()
        };
        assert_eq!(zero_ttlb.output_tokens_per_second(), None);

        let missing = InvocationRecord {
            output_tokens: None,
            ..record()
        };
        assert_eq!(missing.output_tokens_per_second(), None);
    }

    #[test]
    fn test_ttfb_not_after_ttlb_for_successful_record() {
        let rec = record();
        let (ttfb, ttlb) = (
            rec.time_to_first_byte.unwrap(),
            rec.time_to_last_byte.unwrap(),
        );
        assert!(ttfb <= ttlb);
    }
}
