// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark scenarios and scenario loading.
//!
//! A [`Scenario`] is one (prompt, model, region, profile) unit of
//! benchmarking work, repeated N times by the executor. Scenarios are
//! loaded from a JSON Lines source, one object per line:
//!
//! ```json
//! {"text_prompt": "...", "task": {"task_type": "qa", "task_criteria": "..."},
//!  "golden_answer": "...", "model_id": "...", "region": "us-east-1",
//!  "inference_profile": "optimized", "input_token_cost": 0.000003,
//!  "output_token_cost": 0.000015, "expected_output_tokens": 100}
//! ```
//!
//! Malformed lines are dropped with a warning and do not affect the
//! remaining scenarios.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use thiserror::Error;
use tracing::warn;

/// Default latency profile requested from the inference endpoint.
pub const DEFAULT_INFERENCE_PROFILE: &str = "optimized";

/// Default output token budget for a scenario.
pub const DEFAULT_EXPECTED_OUTPUT_TOKENS: u32 = 100;

/// Errors that can occur while loading scenarios.
#[derive(Debug, Error)]
pub enum ScenarioLoadError {
    /// A line was not valid JSON or did not match the scenario shape.
    #[error("malformed scenario line {line}: {source}")]
    MalformedLine {
        /// 1-based line number in the source.
        line: usize,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The source could not be read.
    #[error("failed to read scenario source: {0}")]
    Io(#[from] std::io::Error),

    /// The source contained no usable scenarios.
    #[error("no valid scenarios found in input")]
    Empty,
}

/// Task description attached to a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task category (e.g. "summarization", "qa").
    pub task_type: String,
    /// Free-text evaluation rubric for the judge.
    pub task_criteria: String,
}

/// Raw scenario line as it appears in the JSONL source.
#[derive(Debug, Deserialize)]
struct ScenarioLine {
    text_prompt: String,
    task: Task,
    golden_answer: String,
    model_id: String,
    region: String,
    #[serde(default = "default_profile")]
    inference_profile: String,
    #[serde(default)]
    input_token_cost: f64,
    #[serde(default)]
    output_token_cost: f64,
    #[serde(default = "default_expected_tokens")]
    expected_output_tokens: u32,
}

fn default_profile() -> String {
    DEFAULT_INFERENCE_PROFILE.to_string()
}

fn default_expected_tokens() -> u32 {
    DEFAULT_EXPECTED_OUTPUT_TOKENS
}

/// One model/prompt pairing to benchmark.
///
/// Immutable once loaded; consumed read-only by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Prompt text sent to the model under test.
    pub prompt: String,
    /// Task type and evaluation rubric.
    pub task: Task,
    /// Reference answer the judge compares against.
    pub golden_answer: String,
    /// Identifier of the model under test.
    pub model_id: String,
    /// Target region/endpoint for the model under test.
    pub region: String,
    /// Requested latency profile ("standard" or "optimized").
    pub inference_profile: String,
    /// Cost per input token, in currency units.
    pub input_token_cost: f64,
    /// Cost per output token, in currency units.
    pub output_token_cost: f64,
    /// Output token budget requested from the endpoint.
    pub expected_output_tokens: u32,
}

impl Scenario {
    /// Parse a single JSONL scenario line.
    pub fn from_json_line(line: &str, line_number: usize) -> Result<Self, ScenarioLoadError> {
        let raw: ScenarioLine = serde_json::from_str(line.trim()).map_err(|source| {
            ScenarioLoadError::MalformedLine {
                line: line_number,
                source,
            }
        })?;

        Ok(Self {
            prompt: raw.text_prompt,
            task: raw.task,
            golden_answer: raw.golden_answer,
            model_id: raw.model_id,
            region: raw.region,
            inference_profile: raw.inference_profile,
            input_token_cost: raw.input_token_cost,
            output_token_cost: raw.output_token_cost,
            expected_output_tokens: raw.expected_output_tokens,
        })
    }

    /// Check that the scenario carries the fields the executor needs.
    ///
    /// Returns a description of the first missing field, if any. The
    /// executor treats a failing scenario as a scenario-level error and
    /// drops it without affecting siblings.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_id.trim().is_empty() {
            return Err("scenario has an empty model_id".to_string());
        }
        if self.prompt.trim().is_empty() {
            return Err("scenario has an empty prompt".to_string());
        }
        if self.region.trim().is_empty() {
            return Err("scenario has an empty region".to_string());
        }
        Ok(())
    }

    /// Load scenarios from a JSON Lines reader.
    ///
    /// Malformed lines are logged and skipped. Returns
    /// [`ScenarioLoadError::Empty`] when no line parsed, since a run
    /// over zero scenarios cannot produce anything meaningful.
    pub fn load_jsonl<R: BufRead>(reader: R) -> Result<Vec<Self>, ScenarioLoadError> {
        let mut scenarios = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Self::from_json_line(&line, idx + 1) {
                Ok(scenario) => scenarios.push(scenario),
                Err(err) => warn!("dropping scenario: {err}"),
            }
        }

        if scenarios.is_empty() {
            return Err(ScenarioLoadError::Empty);
        }
        Ok(scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_LINE: &str = r#"{"text_prompt": "Summarize this.", "task": {"task_type": "summarization", "task_criteria": "Covers all key points"}, "golden_answer": "A summary.", "model_id": "provider.model-v1", "region": "us-east-1", "input_token_cost": 0.000003, "output_token_cost": 0.000015, "expected_output_tokens": 250}"#;

    #[test]
    fn test_parse_valid_line() {
        let scenario = Scenario::from_json_line(VALID_LINE, 1).unwrap();
        assert_eq!(scenario.model_id, "provider.model-v1");
        assert_eq!(scenario.task.task_type, "summarization");
        assert_eq!(scenario.expected_output_tokens, 250);
        assert_eq!(scenario.inference_profile, "optimized");
    }

    #[test]
    fn test_defaults_applied() {
        let line = r#"{"text_prompt": "p", "task": {"task_type": "qa", "task_criteria": "c"}, "golden_answer": "g", "model_id": "m", "region": "r"}"#;
        let scenario = Scenario::from_json_line(line, 1).unwrap();
        assert_eq!(scenario.inference_profile, DEFAULT_INFERENCE_PROFILE);
        assert_eq!(
            scenario.expected_output_tokens,
            DEFAULT_EXPECTED_OUTPUT_TOKENS
        );
        assert_eq!(scenario.input_token_cost, 0.0);
        assert_eq!(scenario.output_token_cost, 0.0);
    }

    #[test]
    fn test_malformed_line_is_error() {
        let err = Scenario::from_json_line("{not json", 7).unwrap_err();
        assert!(matches!(
            err,
            ScenarioLoadError::MalformedLine { line: 7, .. }
        ));
    }

    #[test]
    fn test_load_jsonl_skips_malformed_lines() {
        let input = format!("{VALID_LINE}\nnot json at all\n\n{VALID_LINE}\n");
        let scenarios = Scenario::load_jsonl(input.as_bytes()).unwrap();
        assert_eq!(scenarios.len(), 2);
    }

    #[test]
    fn test_load_jsonl_empty_input_is_error() {
        let err = Scenario::load_jsonl("not json\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScenarioLoadError::Empty));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut scenario = Scenario::from_json_line(VALID_LINE, 1).unwrap();
        assert!(scenario.validate().is_ok());

        scenario.model_id = "  ".to_string();
        assert!(scenario.validate().is_err());
    }
}
