// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! LLM-as-judge evaluation.
//!
//! The judge is a secondary inference call grading a model response
//! against a reference answer. Judges are noisy text generators, so
//! the verdict parser is deliberately tolerant: substring search, not
//! a strict grammar. Any transport or parse failure folds into an
//! `ERROR` verdict rather than crashing the worker that invoked it.

use llm_benchmark_client::request::build_judge_request;
use llm_benchmark_client::{ConverseRequest, InferenceClient};
use llm_benchmark_core::JudgeVerdict;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::error;

/// Closed set of failure-reason tags a judge may name.
pub const FAILURE_TAXONOMY: [&str; 4] = ["CORRECTNESS", "COMPLETENESS", "RELEVANCE", "FORMAT"];

static PASS_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^PASS\s*[:\-]?\s*").expect("static pattern"));

/// Transient result of one judge evaluation.
///
/// Folded into the enclosing invocation record, never persisted on
/// its own.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentResult {
    /// PASS/FAIL/ERROR verdict.
    pub verdict: JudgeVerdict,
    /// Normalized explanation: the judge's confirmation for PASS, a
    /// de-duplicated comma-joined tag set for FAIL, or the error text
    /// for ERROR.
    pub explanation: String,
    /// Raw judge output, kept for failure analysis.
    pub raw_response: String,
}

/// Parse a raw judge response into a verdict and normalized
/// explanation.
///
/// The verdict is PASS whenever the case-insensitive text contains the
/// substring `PASS`, otherwise FAIL. FAIL explanations are the set of
/// taxonomy tags named anywhere in the text, duplicates collapsed,
/// joined with commas in a deterministic order; empty when the judge
/// names no recognized tag.
pub fn parse_judgment(raw: &str) -> (JudgeVerdict, String) {
    let upper = raw.to_uppercase();

    if upper.contains("PASS") {
        let explanation = PASS_PREFIX.replace(raw.trim(), "").to_string();
        return (JudgeVerdict::Pass, explanation);
    }

    let tags: BTreeSet<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| FAILURE_TAXONOMY.contains(word))
        .collect();
    let explanation = tags.into_iter().collect::<Vec<_>>().join(",");

    (JudgeVerdict::Fail, explanation)
}

/// Grades model responses by calling a judge model.
pub struct JudgeEvaluator {
    client: Arc<dyn InferenceClient>,
    model_id: String,
}

impl JudgeEvaluator {
    /// Create an evaluator targeting the given judge model.
    pub fn new(client: Arc<dyn InferenceClient>, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    /// Evaluate one model response against the golden answer.
    ///
    /// Never fails: a judge-call error becomes a terminal `ERROR`
    /// verdict for this invocation, and the enclosing record is still
    /// produced with whatever telemetry was gathered.
    pub async fn evaluate(
        &self,
        prompt: &str,
        model_response: &str,
        golden_answer: &str,
        task_type: &str,
        task_criteria: &str,
    ) -> JudgmentResult {
        let (messages, inference) = build_judge_request(
            prompt,
            model_response,
            golden_answer,
            task_type,
            task_criteria,
        );
        let request = ConverseRequest {
            model_id: self.model_id.clone(),
            messages,
            inference,
            latency_profile: None,
        };

        match self.client.converse(&request).await {
            Ok(output) => {
                let (verdict, explanation) = parse_judgment(&output.text);
                JudgmentResult {
                    verdict,
                    explanation,
                    raw_response: output.text,
                }
            }
            Err(err) => {
                error!(model = %self.model_id, "judge evaluation failed: {err}");
                JudgmentResult {
                    verdict: JudgeVerdict::Error,
                    explanation: format!("Error in judge evaluation: {err}"),
                    raw_response: String::new(),
                }
            }
        }
    }
}
