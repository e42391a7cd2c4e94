// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-invocation benchmark runner.
//!
//! One end-to-end timed call: build the request, stream the response
//! while capturing time-to-first-byte and time-to-last-byte, pick up
//! token counts from the terminal metadata event, compute cost, and
//! optionally grade the response with the judge. Always returns a
//! record — a client error becomes a recorded status, never a
//! propagated failure.

use chrono::Utc;
use futures::StreamExt;
use llm_benchmark_client::request::build_task_request;
use llm_benchmark_client::{ConverseRequest, InferenceClient, StreamEvent};
use llm_benchmark_core::{compute_cost, CallStatus, InvocationRecord, RunConfig, Scenario};
use std::time::Instant;
use tracing::debug;

use crate::judge::JudgeEvaluator;

/// Run one timed invocation of `scenario` and produce its record.
///
/// Telemetry fields that were not captured before a failure stay
/// `None`, distinguishing "didn't happen" from "happened instantly".
/// The failure of one invocation never propagates to siblings.
pub async fn run_invocation(
    client: &dyn InferenceClient,
    judge: Option<&JudgeEvaluator>,
    scenario: &Scenario,
    config: &RunConfig,
    invocation_id: u32,
) -> InvocationRecord {
    let (messages, inference) = build_task_request(
        &scenario.prompt,
        scenario.expected_output_tokens,
        &scenario.task.task_type,
        &scenario.task.task_criteria,
        config.temperature,
        config.top_p,
    );
    let request = ConverseRequest {
        model_id: scenario.model_id.clone(),
        messages,
        inference,
        latency_profile: Some(scenario.inference_profile.clone()),
    };

    let timestamp = Utc::now();
    let start = Instant::now();

    let mut status = CallStatus::Success;
    let mut error_message = None;
    let mut response = String::new();
    let mut ttfb = None;
    let mut ttlb = None;
    let mut input_tokens = None;
    let mut output_tokens = None;
    let mut cost = None;

    match client.converse_stream(&request).await {
        Ok(mut stream) => {
            while let Some(event) = stream.next().await {
                match event {
                    Ok(StreamEvent::ContentDelta { text }) => {
                        if ttfb.is_none() {
                            ttfb = Some(start.elapsed().as_secs_f64());
                        }
                        response.push_str(&text);
                    }
                    Ok(StreamEvent::MessageStop { stop_reason }) => {
                        ttlb = Some(start.elapsed().as_secs_f64());
                        debug!(model = %scenario.model_id, stop_reason, "stream stopped");
                    }
                    Ok(StreamEvent::Metadata { usage }) => {
                        input_tokens = Some(usage.input_tokens);
                        output_tokens = Some(usage.output_tokens);
                        cost = Some(compute_cost(
                            usage.input_tokens,
                            usage.output_tokens,
                            scenario.input_token_cost,
                            scenario.output_token_cost,
                        ));
                    }
                    Err(err) => {
                        status = CallStatus::Error(err.code().to_string());
                        error_message = Some(err.to_string());
                        break;
                    }
                }
            }
            // Streams without an explicit stop event still get a last-byte
            // time, but only when a first byte was ever seen.
            if status.is_success() && ttlb.is_none() && ttfb.is_some() {
                ttlb = Some(start.elapsed().as_secs_f64());
            }
        }
        Err(err) => {
            status = CallStatus::Error(err.code().to_string());
            error_message = Some(err.to_string());
        }
    }

    let mut judge_verdict = None;
    let mut judge_explanation = None;
    if let Some(judge) = judge {
        if status.is_success() && !response.is_empty() {
            let judgment = judge
                .evaluate(
                    &scenario.prompt,
                    &response,
                    &scenario.golden_answer,
                    &scenario.task.task_type,
                    &scenario.task.task_criteria,
                )
                .await;
            judge_verdict = Some(judgment.verdict);
            judge_explanation = Some(judgment.explanation);
        }
    }

    InvocationRecord {
        model: scenario.model_id.clone(),
        region: scenario.region.clone(),
        inference_profile: scenario.inference_profile.clone(),
        task_type: scenario.task.task_type.clone(),
        invocation_id,
        timestamp,
        time_to_first_byte: ttfb,
        time_to_last_byte: ttlb,
        input_tokens,
        output_tokens,
        response_cost: cost,
        model_response: response,
        golden_answer: scenario.golden_answer.clone(),
        api_call_status: status,
        error_message,
        judge_verdict,
        judge_explanation,
        task_completion: 0.0,
        configured_output_tokens: scenario.expected_output_tokens,
        input_token_cost: scenario.input_token_cost,
        output_token_cost: scenario.output_token_cost,
        temperature: config.temperature,
        top_p: config.top_p,
        experiment_name: config.experiment_name.clone(),
    }
}
