// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pure request body builders.
//!
//! Both builders are deterministic functions of their inputs with no
//! side effects: one for the task prompt sent to the model under test,
//! one for the judge prompt that grades a response against the golden
//! answer.

use crate::types::{InferenceConfig, Message};

/// Maximum output tokens for a judge call.
pub const JUDGE_MAX_TOKENS: u32 = 500;

/// Judge sampling temperature, kept low to stabilize verdicts.
pub const JUDGE_TEMPERATURE: f32 = 0.1;

/// Judge nucleus sampling parameter.
pub const JUDGE_TOP_P: f32 = 0.9;

/// Build the primary task payload.
pub fn build_task_request(
    prompt: &str,
    max_tokens: u32,
    _task_type: &str,
    _task_criteria: &str,
    temperature: f32,
    top_p: f32,
) -> (Vec<Message>, InferenceConfig) {
    // Task-type-specific system instructions are not used yet; the
    // prompt goes through under a bare user marker.
    let system_prompt = "";
    let messages = vec![Message::user(format!("{system_prompt}\n##USER:{prompt}"))];

    let inference = InferenceConfig {
        max_tokens,
        temperature,
        top_p,
    };

    (messages, inference)
}

/// Build the judge payload grading `model_response` against
/// `golden_answer`.
///
/// The embedded instruction template demands a verdict of exactly
/// `PASS` or `FAIL` and restricts failure reasons to a closed tag set;
/// sampling is fixed low so repeated judgments of the same input stay
/// consistent.
pub fn build_judge_request(
    prompt: &str,
    model_response: &str,
    golden_answer: &str,
    task_type: &str,
    task_criteria: &str,
) -> (Vec<Message>, InferenceConfig) {
    let judge_prompt = format!(
        r#"You are an expert evaluator of AI assistant responses. Your task is to determine if a model's response successfully completes the requested task.

TASK TYPE: {task_type}

EVALUATION CRITERIA:
- {task_criteria}

General criteria:
- Correctness: Information must be factually accurate
- Completeness: All parts of the task must be addressed
- Relevance: Response must be on-topic and address the prompt
- Format: Response should follow any formatting requirements

ORIGINAL PROMPT:
{prompt}

MODEL RESPONSE:
{model_response}

GOLDEN ANSWER (Reference):
{golden_answer}

INSTRUCTIONS:
1. Carefully compare the model response to the golden answer
2. Determine if the response successfully meets all requested tasks
3. Provide your judgment as "PASS" or "FAIL" do not start with nothing else
4. If the judgment is a "FAIL" include the reason choose from ['Correctness', 'Completeness', 'Relevance', 'Format'] nothing else
5. If the judgment is a "PASS" say "Model output meets golden answer criteria" nothing else
6. Even if the model response differs from the golden answer, it can PASS if it correctly fulfills the required tasks

JUDGMENT:
"#
    );

    let messages = vec![Message::user(judge_prompt)];

    let inference = InferenceConfig {
        max_tokens: JUDGE_MAX_TOKENS,
        temperature: JUDGE_TEMPERATURE,
        top_p: JUDGE_TOP_P,
    };

    (messages, inference)
}
