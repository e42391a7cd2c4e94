// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metric aggregation over invocation records.
//!
//! Groups successful records by model and inference profile and
//! derives the summary tables a run report is built from: judge pass
//! rates, cost totals and ratios, and latency distributions. Errored
//! and throttled calls are counted in the run-level totals only and
//! never contribute a group row.

use llm_benchmark_core::InvocationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregation group: one model under one inference profile.
///
/// Serialized as `model|profile` so the metric tables stay plain JSON
/// objects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GroupKey {
    /// Model identifier.
    pub model: String,
    /// Inference profile the invocations ran under.
    pub inference_profile: String,
}

impl GroupKey {
    fn of(record: &InvocationRecord) -> Self {
        Self {
            model: record.model.clone(),
            inference_profile: record.inference_profile.clone(),
        }
    }
}

impl From<GroupKey> for String {
    fn from(key: GroupKey) -> Self {
        format!("{}|{}", key.model, key.inference_profile)
    }
}

impl TryFrom<String> for GroupKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        // Profile names never contain '|', model identifiers might.
        let (model, inference_profile) = value
            .rsplit_once('|')
            .ok_or_else(|| format!("group key without separator: {value}"))?;
        Ok(Self {
            model: model.to_string(),
            inference_profile: inference_profile.to_string(),
        })
    }
}

/// Distribution summary of one sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// 50th percentile.
    pub p50: f64,
    /// 90th percentile.
    pub p90: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl SummaryStats {
    /// Summarize a sample set, or `None` when it is empty.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples
            .iter()
            .map(|sample| {
                let diff = sample - mean;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let percentile = |p: usize| -> f64 {
            let index = (n * p / 100).min(n - 1);
            sorted[index]
        };

        Some(Self {
            mean,
            p50: percentile(50),
            p90: percentile(90),
            std_dev: variance.sqrt(),
        })
    }
}

/// Quality and cost metrics for one group, successful calls only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Successful invocations in the group.
    pub sample_size: usize,
    /// Fraction of judged responses that passed; `None` when none of
    /// the group's records were judged.
    pub evaluation_success_rate: Option<f64>,
    /// Mean automatic task-completion signal. The signal is reserved
    /// and always zero today.
    pub task_completion_rate: f64,
    /// Sum of per-invocation costs.
    pub total_cost: f64,
    /// Mean cost per response, over records that reported a cost.
    pub avg_cost_per_response: Option<f64>,
    /// Mean input token count, over records that reported usage.
    pub avg_input_tokens: Option<f64>,
    /// Mean output token count, over records that reported usage.
    pub avg_output_tokens: Option<f64>,
    /// Evaluation success per currency unit
    /// (`evaluation_success_rate / avg_cost_per_response`). `None`
    /// when undefined: nothing judged, or zero average cost.
    pub value_ratio: Option<f64>,
    /// Average cost normalized to 1000 tokens
    /// (`avg_cost / (avg_input + avg_output) * 1000`). `None` when
    /// the token denominator is zero or unknown.
    pub cost_per_1000_tokens: Option<f64>,
}

/// Latency and throughput distributions for one group, successful
/// calls only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Successful invocations in the group.
    pub sample_size: usize,
    /// Time to first byte, seconds.
    pub time_to_first_byte: Option<SummaryStats>,
    /// Time to last byte, seconds.
    pub time_to_last_byte: Option<SummaryStats>,
    /// Output tokens per second of total stream time.
    pub output_tokens_per_second: Option<SummaryStats>,
}

/// Run-wide counters across every record, failed calls included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// All attempted invocations.
    pub total_calls: usize,
    /// Invocations with a success status.
    pub successful_calls: usize,
    /// Invocations with an error status.
    pub errored_calls: usize,
    /// Errored invocations caused by throttling.
    pub throttled_calls: usize,
}

/// Full aggregation output for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Run-wide counters.
    pub totals: RunTotals,
    /// Quality and cost table, keyed by group.
    pub performance: BTreeMap<GroupKey, PerformanceMetrics>,
    /// Latency table, keyed by group.
    pub latency: BTreeMap<GroupKey, LatencyMetrics>,
}

/// Aggregate a record set into per-group metric tables.
///
/// Pure recomputation over the full set; always safe to re-run. An
/// empty or all-failed input yields empty tables and populated totals
/// rather than an error.
pub fn aggregate(records: &[InvocationRecord]) -> AggregateMetrics {
    let mut totals = RunTotals::default();
    let mut groups: BTreeMap<GroupKey, Vec<&InvocationRecord>> = BTreeMap::new();

    for record in records {
        totals.total_calls += 1;
        if record.is_success() {
            totals.successful_calls += 1;
            groups.entry(GroupKey::of(record)).or_default().push(record);
        } else {
            totals.errored_calls += 1;
            if record.api_call_status.is_throttled() {
                totals.throttled_calls += 1;
            }
        }
    }

    let mut performance = BTreeMap::new();
    let mut latency = BTreeMap::new();
    for (key, group) in groups {
        performance.insert(key.clone(), performance_for(&group));
        latency.insert(key, latency_for(&group));
    }

    AggregateMetrics {
        totals,
        performance,
        latency,
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

fn performance_for(group: &[&InvocationRecord]) -> PerformanceMetrics {
    let judged: Vec<bool> = group
        .iter()
        .filter_map(|record| record.judge_passed())
        .collect();
    let evaluation_success_rate = if judged.is_empty() {
        None
    } else {
        Some(judged.iter().filter(|passed| **passed).count() as f64 / judged.len() as f64)
    };

    let task_completion_rate = group
        .iter()
        .map(|record| record.task_completion)
        .sum::<f64>()
        / group.len() as f64;

    let costs: Vec<f64> = group.iter().filter_map(|record| record.response_cost).collect();
    let total_cost: f64 = costs.iter().sum();
    let avg_cost_per_response = mean(&costs);

    let input_samples: Vec<f64> = group
        .iter()
        .filter_map(|record| record.input_tokens)
        .map(f64::from)
        .collect();
    let output_samples: Vec<f64> = group
        .iter()
        .filter_map(|record| record.output_tokens)
        .map(f64::from)
        .collect();
    let avg_input_tokens = mean(&input_samples);
    let avg_output_tokens = mean(&output_samples);

    // Undefined ratios stay None instead of dividing by zero.
    let value_ratio = match (evaluation_success_rate, avg_cost_per_response) {
        (Some(rate), Some(avg)) if avg > 0.0 => Some(rate / avg),
        _ => None,
    };
    let cost_per_1000_tokens = match (avg_cost_per_response, avg_input_tokens, avg_output_tokens) {
        (Some(avg_cost), Some(avg_in), Some(avg_out)) if avg_in + avg_out > 0.0 => {
            Some(avg_cost / (avg_in + avg_out) * 1000.0)
        }
        _ => None,
    };

    PerformanceMetrics {
        sample_size: group.len(),
        evaluation_success_rate,
        task_completion_rate,
        total_cost,
        avg_cost_per_response,
        avg_input_tokens,
        avg_output_tokens,
        value_ratio,
        cost_per_1000_tokens,
    }
}

fn latency_for(group: &[&InvocationRecord]) -> LatencyMetrics {
    let ttfb: Vec<f64> = group
        .iter()
        .filter_map(|record| record.time_to_first_byte)
        .collect();
    let ttlb: Vec<f64> = group
        .iter()
        .filter_map(|record| record.time_to_last_byte)
        .collect();
    let otps: Vec<f64> = group
        .iter()
        .filter_map(|record| record.output_tokens_per_second())
        .collect();

    LatencyMetrics {
        sample_size: group.len(),
        time_to_first_byte: SummaryStats::from_samples(&ttfb),
        time_to_last_byte: SummaryStats::from_samples(&ttlb),
        output_tokens_per_second: SummaryStats::from_samples(&otps),
    }
}
