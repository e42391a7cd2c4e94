// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown output generation for aggregated run metrics.
//!
//! This module provides functionality to render the aggregated metric
//! tables as a markdown summary suitable for dropping into a report
//! or a pull request.

use crate::aggregate::{AggregateMetrics, SummaryStats};
use std::fmt::Write;

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "-".to_string(),
    }
}

fn fmt_rate(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.1}%", value * 100.0),
        None => "-".to_string(),
    }
}

fn fmt_stats(stats: Option<&SummaryStats>) -> String {
    match stats {
        Some(stats) => format!(
            "{:.3} / {:.3} / {:.3} / {:.3}",
            stats.mean, stats.p50, stats.p90, stats.std_dev
        ),
        None => "-".to_string(),
    }
}

/// Generate a markdown summary from aggregated run metrics.
pub fn generate_summary(metrics: &AggregateMetrics) -> String {
    let mut output = String::new();

    writeln!(output, "# Benchmark Run Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339()).unwrap();
    writeln!(output).unwrap();

    writeln!(output, "## Totals").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "- Total invocations: {}", metrics.totals.total_calls).unwrap();
    writeln!(output, "- Successful: {}", metrics.totals.successful_calls).unwrap();
    writeln!(output, "- Errored: {}", metrics.totals.errored_calls).unwrap();
    writeln!(output, "- Throttled: {}", metrics.totals.throttled_calls).unwrap();
    writeln!(output).unwrap();

    writeln!(output, "## Performance").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "| Model | Profile | Samples | Judge Pass Rate | Total Cost | Avg Cost | Avg In Tokens | Avg Out Tokens | Cost / 1k Tokens | Value Ratio |"
    )
    .unwrap();
    writeln!(
        output,
        "|-------|---------|---------|-----------------|------------|----------|---------------|----------------|------------------|-------------|"
    )
    .unwrap();
    for (key, performance) in &metrics.performance {
        writeln!(
            output,
            "| {} | {} | {} | {} | {:.6} | {} | {} | {} | {} | {} |",
            key.model,
            key.inference_profile,
            performance.sample_size,
            fmt_rate(performance.evaluation_success_rate),
            performance.total_cost,
            fmt_opt(performance.avg_cost_per_response, 6),
            fmt_opt(performance.avg_input_tokens, 1),
            fmt_opt(performance.avg_output_tokens, 1),
            fmt_opt(performance.cost_per_1000_tokens, 6),
            fmt_opt(performance.value_ratio, 3),
        )
        .unwrap();
    }
    writeln!(output).unwrap();

    writeln!(output, "## Latency (mean / p50 / p90 / std)").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "| Model | Profile | Samples | TTFB (s) | TTLB (s) | Output Tokens/s |"
    )
    .unwrap();
    writeln!(
        output,
        "|-------|---------|---------|----------|----------|-----------------|"
    )
    .unwrap();
    for (key, latency) in &metrics.latency {
        writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            key.model,
            key.inference_profile,
            latency.sample_size,
            fmt_stats(latency.time_to_first_byte.as_ref()),
            fmt_stats(latency.time_to_last_byte.as_ref()),
            fmt_stats(latency.output_tokens_per_second.as_ref()),
        )
        .unwrap();
    }

    output
}
