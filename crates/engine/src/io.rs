// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! I/O operations for benchmark run outputs.
//!
//! This module provides functionality to persist invocation records
//! and aggregated metrics to the filesystem, and to read records back
//! for re-aggregation.

use crate::aggregate::{aggregate, AggregateMetrics};
use crate::report;
use llm_benchmark_core::InvocationRecord;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// File name for the per-invocation record log.
pub const RECORDS_FILE: &str = "invocations.jsonl";

/// File name for the aggregated metrics document.
pub const METRICS_FILE: &str = "metrics.json";

/// File name for the human-readable summary.
pub const SUMMARY_FILE: &str = "summary.md";

/// Ensure the output directory exists.
pub fn ensure_output_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Write invocation records as JSON Lines, one record per line.
pub fn write_records_jsonl(
    records: &[InvocationRecord],
    path: impl AsRef<Path>,
) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Read invocation records back from a JSON Lines file.
///
/// Blank lines are skipped; a malformed line is an error, since the
/// file is machine-written.
pub fn read_records_jsonl(path: impl AsRef<Path>) -> io::Result<Vec<InvocationRecord>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        records.push(record);
    }
    Ok(records)
}

/// Write aggregated metrics as pretty-printed JSON.
pub fn write_metrics_json(metrics: &AggregateMetrics, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(metrics)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Write all run outputs (records, metrics, summary) under `dir`.
///
/// Returns the aggregated metrics so callers can print the summary
/// without aggregating twice.
pub fn write_all_outputs(
    records: &[InvocationRecord],
    dir: impl AsRef<Path>,
) -> io::Result<AggregateMetrics> {
    let dir = dir.as_ref();
    ensure_output_dir(dir)?;

    write_records_jsonl(records, dir.join(RECORDS_FILE))?;

    let metrics = aggregate(records);
    write_metrics_json(&metrics, dir.join(METRICS_FILE))?;
    fs::write(dir.join(SUMMARY_FILE), report::generate_summary(&metrics))?;

    Ok(metrics)
}
