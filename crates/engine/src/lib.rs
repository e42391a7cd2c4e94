// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark execution and evaluation engine.
//!
//! The engine fans scenarios out to a bounded worker pool, times each
//! streamed inference call, grades responses with a judge model, and
//! aggregates the resulting invocation records into per-group metric
//! tables.
//!
//! Control flow: [`executor::ScenarioExecutor`] dispatches scenarios
//! to workers, each worker repeatedly calls
//! [`runner::run_invocation`], which builds the request, streams it
//! through the inference client, and conditionally invokes the
//! [`judge::JudgeEvaluator`]. After all scenarios complete,
//! [`aggregate::aggregate`] consumes the full record set.
//!
//! # Modules
//!
//! - [`judge`] - LLM-as-judge evaluation and verdict parsing
//! - [`runner`] - Single timed invocation with telemetry capture
//! - [`executor`] - Concurrent scenario dispatch and result merging
//! - [`aggregate`] - Cross-run metric aggregation
//! - [`io`] - Record and metric persistence
//! - [`report`] - Markdown summary generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod executor;
pub mod io;
pub mod judge;
pub mod report;
pub mod runner;

pub use aggregate::{aggregate, AggregateMetrics, GroupKey, RunTotals};
pub use executor::{ExecutionReport, ExecutorError, ScenarioError, ScenarioExecutor};
pub use judge::{JudgeEvaluator, JudgmentResult};
pub use runner::run_invocation;
