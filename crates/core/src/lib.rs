// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model for the LLM benchmark engine.
//!
//! This crate defines the immutable inputs of a benchmark run
//! ([`Scenario`], [`RunConfig`]) and its atomic output unit
//! ([`InvocationRecord`]). The execution engine produces records, the
//! aggregation layer consumes them; nothing in this crate performs I/O
//! beyond scenario loading.
//!
//! # Modules
//!
//! - [`scenario`] - Benchmark scenarios and JSONL scenario loading
//! - [`config`] - Run-wide configuration shared across scenarios
//! - [`record`] - Per-invocation result records and cost computation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod record;
pub mod scenario;

pub use config::RunConfig;
pub use record::{compute_cost, CallStatus, InvocationRecord, JudgeVerdict, THROTTLING_STATUS};
pub use scenario::{Scenario, ScenarioLoadError};
