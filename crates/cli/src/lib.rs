// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for the LLM benchmark runner.
//!
//! This crate provides the command-line interface for executing
//! benchmark runs against inference endpoints and for re-aggregating
//! previously captured record files.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use llm_benchmark_client::{HttpClientConfig, HttpClientFactory, DEFAULT_MAX_RETRY_ATTEMPTS};
use llm_benchmark_core::config::{DEFAULT_JUDGE_MODEL, DEFAULT_JUDGE_REGION};
use llm_benchmark_core::{RunConfig, Scenario};
use llm_benchmark_engine::{io, report, ScenarioExecutor};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// LLM benchmark runner CLI.
#[derive(Parser, Debug)]
#[command(name = "llm-benchmark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a benchmark run over a JSONL scenario file.
    ///
    /// Writes, per experiment, into the output directory:
    /// - invocations.jsonl - One record per invocation
    /// - metrics.json - Aggregated metric tables
    /// - summary.md - Markdown summary
    Run(Box<RunArgs>),

    /// Re-aggregate a previously written invocation record file.
    Report {
        /// Path to an invocations.jsonl file.
        #[arg(short, long)]
        input: PathBuf,

        /// Directory to write metrics.json and summary.md into.
        #[arg(short, long, default_value = "benchmark-output")]
        output_dir: PathBuf,
    },
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the JSONL scenario file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory benchmark outputs are written into.
    #[arg(short, long, default_value = "benchmark-output")]
    pub output_dir: PathBuf,

    /// Maximum number of scenarios in flight at once.
    #[arg(long, default_value_t = 4)]
    pub parallel_calls: usize,

    /// How many times each scenario is invoked.
    #[arg(long, default_value_t = 5)]
    pub invocations_per_scenario: u32,

    /// Pause between invocations of one scenario, in seconds.
    #[arg(long, default_value_t = 60)]
    pub sleep_between_invocations: u64,

    /// How many times the whole experiment is repeated.
    #[arg(long, default_value_t = 1)]
    pub experiment_count: u32,

    /// Experiment label echoed on every record.
    #[arg(long, default_value = "Unnamed Experiment")]
    pub experiment_name: String,

    /// Sampling temperature for the models under test.
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f32,

    /// Nucleus sampling parameter for the models under test.
    #[arg(long, default_value_t = 1.0)]
    pub top_p: f32,

    /// Grade each successful response with a judge model.
    #[arg(long)]
    pub use_llm_judge: bool,

    /// Judge model identifier.
    #[arg(long, default_value = DEFAULT_JUDGE_MODEL)]
    pub judge_model: String,

    /// Region of the judge model endpoint.
    #[arg(long, default_value = DEFAULT_JUDGE_REGION)]
    pub judge_region: String,

    /// Inference endpoint URL template; `{region}` is substituted per
    /// scenario.
    #[arg(long, env = "LLM_BENCHMARK_ENDPOINT")]
    pub endpoint: String,

    /// Bearer token attached to every endpoint request.
    #[arg(long, env = "LLM_BENCHMARK_API_KEY")]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds, streaming included.
    #[arg(long, default_value_t = 300)]
    pub request_timeout: u64,
}

impl RunArgs {
    fn run_config(&self, experiment_name: String) -> RunConfig {
        RunConfig {
            invocations_per_scenario: self.invocations_per_scenario,
            sleep_between_invocations_secs: self.sleep_between_invocations,
            temperature: self.temperature,
            top_p: self.top_p,
            experiment_name,
            use_judge: self.use_llm_judge,
            judge_model_id: self.judge_model.clone(),
            judge_region: self.judge_region.clone(),
        }
    }

    fn client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            endpoint_template: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            request_timeout: Duration::from_secs(self.request_timeout),
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Run the CLI with the parsed arguments.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_benchmark(&args).await,
        Commands::Report { input, output_dir } => reaggregate(&input, &output_dir),
    }
}

async fn run_benchmark(args: &RunArgs) -> anyhow::Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("opening scenario file {}", args.input.display()))?;
    let scenarios =
        Scenario::load_jsonl(BufReader::new(file)).context("loading scenarios")?;
    info!(count = scenarios.len(), "loaded scenarios");

    let factory = Arc::new(HttpClientFactory::new(args.client_config()));

    for experiment in 1..=args.experiment_count.max(1) {
        let run_id = Uuid::new_v4();
        let experiment_name = if args.experiment_count > 1 {
            format!("{} #{experiment}", args.experiment_name)
        } else {
            args.experiment_name.clone()
        };
        let output_dir = if args.experiment_count > 1 {
            args.output_dir.join(format!("experiment-{experiment}"))
        } else {
            args.output_dir.clone()
        };
        info!(%run_id, experiment, name = %experiment_name, "starting experiment");

        let executor =
            ScenarioExecutor::new(factory.clone(), args.run_config(experiment_name));
        let report = executor
            .execute(scenarios.clone(), args.parallel_calls)
            .await
            .context("executing benchmark run")?;

        for error in &report.scenario_errors {
            warn!(model = %error.model_id, reason = %error.reason, "scenario skipped");
        }

        let metrics = io::write_all_outputs(&report.records, &output_dir)
            .with_context(|| format!("writing outputs to {}", output_dir.display()))?;

        println!(
            "Experiment {experiment}: {} invocations ({} successful, {} errored, {} throttled), {} scenarios skipped",
            metrics.totals.total_calls,
            metrics.totals.successful_calls,
            metrics.totals.errored_calls,
            metrics.totals.throttled_calls,
            report.scenario_errors.len(),
        );
        println!("Results written to {}", output_dir.display());
    }

    Ok(())
}

fn reaggregate(input: &PathBuf, output_dir: &PathBuf) -> anyhow::Result<()> {
    let records = io::read_records_jsonl(input)
        .with_context(|| format!("reading records from {}", input.display()))?;
    info!(count = records.len(), "loaded invocation records");

    let metrics = io::write_all_outputs(&records, output_dir)
        .with_context(|| format!("writing outputs to {}", output_dir.display()))?;

    print!("{}", report::generate_summary(&metrics));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults_match_run_config() {
        let cli = Cli::parse_from([
            "llm-benchmark",
            "run",
            "--input",
            "scenarios.jsonl",
            "--endpoint",
            "https://runtime.{region}.example.com",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        let config = args.run_config(args.experiment_name.clone());
        assert_eq!(config, RunConfig::default());
        assert_eq!(args.parallel_calls, 4);
        assert_eq!(args.experiment_count, 1);
    }

    #[test]
    fn test_judge_flags_flow_into_config() {
        let cli = Cli::parse_from([
            "llm-benchmark",
            "run",
            "--input",
            "scenarios.jsonl",
            "--endpoint",
            "https://runtime.{region}.example.com",
            "--use-llm-judge",
            "--judge-model",
            "judge.model-v2",
            "--judge-region",
            "eu-west-1",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        let config = args.run_config(args.experiment_name.clone());
        assert!(config.use_judge);
        assert_eq!(config.judge_model_id, "judge.model-v2");
        assert_eq!(config.judge_region, "eu-west-1");
    }
}
