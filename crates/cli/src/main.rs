// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! LLM benchmark CLI entry point.

#[tokio::main]
async fn main() {
    llm_benchmark_cli::init_tracing();
    if let Err(e) = llm_benchmark_cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
