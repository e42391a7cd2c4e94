// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Concurrent scenario executor.
//!
//! Spawns one task per scenario and bounds in-flight work with a
//! semaphore sized to the worker count. Each task owns a private
//! record buffer; the orchestrator is the only merge point, so no
//! record is shared across tasks while a run is in flight.

use llm_benchmark_client::ClientFactory;
use llm_benchmark_core::{InvocationRecord, RunConfig, Scenario};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::judge::JudgeEvaluator;
use crate::runner::run_invocation;

/// Errors that abort a run before any scenario is dispatched.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The scenario list was empty.
    #[error("no scenarios to execute")]
    NoScenarios,
}

/// A scenario that could not be dispatched at all.
///
/// Distinct from an errored invocation record: a record means the call
/// was attempted and failed, a scenario error means the scenario's own
/// data made the attempt impossible.
#[derive(Debug, Clone)]
pub struct ScenarioError {
    /// Model the scenario targeted.
    pub model_id: String,
    /// Why the scenario was skipped.
    pub reason: String,
}

/// Output of one execution run.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// One record per attempted invocation, in completion order.
    pub records: Vec<InvocationRecord>,
    /// Scenarios skipped before any invocation was attempted.
    pub scenario_errors: Vec<ScenarioError>,
}

/// Dispatches scenarios across a bounded worker pool.
pub struct ScenarioExecutor {
    factory: Arc<dyn ClientFactory>,
    config: RunConfig,
}

impl ScenarioExecutor {
    /// Create an executor with the given client factory and run
    /// settings.
    pub fn new(factory: Arc<dyn ClientFactory>, config: RunConfig) -> Self {
        Self { factory, config }
    }

    /// Execute all scenarios with at most `worker_count` in flight.
    ///
    /// Invocations within one scenario run sequentially, with the
    /// configured sleep between repeats (but not after the last).
    /// Returns [`ExecutorError::NoScenarios`] for an empty list; a
    /// `worker_count` of zero is clamped to one.
    pub async fn execute(
        &self,
        scenarios: Vec<Scenario>,
        worker_count: usize,
    ) -> Result<ExecutionReport, ExecutorError> {
        if scenarios.is_empty() {
            return Err(ExecutorError::NoScenarios);
        }
        let permits = worker_count.max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        info!(
            scenarios = scenarios.len(),
            workers = permits,
            invocations_per_scenario = self.config.invocations_per_scenario,
            "starting benchmark run"
        );

        let mut report = ExecutionReport::default();
        let mut join_set: JoinSet<Result<Vec<InvocationRecord>, ScenarioError>> = JoinSet::new();
        let mut model_by_task: HashMap<tokio::task::Id, String> = HashMap::new();

        for scenario in scenarios {
            if let Err(reason) = scenario.validate() {
                warn!(model = %scenario.model_id, %reason, "skipping invalid scenario");
                report.scenario_errors.push(ScenarioError {
                    model_id: scenario.model_id.clone(),
                    reason,
                });
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let factory = Arc::clone(&self.factory);
            let config = self.config.clone();
            let model_id = scenario.model_id.clone();
            let handle = join_set.spawn(async move {
                // Closed only on shutdown, which cannot happen while
                // the owning JoinSet is still draining.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|err| ScenarioError {
                        model_id: scenario.model_id.clone(),
                        reason: err.to_string(),
                    })?;
                run_scenario(factory.as_ref(), &config, &scenario).await
            });
            model_by_task.insert(handle.id(), model_id);
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(records)) => report.records.extend(records),
                Ok(Err(scenario_error)) => {
                    warn!(
                        model = %scenario_error.model_id,
                        reason = %scenario_error.reason,
                        "scenario failed to dispatch"
                    );
                    report.scenario_errors.push(scenario_error);
                }
                Err(join_error) => {
                    let model_id = model_by_task
                        .get(&join_error.id())
                        .cloned()
                        .unwrap_or_default();
                    warn!(model = %model_id, error = %join_error, "scenario task aborted");
                    report.scenario_errors.push(ScenarioError {
                        model_id,
                        reason: join_error.to_string(),
                    });
                }
            }
        }

        info!(
            records = report.records.len(),
            skipped = report.scenario_errors.len(),
            "benchmark run complete"
        );
        Ok(report)
    }
}

async fn run_scenario(
    factory: &dyn ClientFactory,
    config: &RunConfig,
    scenario: &Scenario,
) -> Result<Vec<InvocationRecord>, ScenarioError> {
    let client = factory
        .client_for_region(&scenario.region)
        .map_err(|err| ScenarioError {
            model_id: scenario.model_id.clone(),
            reason: err.to_string(),
        })?;

    let judge = if config.use_judge {
        let judge_client = factory
            .client_for_region(&config.judge_region)
            .map_err(|err| ScenarioError {
                model_id: scenario.model_id.clone(),
                reason: format!("judge client unavailable: {err}"),
            })?;
        Some(JudgeEvaluator::new(judge_client, config.judge_model_id.clone()))
    } else {
        None
    };

    let mut records = Vec::with_capacity(config.invocations_per_scenario as usize);
    for invocation_id in 0..config.invocations_per_scenario {
        if invocation_id > 0 {
            tokio::time::sleep(config.sleep_between_invocations()).await;
        }
        let record = run_invocation(
            client.as_ref(),
            judge.as_ref(),
            scenario,
            config,
            invocation_id,
        )
        .await;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use llm_benchmark_client::{
        ClientError, ConverseOutput, ConverseRequest, EventStream, InferenceClient,
        Result as ClientResult, StreamEvent, TokenUsage,
    };
    use llm_benchmark_core::scenario::Task;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scenario(model_id: &str, region: &str) -> Scenario {
        Scenario {
            prompt: "summarize this".to_string(),
            task: Task {
                task_type: "summarization".to_string(),
                task_criteria: "covers key points".to_string(),
            },
            golden_answer: "a summary".to_string(),
            model_id: model_id.to_string(),
            region: region.to_string(),
            inference_profile: "standard".to_string(),
            input_token_cost: 0.001,
            output_token_cost: 0.002,
            expected_output_tokens: 50,
        }
    }

    fn fast_config(invocations: u32) -> RunConfig {
        RunConfig {
            invocations_per_scenario: invocations,
            sleep_between_invocations_secs: 0,
            ..RunConfig::default()
        }
    }

    /// Counts concurrent streaming calls and reports the peak.
    struct CountingClient {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InferenceClient for CountingClient {
        async fn converse(&self, _request: &ConverseRequest) -> ClientResult<ConverseOutput> {
            Ok(ConverseOutput {
                text: "PASS fine".to_string(),
                usage: None,
            })
        }

        async fn converse_stream(&self, _request: &ConverseRequest) -> ClientResult<EventStream> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let events: Vec<ClientResult<StreamEvent>> = vec![
                Ok(StreamEvent::ContentDelta {
                    text: "ok".to_string(),
                }),
                Ok(StreamEvent::MessageStop {
                    stop_reason: "end_turn".to_string(),
                }),
                Ok(StreamEvent::Metadata {
                    usage: TokenUsage {
                        input_tokens: 5,
                        output_tokens: 5,
                    },
                }),
            ];
            Ok(futures::stream::iter(events).boxed())
        }
    }

    /// Panics on every streaming call, aborting the owning task.
    struct PanickingClient;

    #[async_trait]
    impl InferenceClient for PanickingClient {
        async fn converse(&self, _request: &ConverseRequest) -> ClientResult<ConverseOutput> {
            panic!("converse called on panicking client");
        }

        async fn converse_stream(&self, _request: &ConverseRequest) -> ClientResult<EventStream> {
            panic!("stream exploded");
        }
    }

    struct CountingFactory {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        rejected_region: Option<String>,
        panicking_region: Option<String>,
    }

    impl ClientFactory for CountingFactory {
        fn client_for_region(&self, region: &str) -> ClientResult<Arc<dyn InferenceClient>> {
            if self.rejected_region.as_deref() == Some(region) {
                return Err(ClientError::Configuration(format!(
                    "no endpoint for region {region}"
                )));
            }
            if self.panicking_region.as_deref() == Some(region) {
                return Ok(Arc::new(PanickingClient));
            }
            Ok(Arc::new(CountingClient {
                in_flight: Arc::clone(&self.in_flight),
                peak: Arc::clone(&self.peak),
            }))
        }
    }

    fn counting_factory() -> (Arc<CountingFactory>, Arc<AtomicUsize>) {
        let peak = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
            rejected_region: None,
            panicking_region: None,
        });
        (factory, peak)
    }

    #[tokio::test]
    async fn test_empty_scenario_list_is_rejected() {
        let (factory, _) = counting_factory();
        let executor = ScenarioExecutor::new(factory, fast_config(1));
        let err = executor.execute(Vec::new(), 4).await.unwrap_err();
        assert!(matches!(err, ExecutorError::NoScenarios));
    }

    #[tokio::test]
    async fn test_all_invocations_complete() {
        let (factory, _) = counting_factory();
        let executor = ScenarioExecutor::new(factory, fast_config(3));
        let scenarios = vec![
            scenario("model-a", "us-east-1"),
            scenario("model-b", "us-west-2"),
        ];
        let report = executor.execute(scenarios, 4).await.unwrap();
        assert_eq!(report.records.len(), 6);
        assert!(report.scenario_errors.is_empty());
        assert!(report.records.iter().all(|record| record.is_success()));
        let ids: Vec<u32> = report
            .records
            .iter()
            .filter(|record| record.model == "model-a")
            .map(|record| record.invocation_id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_worker_count_bounds_concurrency() {
        let (factory, peak) = counting_factory();
        let executor = ScenarioExecutor::new(factory, fast_config(1));
        let scenarios: Vec<Scenario> = (0..8)
            .map(|i| scenario(&format!("model-{i}"), "us-east-1"))
            .collect();
        let report = executor.execute(scenarios, 2).await.unwrap();
        assert_eq!(report.records.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_invalid_scenario_becomes_scenario_error() {
        let (factory, _) = counting_factory();
        let executor = ScenarioExecutor::new(factory, fast_config(1));
        let mut bad = scenario("model-a", "us-east-1");
        bad.prompt = String::new();
        let report = executor
            .execute(vec![bad, scenario("model-b", "us-east-1")], 4)
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.scenario_errors.len(), 1);
        assert_eq!(report.scenario_errors[0].model_id, "model-a");
    }

    #[tokio::test]
    async fn test_unreachable_region_is_reported_not_fatal() {
        let peak = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak,
            rejected_region: Some("eu-central-1".to_string()),
            panicking_region: None,
        });
        let executor = ScenarioExecutor::new(factory, fast_config(1));
        let report = executor
            .execute(
                vec![
                    scenario("model-a", "eu-central-1"),
                    scenario("model-b", "us-east-1"),
                ],
                4,
            )
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].model, "model-b");
        assert_eq!(report.scenario_errors.len(), 1);
        assert!(report.scenario_errors[0]
            .reason
            .contains("eu-central-1"));
    }

    #[tokio::test]
    async fn test_aborted_scenario_task_keeps_model_attribution() {
        let factory = Arc::new(CountingFactory {
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            rejected_region: None,
            panicking_region: Some("ap-south-1".to_string()),
        });
        let executor = ScenarioExecutor::new(factory, fast_config(1));
        let report = executor
            .execute(
                vec![
                    scenario("model-a", "ap-south-1"),
                    scenario("model-b", "us-east-1"),
                ],
                4,
            )
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].model, "model-b");
        assert_eq!(report.scenario_errors.len(), 1);
        assert_eq!(report.scenario_errors[0].model_id, "model-a");
        assert!(report.scenario_errors[0].reason.contains("panicked"));
    }
}
