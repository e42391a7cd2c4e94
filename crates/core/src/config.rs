// Copyright 2025 LLM Benchmark Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run-wide benchmark configuration.
//!
//! [`RunConfig`] carries the parameters shared by every scenario of a
//! run. It is built once by the caller and passed explicitly to the
//! executor and runner; there is no process-wide default state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of invocations per scenario.
pub const DEFAULT_INVOCATIONS_PER_SCENARIO: u32 = 5;

/// Default pause between invocations of the same scenario, in seconds.
pub const DEFAULT_SLEEP_BETWEEN_INVOCATIONS_SECS: u64 = 60;

/// Default judge model identifier.
pub const DEFAULT_JUDGE_MODEL: &str = "us.anthropic.claude-3-5-sonnet-20241022-v2:0";

/// Default region for the judge model.
pub const DEFAULT_JUDGE_REGION: &str = "us-west-2";

/// Parameters shared across all scenarios of a benchmark run.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// How many times each scenario is invoked.
    pub invocations_per_scenario: u32,
    /// Pause between invocations of one scenario, in seconds. This is
    /// a politeness policy toward endpoint rate limits, not a
    /// correctness requirement.
    pub sleep_between_invocations_secs: u64,
    /// Sampling temperature for the model under test.
    pub temperature: f32,
    /// Nucleus sampling parameter for the model under test.
    pub top_p: f32,
    /// Experiment label echoed on every invocation record.
    pub experiment_name: String,
    /// Whether to grade responses with the judge model.
    pub use_judge: bool,
    /// Judge model identifier.
    pub judge_model_id: String,
    /// Region of the judge model endpoint.
    pub judge_region: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            invocations_per_scenario: DEFAULT_INVOCATIONS_PER_SCENARIO,
            sleep_between_invocations_secs: DEFAULT_SLEEP_BETWEEN_INVOCATIONS_SECS,
            temperature: 1.0,
            top_p: 1.0,
            experiment_name: "Unnamed Experiment".to_string(),
            use_judge: false,
            judge_model_id: DEFAULT_JUDGE_MODEL.to_string(),
            judge_region: DEFAULT_JUDGE_REGION.to_string(),
        }
    }
}

impl RunConfig {
    /// The inter-invocation sleep as a [`Duration`].
    pub fn sleep_between_invocations(&self) -> Duration {
        Duration::from_secs(self.sleep_between_invocations_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_surface() {
        let config = RunConfig::default();
        assert_eq!(config.invocations_per_scenario, 5);
        assert_eq!(config.sleep_between_invocations_secs, 60);
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.top_p, 1.0);
        assert!(!config.use_judge);
        assert_eq!(config.judge_region, DEFAULT_JUDGE_REGION);
    }

    #[test]
    fn test_sleep_duration() {
        let config = RunConfig {
            sleep_between_invocations_secs: 3,
            ..RunConfig::default()
        };
        assert_eq!(config.sleep_between_invocations(), Duration::from_secs(3));
    }
}
