// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dispatcher configuration

use crate::error::{DispatchError, DispatchResult};
use arbor_serialization::EvaluationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline for one send/await round trip
    pub task_timeout_ms: u64,
    /// Resends after a timeout; a task is sent at most `max_retries + 1` times
    pub max_retries: u32,
    /// Tasks awaiting a result at the same time
    pub max_in_flight: usize,
    /// Idle sleep of the result pump between empty polls
    pub poll_interval_ms: u64,
    /// Wall-clock budget workers enforce per execution
    pub time_budget_ms: u64,
    /// Interpreter step budget, 0 for unlimited
    pub max_steps: u64,
    /// Executions averaged per task
    pub repeats: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            task_timeout_ms: 5000,
            max_retries: 2,
            max_in_flight: 32,
            poll_interval_ms: 5,
            time_budget_ms: 1000,
            max_steps: 0,
            repeats: 1,
        }
    }
}

impl DispatchConfig {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.task_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Execution parameters for one send of a task
    pub fn evaluation_config(&self, generation: u64, attempt: u32) -> EvaluationConfig {
        EvaluationConfig {
            time_budget_ms: self.time_budget_ms,
            max_steps: self.max_steps,
            repeats: self.repeats.max(1),
            generation,
            attempt,
        }
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.task_timeout_ms == 0 {
            return Err(DispatchError::InvalidConfig(
                "task_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(DispatchError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(DispatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DispatchConfig::default().with_timeout_ms(0);
        assert!(matches!(
            config.validate(),
            Err(DispatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_evaluation_config_carries_attempt() {
        let config = DispatchConfig::default();
        let eval = config.evaluation_config(4, 2);
        assert_eq!(eval.generation, 4);
        assert_eq!(eval.attempt, 2);
        assert_eq!(eval.repeats, 1);
    }
}
