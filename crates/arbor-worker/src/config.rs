// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Worker configuration

use crate::error::{WorkerError, WorkerResult};
use crate::fitness::FitnessAggregator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Longest single wait for a frame; bounds how fast a stop request is seen
    pub poll_timeout_ms: u64,
    /// Idle time between heartbeats
    pub heartbeat_interval_ms: u64,
    pub fitness: FitnessAggregator,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 100,
            heartbeat_interval_ms: 1000,
            fitness: FitnessAggregator::default(),
        }
    }
}

impl WorkerConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.poll_timeout_ms == 0 {
            return Err(WorkerError::InvalidConfig(
                "poll_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(WorkerError::InvalidConfig(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
