// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `arbor_configuration.toml`. Every section falls back to its defaults, so an
//! empty file is a complete configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArborConfig {
    pub run: RunConfig,
    pub population: PopulationConfig,
    pub operators: OperatorsConfig,
    pub language: LanguageConfig,
    pub dispatch: DispatchConfig,
    pub transport: TransportConfig,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

/// Run-level settings and stop conditions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Fixed RNG seed; unset draws one and logs it
    pub seed: Option<u64>,
    pub max_generations: Option<u64>,
    /// Best fitness at which the run stops early
    pub convergence_threshold: Option<f64>,
    /// Generations without improvement before the run stops
    pub stagnation_limit: Option<u64>,
    /// JSON-lines file receiving one summary per generation
    pub summary_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_generations: Some(50),
            convergence_threshold: None,
            stagnation_limit: None,
            summary_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub size: usize,
    /// Individuals carried unchanged into the next generation
    pub elitism: usize,
    /// Depth ceiling for ramped half-and-half initialization
    pub init_max_depth: usize,
    /// "minimize" or "maximize"
    pub objective: String,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 64,
            elitism: 1,
            init_max_depth: 6,
            objective: "minimize".to_string(),
        }
    }
}

/// Genetic operator rates and retry budgets
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OperatorsConfig {
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub crossover_attempts: usize,
    pub mutation_attempts: usize,
}

impl Default for OperatorsConfig {
    fn default() -> Self {
        Self {
            tournament_size: 3,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            crossover_attempts: 10,
            mutation_attempts: 10,
        }
    }
}

/// Extra callable exposed to generated programs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FunctionConfig {
    pub name: String,
    pub arity: u8,
}

/// Language profile selection and tree limits
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// "arithmetic" (expression programs) or "imperative" (statement programs)
    pub profile: String,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub variables: u16,
    pub functions: Vec<FunctionConfig>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            profile: "arithmetic".to_string(),
            max_depth: 8,
            max_nodes: 256,
            variables: 1,
            functions: Vec::new(),
        }
    }
}

/// Task dispatch deadlines, retries and execution budgets
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub task_timeout_ms: u64,
    pub max_retries: u32,
    pub max_in_flight: usize,
    pub poll_interval_ms: u64,
    pub time_budget_ms: u64,
    /// 0 = unlimited
    pub max_steps: u64,
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

/// Task queue endpoint shared by the coordinator and its workers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub address: String,
    /// Tasks held while no worker is ready (0 = unlimited)
    pub max_pending: usize,
    pub max_message_size: usize,
    pub heartbeat_interval_ms: u64,
    /// Missed heartbeats before a worker is considered dead
    pub heartbeat_liveness: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: "tcp://127.0.0.1:5557".to_string(),
            max_pending: 0,
            max_message_size: 16 * 1024 * 1024,
            heartbeat_interval_ms: 1000,
            heartbeat_liveness: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub poll_timeout_ms: u64,
    pub heartbeat_interval_ms: u64,
    /// Measurement weights; empty sums every measurement
    pub weights: BTreeMap<String, f64>,
    /// Penalty per AST node
    pub complexity_weight: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 100,
            heartbeat_interval_ms: 1000,
            weights: BTreeMap::new(),
            complexity_weight: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
    /// "text" or "json"
    pub format: String,
    /// Directory for daily-rotated log files; unset logs to the console only
    pub directory: Option<PathBuf>,
    /// Crates logged at debug level regardless of `level`
    pub debug_crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            directory: None,
            debug_crates: Vec::new(),
        }
    }
}
