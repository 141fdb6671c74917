// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Boundary to the program runtime.

A runtime executes one program tree and reports named
measurements or an [`ExecutionFailure`]. Interpreting the tree is entirely the
runtime's business; the harness only enforces the budget and turns
measurements into a fitness.
*/

use arbor_ast::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Limits for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionBudget {
    pub time_budget: Duration,
    /// Interpreter steps, 0 for unlimited
    pub max_steps: u64,
}

/// Named measurements from one execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    values: BTreeMap<String, f64>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single unnamed measurement
    pub fn single(value: f64) -> Self {
        Self::new().with(Self::DEFAULT_METRIC, value)
    }

    pub const DEFAULT_METRIC: &'static str = "fitness";

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Step limit of {limit} exceeded")]
    StepLimit { limit: u64 },

    #[error("Execution took {elapsed_ms}ms, budget is {budget_ms}ms")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },

    #[error("Program not supported by this runtime: {0}")]
    Unsupported(String),
}

/// Executes program trees
pub trait Runtime: Send + Sync {
    fn execute(&self, program: &Node, budget: &ExecutionBudget) -> Result<Measurements, ExecutionFailure>;
}

/// Runtime backed by a closure
pub struct FnRuntime<F> {
    execute: F,
}

impl<F> FnRuntime<F>
where
    F: Fn(&Node, &ExecutionBudget) -> Result<Measurements, ExecutionFailure> + Send + Sync,
{
    pub fn new(execute: F) -> Self {
        Self { execute }
    }
}

impl<F> Runtime for FnRuntime<F>
where
    F: Fn(&Node, &ExecutionBudget) -> Result<Measurements, ExecutionFailure> + Send + Sync,
{
    fn execute(&self, program: &Node, budget: &ExecutionBudget) -> Result<Measurements, ExecutionFailure> {
        (self.execute)(program, budget)
    }
}
