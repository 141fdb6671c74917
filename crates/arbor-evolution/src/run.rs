// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Run driver: evaluates and advances generations until a stop condition holds.
*/

use crate::evaluator::Evaluator;
use crate::individual::Individual;
use crate::population::PopulationManager;
use crate::summary::GenerationSummary;
use crate::types::{EvoError, EvoResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// When a run ends; at least one field must be set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopCondition {
    /// Number of generations to evaluate
    pub max_generations: Option<u64>,
    /// Best fitness at which the run has converged
    pub target_fitness: Option<f64>,
    /// Generations without improvement of the best-ever fitness
    pub stagnation_limit: Option<u64>,
}

impl StopCondition {
    pub fn generations(max_generations: u64) -> Self {
        Self {
            max_generations: Some(max_generations),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target_fitness = Some(target);
        self
    }

    pub fn with_stagnation_limit(mut self, limit: u64) -> Self {
        self.stagnation_limit = Some(limit);
        self
    }

    /// At least one condition is configured
    pub fn is_set(&self) -> bool {
        self.max_generations.is_some()
            || self.target_fitness.is_some()
            || self.stagnation_limit.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    GenerationLimit,
    TargetReached,
    Stagnation,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::GenerationLimit => write!(f, "generation limit reached"),
            StopReason::TargetReached => write!(f, "target fitness reached"),
            StopReason::Stagnation => write!(f, "no improvement within stagnation limit"),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summaries: Vec<GenerationSummary>,
    pub best: Option<Individual>,
    pub stop_reason: StopReason,
    /// Generations evaluated
    pub generations: u64,
    /// Seed of the run generator
    pub seed: u64,
}

/// Drives a [`PopulationManager`] with an [`Evaluator`]
pub struct EvolutionRun {
    manager: PopulationManager,
    evaluator: Arc<dyn Evaluator>,
    stop: StopCondition,
}

impl EvolutionRun {
    pub fn new(
        manager: PopulationManager,
        evaluator: Arc<dyn Evaluator>,
        stop: StopCondition,
    ) -> EvoResult<Self> {
        if !stop.is_set() {
            return Err(EvoError::InvalidConfig(
                "a run needs max_generations, target_fitness or stagnation_limit".to_string(),
            ));
        }
        if manager.is_empty() {
            return Err(EvoError::InvalidConfig(
                "population must be initialized before the run starts".to_string(),
            ));
        }
        Ok(Self {
            manager,
            evaluator,
            stop,
        })
    }

    pub fn manager(&self) -> &PopulationManager {
        &self.manager
    }

    /// Run to completion
    ///
    /// Fatal errors (exhausted population, aborted or failed evaluation)
    /// propagate and name the generation they occurred in.
    pub async fn run(mut self) -> EvoResult<RunReport> {
        let objective = self.manager.config().objective;
        let mut generations = 0u64;
        let mut best_so_far: Option<f64> = None;
        let mut stagnant = 0u64;

        let stop_reason = loop {
            self.manager
                .evaluate_generation(self.evaluator.as_ref())
                .await?;
            let summary = self.manager.advance()?;
            generations += 1;

            if let Some(best) = summary.best_fitness {
                match best_so_far {
                    Some(previous) if !objective.is_better(best, previous) => stagnant += 1,
                    _ => {
                        best_so_far = Some(best);
                        stagnant = 0;
                    }
                }
            }

            if let (Some(target), Some(best)) = (self.stop.target_fitness, summary.best_fitness) {
                if objective.reached(best, target) {
                    break StopReason::TargetReached;
                }
            }
            if let Some(limit) = self.stop.stagnation_limit {
                if stagnant >= limit {
                    break StopReason::Stagnation;
                }
            }
            if let Some(max) = self.stop.max_generations {
                if generations >= max {
                    break StopReason::GenerationLimit;
                }
            }
        };

        info!(
            target: "arbor-evolution",
            "🧬 [EVOLUTION] Run finished after {} generations: {}",
            generations,
            stop_reason
        );

        Ok(RunReport {
            summaries: self.manager.history().to_vec(),
            best: self.manager.best_ever().cloned(),
            stop_reason,
            generations,
            seed: self.manager.seed(),
        })
    }
}
