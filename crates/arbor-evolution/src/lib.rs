// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Arbor Evolution

Genetic search over program trees.

- [`PopulationManager`] - owns a generation, submits it for evaluation and
  breeds its successor
- [`operators`] - tree generation, tournament selection, crossover, mutation
- [`Evaluator`] - async seam to whatever scores programs (local closure or the
  distributed task dispatcher)
- [`EvolutionRun`] - drives generations until a [`StopCondition`] holds

All randomness of a run flows from one seeded generator in [`RunContext`], so
identical seeds and configuration reproduce identical summaries.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod context;
pub mod evaluator;
pub mod fitness;
pub mod individual;
pub mod operators;
pub mod population;
pub mod random;
pub mod run;
pub mod summary;
pub mod types;

pub use context::{EvolutionConfig, RunContext};
pub use evaluator::{EvaluationOutcome, EvaluationRequest, Evaluator, LocalEvaluator};
pub use fitness::Objective;
pub use individual::{EvaluationState, Individual, Lineage, Operator};
pub use population::{PopulationManager, SeedStrategy};
pub use run::{EvolutionRun, RunReport, StopCondition, StopReason};
pub use summary::{GenerationSummary, JsonLinesSummarySink, SummarySink, TracingSummarySink};
pub use types::{EvoError, EvoResult, IndividualId};
