// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Individuals: one candidate program plus its evaluation state and lineage

use crate::fitness::Objective;
use crate::types::IndividualId;
use arbor_ast::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator that produced an individual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Seed,
    Crossover,
    Mutation,
    CrossoverMutation,
    Clone,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Seed => "seed",
            Operator::Crossover => "crossover",
            Operator::Mutation => "mutation",
            Operator::CrossoverMutation => "crossover+mutation",
            Operator::Clone => "clone",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub parents: Vec<IndividualId>,
    pub operator: Operator,
}

impl Lineage {
    pub fn seed() -> Self {
        Self {
            parents: Vec::new(),
            operator: Operator::Seed,
        }
    }

    pub fn from(operator: Operator, parents: Vec<IndividualId>) -> Self {
        Self { parents, operator }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationState {
    Pending,
    Scored(f64),
    /// Permanent failure; ranks with the objective's worst fitness
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub ast: Node,
    pub state: EvaluationState,
    /// Generation the individual was created in
    pub generation: u64,
    pub lineage: Lineage,
}

impl Individual {
    pub fn new(id: IndividualId, ast: Node, generation: u64, lineage: Lineage) -> Self {
        Self {
            id,
            ast,
            state: EvaluationState::Pending,
            generation,
            lineage,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, EvaluationState::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, EvaluationState::Failed(_))
    }

    /// Scored with a finite fitness
    pub fn is_viable(&self) -> bool {
        matches!(self.state, EvaluationState::Scored(f) if f.is_finite())
    }

    /// Fitness used for ranking; failed and pending individuals rank worst
    pub fn fitness(&self, objective: Objective) -> f64 {
        match self.state {
            EvaluationState::Scored(f) if f.is_finite() => f,
            _ => objective.worst(),
        }
    }

    pub fn score(&mut self, fitness: f64) {
        self.state = if fitness.is_finite() {
            EvaluationState::Scored(fitness)
        } else {
            EvaluationState::Failed(format!("non-finite fitness {}", fitness))
        };
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = EvaluationState::Failed(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_ranks_worst() {
        let mut individual = Individual::new(1, Node::int(0), 0, Lineage::seed());
        assert!(individual.is_pending());
        individual.fail("boom");
        assert!(individual.is_failed());
        assert_eq!(individual.fitness(Objective::Minimize), f64::INFINITY);
        assert_eq!(individual.fitness(Objective::Maximize), f64::NEG_INFINITY);
    }

    #[test]
    fn test_non_finite_score_is_failure() {
        let mut individual = Individual::new(1, Node::int(0), 0, Lineage::seed());
        individual.score(f64::NAN);
        assert!(individual.is_failed());
        assert!(!individual.is_viable());

        individual.score(0.5);
        assert!(individual.is_viable());
        assert_eq!(individual.fitness(Objective::Minimize), 0.5);
    }
}
