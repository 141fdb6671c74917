// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fitness direction and comparison

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Whether lower or higher fitness is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Lower is better (errors, costs, runtimes)
    #[default]
    Minimize,
    /// Higher is better (scores, accuracy)
    Maximize,
}

impl Objective {
    /// Fitness assigned to individuals that could not be evaluated
    pub fn worst(&self) -> f64 {
        match self {
            Objective::Minimize => f64::INFINITY,
            Objective::Maximize => f64::NEG_INFINITY,
        }
    }

    /// `Greater` when `a` is better than `b`
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            Objective::Minimize => b.total_cmp(&a),
            Objective::Maximize => a.total_cmp(&b),
        }
    }

    /// Strictly better
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// `fitness` has reached `target`
    pub fn reached(&self, fitness: f64, target: f64) -> bool {
        match self {
            Objective::Minimize => fitness <= target,
            Objective::Maximize => fitness >= target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimize() {
        let objective = Objective::Minimize;
        assert!(objective.is_better(1.0, 2.0));
        assert!(!objective.is_better(2.0, 2.0));
        assert!(objective.is_better(1e300, objective.worst()));
        assert!(objective.reached(0.01, 0.05));
    }

    #[test]
    fn test_maximize() {
        let objective = Objective::Maximize;
        assert!(objective.is_better(3.0, 2.0));
        assert!(objective.is_better(-1e300, objective.worst()));
        assert!(!objective.reached(0.5, 0.9));
    }
}
