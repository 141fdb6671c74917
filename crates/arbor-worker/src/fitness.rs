// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Combining measurements into one fitness scalar

use crate::runtime::Measurements;
use arbor_ast::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weighted sum over named measurements plus an optional size penalty
///
/// With no weights configured every measurement counts with weight 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessAggregator {
    pub weights: BTreeMap<String, f64>,
    /// Multiplied by the program's node count and added to the sum
    pub complexity_weight: f64,
}

impl FitnessAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weight(mut self, metric: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(metric.into(), weight);
        self
    }

    pub fn with_complexity_weight(mut self, weight: f64) -> Self {
        self.complexity_weight = weight;
        self
    }

    pub fn aggregate(&self, measurements: &Measurements, program: &Node) -> Result<f64, String> {
        if measurements.is_empty() {
            return Err("runtime reported no measurements".to_string());
        }

        let mut total: f64 = if self.weights.is_empty() {
            measurements.iter().map(|(_, value)| value).sum()
        } else {
            let mut sum = 0.0;
            for (metric, weight) in &self.weights {
                let value = measurements
                    .get(metric)
                    .ok_or_else(|| format!("missing measurement '{}'", metric))?;
                sum += weight * value;
            }
            sum
        };
        if self.complexity_weight != 0.0 {
            total += self.complexity_weight * program.node_count() as f64;
        }

        if total.is_finite() {
            Ok(total)
        } else {
            Err(format!("fitness is not finite ({})", total))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_ast::BinaryOp;

    #[test]
    fn test_unweighted_sums_everything() {
        let aggregator = FitnessAggregator::new();
        let m = Measurements::new().with("error", 2.0).with("runtime", 0.5);
        assert_eq!(aggregator.aggregate(&m, &Node::int(1)), Ok(2.5));
    }

    #[test]
    fn test_weighted_sum_with_complexity() {
        let aggregator = FitnessAggregator::new()
            .with_weight("error", 1.0)
            .with_weight("runtime", 0.1)
            .with_complexity_weight(0.01);
        let program = Node::binary(BinaryOp::Add, Node::var(0), Node::int(1));
        let m = Measurements::new()
            .with("error", 2.0)
            .with("runtime", 10.0)
            .with("ignored", 1000.0);
        let fitness = aggregator.aggregate(&m, &program).unwrap();
        assert!((fitness - 3.03).abs() < 1e-9);
    }

    #[test]
    fn test_missing_metric_fails() {
        let aggregator = FitnessAggregator::new().with_weight("error", 1.0);
        let m = Measurements::single(1.0);
        assert!(aggregator.aggregate(&m, &Node::int(0)).is_err());
        assert!(aggregator.aggregate(&Measurements::new(), &Node::int(0)).is_err());
    }

    #[test]
    fn test_non_finite_fails() {
        let aggregator = FitnessAggregator::new();
        let m = Measurements::single(f64::NAN);
        assert!(aggregator.aggregate(&m, &Node::int(0)).is_err());
    }
}
