// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Evaluation seam between the population manager and whatever scores programs.

The distributed task dispatcher implements [`Evaluator`]; [`LocalEvaluator`]
scores in-process and is used for tests and single-machine runs.
*/

use crate::types::{EvoResult, IndividualId};
use arbor_ast::Node;
use async_trait::async_trait;
use std::collections::HashMap;

/// One program to score
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub id: IndividualId,
    pub ast: Node,
}

/// Terminal result for one request
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Scored(f64),
    /// Permanent failure with a human-readable reason
    Failed(String),
}

/// Scores a whole generation
///
/// Implementations return one outcome per request id. Ids missing from the
/// returned map are treated as permanently failed. A returned error aborts the
/// run.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        generation: u64,
        requests: Vec<EvaluationRequest>,
    ) -> EvoResult<HashMap<IndividualId, EvaluationOutcome>>;
}

/// In-process evaluator backed by a fitness closure
pub struct LocalEvaluator<F> {
    fitness: F,
}

impl<F> LocalEvaluator<F>
where
    F: Fn(&Node) -> Result<f64, String> + Send + Sync,
{
    pub fn new(fitness: F) -> Self {
        Self { fitness }
    }
}

#[async_trait]
impl<F> Evaluator for LocalEvaluator<F>
where
    F: Fn(&Node) -> Result<f64, String> + Send + Sync,
{
    async fn evaluate(
        &self,
        _generation: u64,
        requests: Vec<EvaluationRequest>,
    ) -> EvoResult<HashMap<IndividualId, EvaluationOutcome>> {
        Ok(requests
            .into_iter()
            .map(|request| {
                let outcome = match (self.fitness)(&request.ast) {
                    Ok(fitness) => EvaluationOutcome::Scored(fitness),
                    Err(reason) => EvaluationOutcome::Failed(reason),
                };
                (request.id, outcome)
            })
            .collect())
    }
}
