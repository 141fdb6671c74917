// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Population manager.

Owns one generation of individuals together with the run context, submits
pending individuals for evaluation, and breeds the next generation once every
individual has a terminal evaluation state.
*/

use crate::context::{EvolutionConfig, RunContext};
use crate::evaluator::{EvaluationOutcome, EvaluationRequest, Evaluator};
use crate::individual::{Individual, Lineage, Operator};
use crate::operators::{crossover, mutate, rank, ramped_half_and_half, tournament};
use crate::random::chance;
use crate::summary::{GenerationSummary, SummarySink};
use crate::types::{EvoError, EvoResult, IndividualId};
use arbor_ast::Node;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How generation 0 is populated
#[derive(Debug, Clone, PartialEq)]
pub enum SeedStrategy {
    /// Ramped half-and-half over the language profile
    Random,
    /// Front-end supplied programs, topped up with mutated copies
    Import(Vec<Node>),
}

pub struct PopulationManager {
    context: RunContext,
    population: BTreeMap<IndividualId, Individual>,
    history: Vec<GenerationSummary>,
    best_ever: Option<Individual>,
    sinks: Vec<Box<dyn SummarySink>>,
}

impl std::fmt::Debug for PopulationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationManager")
            .field("generation", &self.context.generation)
            .field("population", &self.population.len())
            .field("history", &self.history.len())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl PopulationManager {
    pub fn new(config: EvolutionConfig) -> EvoResult<Self> {
        let context = RunContext::new(config)?;
        info!(
            target: "arbor-evolution",
            "🧬 [EVOLUTION] Run context ready (seed={}, profile={})",
            context.seed,
            context.config.profile.name
        );
        Ok(Self {
            context,
            population: BTreeMap::new(),
            history: Vec::new(),
            best_ever: None,
            sinks: Vec::new(),
        })
    }

    pub fn add_sink(&mut self, sink: Box<dyn SummarySink>) {
        self.sinks.push(sink);
    }

    //region Accessors

    pub fn generation(&self) -> u64 {
        self.context.generation
    }

    pub fn seed(&self) -> u64 {
        self.context.seed
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.context.config
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.population.values()
    }

    pub fn get(&self, id: IndividualId) -> Option<&Individual> {
        self.population.get(&id)
    }

    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Best individual scored so far across all generations
    pub fn best_ever(&self) -> Option<&Individual> {
        self.best_ever.as_ref()
    }

    pub fn pending_count(&self) -> usize {
        self.population.values().filter(|i| i.is_pending()).count()
    }

    //endregion

    /// Create generation 0 with exactly `size` individuals
    pub fn initialize(&mut self, size: usize, strategy: SeedStrategy) -> EvoResult<()> {
        let mut config = self.context.config.clone();
        config.population_size = size;
        config.validate()?;
        self.context.config = config;

        self.population.clear();
        self.history.clear();
        self.best_ever = None;
        self.context.generation = 0;

        match strategy {
            SeedStrategy::Random => {
                let trees = ramped_half_and_half(
                    &mut self.context.rng,
                    &self.context.config.profile,
                    size,
                    self.context.config.init_max_depth,
                );
                for tree in trees {
                    self.insert_new(tree, Lineage::seed());
                }
            }
            SeedStrategy::Import(seeds) => self.import(size, seeds)?,
        }

        info!(
            target: "arbor-evolution",
            "🧬 [EVOLUTION] Generation 0 initialized with {} individuals",
            self.population.len()
        );
        Ok(())
    }

    fn import(&mut self, size: usize, seeds: Vec<Node>) -> EvoResult<()> {
        if seeds.is_empty() {
            return Err(EvoError::NoSeeds);
        }
        for (index, seed) in seeds.iter().enumerate() {
            self.context
                .config
                .profile
                .validate(seed)
                .map_err(|source| EvoError::InvalidSeed { index, source })?;
        }
        if seeds.len() > size {
            warn!(
                target: "arbor-evolution",
                "Received {} seed programs for a population of {}; keeping the first {}",
                seeds.len(),
                size,
                size
            );
        }

        let mut seed_ids = Vec::new();
        for seed in seeds.into_iter().take(size) {
            seed_ids.push(self.insert_new(seed, Lineage::seed()));
        }

        // Top up with mutated copies, cycling through the seeds
        let mut cursor = 0;
        while self.population.len() < size {
            let parent_id = seed_ids[cursor % seed_ids.len()];
            cursor += 1;
            let Some(parent) = self.population.get(&parent_id) else {
                continue;
            };
            let parent_ast = parent.ast.clone();
            let (ast, operator) = match self.mutate_tree(&parent_ast) {
                Some(child) => (child, Operator::Mutation),
                None => (parent_ast, Operator::Clone),
            };
            self.insert_new(ast, Lineage::from(operator, vec![parent_id]));
        }
        Ok(())
    }

    fn insert_new(&mut self, ast: Node, lineage: Lineage) -> IndividualId {
        let id = self.context.next_id();
        let individual = Individual::new(id, ast, self.context.generation, lineage);
        self.population.insert(id, individual);
        id
    }

    fn mutate_tree(&mut self, tree: &Node) -> Option<Node> {
        let config = &self.context.config;
        mutate(
            &mut self.context.rng,
            tree,
            &config.profile,
            config.init_max_depth,
            config.mutation_attempts,
        )
        .map(|outcome| outcome.child)
    }

    /// Score every pending individual through `evaluator`
    ///
    /// Returns once every individual is scored or permanently failed. Ids the
    /// evaluator does not report on are marked failed.
    pub async fn evaluate_generation(&mut self, evaluator: &dyn Evaluator) -> EvoResult<()> {
        let generation = self.context.generation;
        let requests: Vec<EvaluationRequest> = self
            .population
            .values()
            .filter(|i| i.is_pending())
            .map(|i| EvaluationRequest {
                id: i.id,
                ast: i.ast.clone(),
            })
            .collect();

        debug!(
            target: "arbor-evolution",
            "Submitting {} of {} individuals of generation {}",
            requests.len(),
            self.population.len(),
            generation
        );

        let mut outcomes = if requests.is_empty() {
            Default::default()
        } else {
            evaluator.evaluate(generation, requests).await?
        };

        for individual in self.population.values_mut().filter(|i| i.is_pending()) {
            match outcomes.remove(&individual.id) {
                Some(EvaluationOutcome::Scored(fitness)) => individual.score(fitness),
                Some(EvaluationOutcome::Failed(reason)) => individual.fail(reason),
                None => individual.fail("no evaluation outcome reported"),
            }
        }
        if !outcomes.is_empty() {
            debug!(
                target: "arbor-evolution",
                "Ignored {} outcomes for unknown individuals",
                outcomes.len()
            );
        }

        self.update_best_ever();
        Ok(())
    }

    fn update_best_ever(&mut self) {
        let objective = self.context.config.objective;
        let mut viable: Vec<&Individual> =
            self.population.values().filter(|i| i.is_viable()).collect();
        rank(objective, &mut viable);
        let Some(best) = viable.first() else {
            return;
        };
        let improved = match &self.best_ever {
            Some(current) => objective.is_better(best.fitness(objective), current.fitness(objective)),
            None => true,
        };
        if improved {
            self.best_ever = Some((*best).clone());
        }
    }

    /// Statistics of the current generation
    pub fn summarize(&self) -> GenerationSummary {
        let objective = self.context.config.objective;
        let mut viable: Vec<&Individual> =
            self.population.values().filter(|i| i.is_viable()).collect();
        rank(objective, &mut viable);

        let fitness: Vec<f64> = viable.iter().map(|i| i.fitness(objective)).collect();
        let mean_fitness = if fitness.is_empty() {
            None
        } else {
            Some(fitness.iter().sum::<f64>() / fitness.len() as f64)
        };
        let size = self.population.len();
        let total_nodes: usize = self.population.values().map(|i| i.ast.node_count()).sum();

        GenerationSummary {
            generation: self.context.generation,
            population_size: size,
            evaluated: self.population.values().filter(|i| !i.is_pending()).count(),
            failed_count: self.population.values().filter(|i| i.is_failed()).count(),
            best_fitness: fitness.first().copied(),
            mean_fitness,
            worst_fitness: fitness.last().copied(),
            best_individual: viable.first().map(|i| i.id),
            best_program: viable.first().map(|i| i.ast.to_string()),
            mean_nodes: if size == 0 {
                0.0
            } else {
                total_nodes as f64 / size as f64
            },
        }
    }

    /// Close the current generation and breed its successor
    ///
    /// Refuses to run while any individual is still pending. Returns the
    /// summary of the generation that was closed.
    pub fn advance(&mut self) -> EvoResult<GenerationSummary> {
        let generation = self.context.generation;
        let pending = self.pending_count();
        if pending > 0 {
            return Err(EvoError::GenerationIncomplete {
                generation,
                pending,
            });
        }

        let objective = self.context.config.objective;
        let viable_count = self.population.values().filter(|i| i.is_viable()).count();
        if viable_count < 2 {
            return Err(EvoError::PopulationExhausted {
                generation,
                viable: viable_count,
            });
        }

        let summary = self.summarize();
        self.history.push(summary.clone());
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.record(&summary) {
                warn!(target: "arbor-evolution", "Summary sink failed: {}", e);
            }
        }

        let next = self.breed()?;
        self.population = next;
        self.context.generation += 1;

        debug!(
            target: "arbor-evolution",
            "Advanced to generation {} (best so far: {:?})",
            self.context.generation,
            self.best_ever.as_ref().map(|i| i.fitness(objective))
        );
        Ok(summary)
    }

    fn breed(&mut self) -> EvoResult<BTreeMap<IndividualId, Individual>> {
        let config = self.context.config.clone();
        let objective = config.objective;
        let next_generation = self.context.generation + 1;

        let mut viable: Vec<&Individual> =
            self.population.values().filter(|i| i.is_viable()).collect();
        rank(objective, &mut viable);

        let mut next = BTreeMap::new();
        for elite in viable.iter().take(config.elitism) {
            next.insert(elite.id, (*elite).clone());
        }

        while next.len() < config.population_size {
            let rng = &mut self.context.rng;
            let Some(first) = tournament(rng, &viable, config.tournament_size, objective) else {
                return Err(EvoError::PopulationExhausted {
                    generation: self.context.generation,
                    viable: 0,
                });
            };

            let (mut ast, mut operator, mut parents) = if chance(rng, config.crossover_rate) {
                match tournament(rng, &viable, config.tournament_size, objective) {
                    Some(second) => {
                        let outcome = crossover(
                            rng,
                            &first.ast,
                            &second.ast,
                            &config.profile.limits,
                            config.crossover_attempts,
                        );
                        if outcome.fallback {
                            (outcome.child, Operator::Clone, vec![first.id])
                        } else {
                            (outcome.child, Operator::Crossover, vec![first.id, second.id])
                        }
                    }
                    None => (first.ast.clone(), Operator::Clone, vec![first.id]),
                }
            } else {
                (first.ast.clone(), Operator::Clone, vec![first.id])
            };

            if chance(rng, config.mutation_rate) {
                if let Some(outcome) = mutate(
                    rng,
                    &ast,
                    &config.profile,
                    config.init_max_depth,
                    config.mutation_attempts,
                ) {
                    ast = outcome.child;
                    operator = match operator {
                        Operator::Crossover => Operator::CrossoverMutation,
                        _ => Operator::Mutation,
                    };
                }
            }
            parents.dedup();

            let id = self.context.next_id();
            next.insert(
                id,
                Individual::new(id, ast, next_generation, Lineage::from(operator, parents)),
            );
        }
        Ok(next)
    }
}
