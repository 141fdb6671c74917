// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Run context: configuration, the single seeded RNG, generation counter and id
allocator of one evolution run.
*/

use crate::fitness::Objective;
use crate::random::seeded_rng;
use crate::types::{EvoError, EvoResult, IndividualId};
use arbor_ast::LanguageProfile;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Parameters of the genetic search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Tournament sample size `k`
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Crossover retries before falling back to a clone of the first parent
    pub crossover_attempts: usize,
    /// Mutation retries before leaving the individual unmutated
    pub mutation_attempts: usize,
    /// Best individuals copied unchanged into the next generation
    pub elitism: usize,
    pub objective: Objective,
    pub profile: LanguageProfile,
    /// `None` draws a seed from the OS and logs it
    pub seed: Option<u64>,
    /// Depth ceiling used by ramped half-and-half initialization
    pub init_max_depth: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 64,
            tournament_size: 3,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            crossover_attempts: 10,
            mutation_attempts: 10,
            elitism: 1,
            objective: Objective::Minimize,
            profile: LanguageProfile::default(),
            seed: None,
            init_max_depth: 6,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> EvoResult<()> {
        if self.population_size < 2 {
            return Err(EvoError::InvalidConfig(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(EvoError::InvalidConfig(
                "tournament_size must be at least 1".to_string(),
            ));
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EvoError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.elitism < 1 {
            return Err(EvoError::InvalidConfig(
                "elitism must be at least 1 so the best fitness never regresses".to_string(),
            ));
        }
        if self.elitism >= self.population_size {
            return Err(EvoError::InvalidConfig(format!(
                "elitism ({}) must be smaller than population_size ({})",
                self.elitism, self.population_size
            )));
        }
        if self.profile.limits.max_depth < 2 {
            return Err(EvoError::InvalidConfig(format!(
                "max tree depth must be at least 2, got {}",
                self.profile.limits.max_depth
            )));
        }
        if self.init_max_depth < 1 {
            return Err(EvoError::InvalidConfig(
                "init_max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mutable state shared by every stochastic step of a run
#[derive(Debug)]
pub struct RunContext {
    pub config: EvolutionConfig,
    pub rng: StdRng,
    /// Seed the RNG was built from, reported for replay
    pub seed: u64,
    pub generation: u64,
    next_id: IndividualId,
}

impl RunContext {
    pub fn new(config: EvolutionConfig) -> EvoResult<Self> {
        config.validate()?;
        let (rng, seed) = seeded_rng(config.seed);
        Ok(Self {
            config,
            rng,
            seed,
            generation: 0,
            next_id: 1,
        })
    }

    /// Allocate a fresh individual id; ids are never reused within a run
    pub fn next_id(&mut self) -> IndividualId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_rates() {
        let config = EvolutionConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EvoError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_tiny_population() {
        let config = EvolutionConfig {
            population_size: 1,
            ..Default::default()
        };
        assert!(RunContext::new(config).is_err());
    }

    #[test]
    fn test_rejects_zero_elitism() {
        let config = EvolutionConfig {
            elitism: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EvoError::InvalidConfig(_))));
        assert!(RunContext::new(config).is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut context = RunContext::new(EvolutionConfig {
            seed: Some(3),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(context.seed, 3);
        let a = context.next_id();
        let b = context.next_id();
        assert_ne!(a, b);
    }
}
