// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Translation from [`ArborConfig`] sections to the per-crate settings types

use crate::error::ArborResult;
use arbor_ast::{LanguageProfile, TreeLimits};
use arbor_config::{ArborConfig, ConfigError};
use arbor_dispatch::DispatchConfig;
use arbor_evolution::{EvolutionConfig, Objective, StopCondition};
use arbor_observability::{CrateDebugFlags, LogFormat, LoggingOptions};
use arbor_transports::{ClientConfig, ServerConfig, TransportConfig};
use arbor_worker::{FitnessAggregator, WorkerConfig};
use std::time::Duration;

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

pub fn objective(config: &ArborConfig) -> ArborResult<Objective> {
    match config.population.objective.as_str() {
        "minimize" => Ok(Objective::Minimize),
        "maximize" => Ok(Objective::Maximize),
        other => Err(invalid(format!("unknown objective '{}'", other)).into()),
    }
}

/// Named base profile with the configured limits, variables and functions
pub fn language_profile(config: &ArborConfig) -> ArborResult<LanguageProfile> {
    let language = &config.language;
    let base = match language.profile.as_str() {
        "arithmetic" => LanguageProfile::arithmetic(),
        "imperative" => LanguageProfile::imperative(),
        other => return Err(invalid(format!("unknown language profile '{}'", other)).into()),
    };
    let mut profile = base
        .with_limits(TreeLimits::new(language.max_depth, language.max_nodes))
        .with_variables(language.variables);
    for function in &language.functions {
        profile = profile.with_function(function.name.clone(), function.arity);
    }
    Ok(profile)
}

pub fn evolution_config(config: &ArborConfig) -> ArborResult<EvolutionConfig> {
    Ok(EvolutionConfig {
        population_size: config.population.size,
        tournament_size: config.operators.tournament_size,
        crossover_rate: config.operators.crossover_rate,
        mutation_rate: config.operators.mutation_rate,
        crossover_attempts: config.operators.crossover_attempts,
        mutation_attempts: config.operators.mutation_attempts,
        elitism: config.population.elitism,
        objective: objective(config)?,
        profile: language_profile(config)?,
        seed: config.run.seed,
        init_max_depth: config.population.init_max_depth,
    })
}

pub fn stop_condition(config: &ArborConfig) -> StopCondition {
    StopCondition {
        max_generations: config.run.max_generations,
        target_fitness: config.run.convergence_threshold,
        stagnation_limit: config.run.stagnation_limit,
    }
}

pub fn dispatch_config(config: &ArborConfig) -> DispatchConfig {
    let dispatch = &config.dispatch;
    DispatchConfig {
        task_timeout_ms: dispatch.task_timeout_ms,
        max_retries: dispatch.max_retries,
        max_in_flight: dispatch.max_in_flight,
        poll_interval_ms: dispatch.poll_interval_ms,
        time_budget_ms: dispatch.time_budget_ms,
        max_steps: dispatch.max_steps,
        repeats: dispatch.repeats,
    }
}

pub fn worker_config(config: &ArborConfig) -> WorkerConfig {
    let worker = &config.worker;
    WorkerConfig {
        poll_timeout_ms: worker.poll_timeout_ms,
        heartbeat_interval_ms: worker.heartbeat_interval_ms,
        fitness: FitnessAggregator {
            weights: worker.weights.clone(),
            complexity_weight: worker.complexity_weight,
        },
    }
}

fn transport_config(config: &ArborConfig) -> TransportConfig {
    let transport = &config.transport;
    TransportConfig::new(transport.address.clone())
        .with_max_message_size(transport.max_message_size)
        .with_heartbeat(
            Duration::from_millis(transport.heartbeat_interval_ms),
            transport.heartbeat_liveness,
        )
}

/// Settings for the coordinator's ROUTER socket
pub fn server_config(config: &ArborConfig) -> ServerConfig {
    ServerConfig {
        base: transport_config(config),
        max_pending: config.transport.max_pending,
    }
}

/// Settings for a worker's DEALER socket
pub fn client_config(config: &ArborConfig) -> ClientConfig {
    ClientConfig {
        base: transport_config(config),
        identity: None,
    }
}

pub fn logging_options(config: &ArborConfig) -> ArborResult<LoggingOptions> {
    let format: LogFormat = config.logging.format.parse().map_err(invalid)?;
    Ok(LoggingOptions {
        level: config.logging.level.clone(),
        format,
        directory: config.logging.directory.clone(),
        ..Default::default()
    })
}

/// Debug flags from the command line and environment plus `logging.debug_crates`
pub fn debug_flags(config: &ArborConfig) -> CrateDebugFlags {
    let mut flags = arbor_observability::parse_debug_flags();
    for crate_name in &config.logging.debug_crates {
        flags.enable(crate_name);
    }
    flags
}
