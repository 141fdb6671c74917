// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected so a broken file is fixed in one pass.

use crate::{ArborConfig, ConfigError, ConfigResult};
use std::fmt;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    OutOfRange { field: String, value: f64, min: f64, max: f64 },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{} = {} is outside valid range ({}-{})",
                field, value, min, max
            ),
        }
    }
}

/// Deepest tree a worker will decode; kept equal to the codec's nesting limit
pub const MAX_LANGUAGE_DEPTH: usize = 512;

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: &str) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    });
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &ArborConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All violations in `config`, empty when valid
pub fn collect_errors(config: &ArborConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_run(config, &mut errors);
    validate_search(config, &mut errors);
    validate_language(config, &mut errors);
    validate_dispatch(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_run(config: &ArborConfig, errors: &mut Vec<ConfigValidationError>) {
    let run = &config.run;
    if run.max_generations.is_none()
        && run.convergence_threshold.is_none()
        && run.stagnation_limit.is_none()
    {
        errors.push(ConfigValidationError::MissingRequired {
            field: "run.max_generations, run.convergence_threshold or run.stagnation_limit"
                .to_string(),
        });
    }
    if run.max_generations == Some(0) {
        invalid(errors, "run.max_generations", "must be at least 1");
    }
    if let Some(threshold) = run.convergence_threshold {
        if !threshold.is_finite() {
            invalid(errors, "run.convergence_threshold", "must be finite");
        }
    }
    if run.stagnation_limit == Some(0) {
        invalid(errors, "run.stagnation_limit", "must be at least 1");
    }
}

fn validate_search(config: &ArborConfig, errors: &mut Vec<ConfigValidationError>) {
    let population = &config.population;
    let operators = &config.operators;

    if population.size < 2 {
        invalid(errors, "population.size", "must be at least 2");
    }
    if population.elitism < 1 {
        invalid(errors, "population.elitism", "must be at least 1");
    } else if population.elitism >= population.size {
        invalid(errors, "population.elitism", "must be less than population.size");
    }
    if population.init_max_depth < 1 {
        invalid(errors, "population.init_max_depth", "must be at least 1");
    }
    if population.objective != "minimize" && population.objective != "maximize" {
        invalid(errors, "population.objective", "must be 'minimize' or 'maximize'");
    }

    if operators.tournament_size < 1 {
        invalid(errors, "operators.tournament_size", "must be at least 1");
    }
    for (field, rate) in [
        ("operators.crossover_rate", operators.crossover_rate),
        ("operators.mutation_rate", operators.mutation_rate),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            errors.push(ConfigValidationError::OutOfRange {
                field: field.to_string(),
                value: rate,
                min: 0.0,
                max: 1.0,
            });
        }
    }
}

fn validate_language(config: &ArborConfig, errors: &mut Vec<ConfigValidationError>) {
    let language = &config.language;
    if language.profile != "arithmetic" && language.profile != "imperative" {
        invalid(errors, "language.profile", "must be 'arithmetic' or 'imperative'");
    }
    if language.max_depth < 2 || language.max_depth > MAX_LANGUAGE_DEPTH {
        errors.push(ConfigValidationError::OutOfRange {
            field: "language.max_depth".to_string(),
            value: language.max_depth as f64,
            min: 2.0,
            max: MAX_LANGUAGE_DEPTH as f64,
        });
    }
    if language.max_nodes < 1 {
        invalid(errors, "language.max_nodes", "must be at least 1");
    }
    for function in &language.functions {
        if function.name.is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: "language.functions.name".to_string(),
            });
        }
    }
}

fn validate_dispatch(config: &ArborConfig, errors: &mut Vec<ConfigValidationError>) {
    let dispatch = &config.dispatch;
    if dispatch.task_timeout_ms == 0 {
        invalid(errors, "dispatch.task_timeout_ms", "must be greater than 0");
    }
    if dispatch.max_in_flight < 1 {
        invalid(errors, "dispatch.max_in_flight", "must be at least 1");
    }
    if dispatch.repeats < 1 {
        invalid(errors, "dispatch.repeats", "must be at least 1");
    }
    if config.transport.address.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "transport.address".to_string(),
        });
    }
    if config.worker.poll_timeout_ms == 0 {
        invalid(errors, "worker.poll_timeout_ms", "must be greater than 0");
    }
    if config.worker.heartbeat_interval_ms == 0 {
        invalid(errors, "worker.heartbeat_interval_ms", "must be greater than 0");
    }
}

fn validate_logging(config: &ArborConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.logging.format != "text" && config.logging.format != "json" {
        invalid(errors, "logging.format", "must be 'text' or 'json'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let result = validate_config(&ArborConfig::default());
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_stop_condition_required() {
        let mut config = ArborConfig::default();
        config.run.max_generations = None;

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigValidationError::MissingRequired { .. }));

        config.run.stagnation_limit = Some(10);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut config = ArborConfig::default();
        config.population.size = 1;
        config.operators.tournament_size = 0;
        config.operators.mutation_rate = 1.5;
        config.language.max_depth = 1;
        config.dispatch.task_timeout_ms = 0;
        config.dispatch.max_in_flight = 0;
        config.transport.address = String::new();

        let result = validate_config(&config);
        match result {
            Err(ConfigError::ValidationError(msg)) => {
                for field in [
                    "population.size",
                    "population.elitism",
                    "operators.tournament_size",
                    "operators.mutation_rate",
                    "language.max_depth",
                    "dispatch.task_timeout_ms",
                    "dispatch.max_in_flight",
                    "transport.address",
                ] {
                    assert!(msg.contains(field), "missing {field} in {msg}");
                }
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_beyond_decoder_limit_rejected() {
        let mut config = ArborConfig::default();
        config.language.max_depth = MAX_LANGUAGE_DEPTH;
        assert!(validate_config(&config).is_ok());

        config.language.max_depth = MAX_LANGUAGE_DEPTH + 1;
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ConfigValidationError::OutOfRange { field, .. } if field == "language.max_depth"
        ));
    }

    #[test]
    fn test_zero_elitism_rejected() {
        let mut config = ArborConfig::default();
        config.population.elitism = 0;

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("population.elitism"));
    }

    #[test]
    fn test_unknown_names_rejected() {
        let mut config = ArborConfig::default();
        config.population.objective = "biggest".to_string();
        config.language.profile = "lisp".to_string();
        config.logging.format = "xml".to_string();

        assert_eq!(collect_errors(&config).len(), 3);
    }
}
