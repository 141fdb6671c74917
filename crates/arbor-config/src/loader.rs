// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ArborConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "arbor_configuration.toml";

/// Find the Arbor configuration file
///
/// Search order:
/// 1. `ARBOR_CONFIG_PATH` environment variable
/// 2. Current working directory: `./arbor_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("ARBOR_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by ARBOR_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet ARBOR_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Validation is a separate step, see [`validate_config`](crate::validate_config).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ArborConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: ArborConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parsed<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ARBOR_SEED` -> `run.seed`
/// - `ARBOR_MAX_GENERATIONS` -> `run.max_generations`
/// - `ARBOR_POPULATION_SIZE` -> `population.size`
/// - `ARBOR_TASK_TIMEOUT_MS` -> `dispatch.task_timeout_ms`
/// - `ARBOR_MAX_RETRIES` -> `dispatch.max_retries`
/// - `ARBOR_MAX_IN_FLIGHT` -> `dispatch.max_in_flight`
/// - `ARBOR_TRANSPORT_ADDRESS` -> `transport.address`
/// - `ARBOR_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut ArborConfig) {
    if let Some(seed) = parsed(env::var("ARBOR_SEED").ok()) {
        config.run.seed = Some(seed);
    }
    if let Some(generations) = parsed(env::var("ARBOR_MAX_GENERATIONS").ok()) {
        config.run.max_generations = Some(generations);
    }
    if let Some(size) = parsed(env::var("ARBOR_POPULATION_SIZE").ok()) {
        config.population.size = size;
    }
    if let Some(timeout) = parsed(env::var("ARBOR_TASK_TIMEOUT_MS").ok()) {
        config.dispatch.task_timeout_ms = timeout;
    }
    if let Some(retries) = parsed(env::var("ARBOR_MAX_RETRIES").ok()) {
        config.dispatch.max_retries = retries;
    }
    if let Some(in_flight) = parsed(env::var("ARBOR_MAX_IN_FLIGHT").ok()) {
        config.dispatch.max_in_flight = in_flight;
    }
    if let Ok(value) = env::var("ARBOR_TRANSPORT_ADDRESS") {
        config.transport.address = value;
    }
    if let Ok(value) = env::var("ARBOR_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"seed": "7", "population_size": "200"}`)
pub fn apply_cli_overrides(config: &mut ArborConfig, cli_args: &HashMap<String, String>) {
    let get = |key: &str| cli_args.get(key).cloned();

    // Run
    if let Some(seed) = parsed(get("seed")) {
        config.run.seed = Some(seed);
    }
    if let Some(generations) = parsed(get("max_generations")) {
        config.run.max_generations = Some(generations);
    }
    if let Some(threshold) = parsed(get("convergence_threshold")) {
        config.run.convergence_threshold = Some(threshold);
    }
    if let Some(limit) = parsed(get("stagnation_limit")) {
        config.run.stagnation_limit = Some(limit);
    }
    if let Some(path) = get("summary_path") {
        config.run.summary_path = Some(PathBuf::from(path));
    }

    // Population and operators
    if let Some(size) = parsed(get("population_size")) {
        config.population.size = size;
    }
    if let Some(k) = parsed(get("tournament_size")) {
        config.operators.tournament_size = k;
    }
    if let Some(rate) = parsed(get("crossover_rate")) {
        config.operators.crossover_rate = rate;
    }
    if let Some(rate) = parsed(get("mutation_rate")) {
        config.operators.mutation_rate = rate;
    }

    // Dispatch and transport
    if let Some(timeout) = parsed(get("task_timeout_ms")) {
        config.dispatch.task_timeout_ms = timeout;
    }
    if let Some(retries) = parsed(get("max_retries")) {
        config.dispatch.max_retries = retries;
    }
    if let Some(in_flight) = parsed(get("max_in_flight")) {
        config.dispatch.max_in_flight = in_flight;
    }
    if let Some(address) = get("transport_address") {
        config.transport.address = address;
    }

    // Logging
    if let Some(level) = get("log_level") {
        config.logging.level = level;
    }
    if let Some(format) = get("log_format") {
        config.logging.format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 8] = [
        "ARBOR_SEED",
        "ARBOR_MAX_GENERATIONS",
        "ARBOR_POPULATION_SIZE",
        "ARBOR_TASK_TIMEOUT_MS",
        "ARBOR_MAX_RETRIES",
        "ARBOR_MAX_IN_FLIGHT",
        "ARBOR_TRANSPORT_ADDRESS",
        "ARBOR_LOG_LEVEL",
    ];

    fn clear_overrides() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("ARBOR_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("ARBOR_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("ARBOR_CONFIG_PATH", "/nonexistent/arbor.toml");
        let result = find_config_file();
        env::remove_var("ARBOR_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[run]").unwrap();
        writeln!(file, "seed = 11").unwrap();
        writeln!(file, "stagnation_limit = 5").unwrap();
        writeln!(file, "[population]").unwrap();
        writeln!(file, "size = 128").unwrap();
        writeln!(file, "[[language.functions]]").unwrap();
        writeln!(file, "name = \"sin\"").unwrap();
        writeln!(file, "arity = 1").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.run.seed, Some(11));
        assert_eq!(config.run.stagnation_limit, Some(5));
        assert_eq!(config.run.max_generations, Some(50));
        assert_eq!(config.population.size, 128);
        assert_eq!(config.language.functions[0].name, "sin");
        assert_eq!(config.dispatch, crate::DispatchConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[population\nsize = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let mut config = ArborConfig::default();

        env::set_var("ARBOR_SEED", "42");
        env::set_var("ARBOR_MAX_RETRIES", "7");
        env::set_var("ARBOR_TRANSPORT_ADDRESS", "tcp://10.0.0.5:6000");
        env::set_var("ARBOR_POPULATION_SIZE", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_overrides();

        assert_eq!(config.run.seed, Some(42));
        assert_eq!(config.dispatch.max_retries, 7);
        assert_eq!(config.transport.address, "tcp://10.0.0.5:6000");
        assert_eq!(config.population.size, 64);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ArborConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("population_size".to_string(), "300".to_string());
        cli_args.insert("convergence_threshold".to_string(), "0.001".to_string());
        cli_args.insert("log_format".to_string(), "json".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.population.size, 300);
        assert_eq!(config.run.convergence_threshold, Some(0.001));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[dispatch]").unwrap();
        writeln!(file, "task_timeout_ms = 100").unwrap();
        writeln!(file, "max_in_flight = 4").unwrap();

        env::set_var("ARBOR_TASK_TIMEOUT_MS", "200");
        env::set_var("ARBOR_MAX_IN_FLIGHT", "8");

        let mut cli_args = HashMap::new();
        cli_args.insert("task_timeout_ms".to_string(), "300".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_overrides();

        // CLI wins for the timeout, env wins for in-flight (no CLI override)
        assert_eq!(config.dispatch.task_timeout_ms, 300);
        assert_eq!(config.dispatch.max_in_flight, 8);
    }
}
