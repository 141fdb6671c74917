// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Arbor coordinator
//!
//! Binds the ZeroMQ task router, evolves a population against whatever
//! workers connect, and prints the run report as JSON. Ctrl-C aborts the run.

use anyhow::{Context, Result};
use arbor::ast::Node;
use arbor::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, ArborConfig, ConfigError,
};
use arbor::evolution::SeedStrategy;
use arbor::observability::{debug_flags_help, init_logging};
use arbor::transports::zmq::ZmqTaskRouter;
use arbor::transports::Transport;
use arbor::{settings, Coordinator};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Arbor coordinator - distributed genetic programming over a ZeroMQ task queue
#[derive(Parser, Debug)]
#[command(name = "arbor-coordinator", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Configuration file (default: search for arbor_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    population_size: Option<usize>,

    #[arg(long)]
    max_generations: Option<u64>,

    /// Address the task router binds, e.g. tcp://0.0.0.0:5557
    #[arg(long)]
    address: Option<String>,

    /// JSON array of program trees to seed generation 0 with
    #[arg(long)]
    seeds: Option<PathBuf>,

    /// Write the run report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(seed) = self.seed {
            overrides.insert("seed".to_string(), seed.to_string());
        }
        if let Some(size) = self.population_size {
            overrides.insert("population_size".to_string(), size.to_string());
        }
        if let Some(generations) = self.max_generations {
            overrides.insert("max_generations".to_string(), generations.to_string());
        }
        if let Some(address) = &self.address {
            overrides.insert("transport_address".to_string(), address.clone());
        }
        overrides
    }
}

/// Falls back to defaults when no file was named and none was found
fn resolve_config(args: &Args) -> Result<(ArborConfig, Option<String>)> {
    let overrides = args.overrides();
    match load_config(args.config.as_deref(), Some(&overrides)) {
        Ok(config) => Ok((config, None)),
        Err(ConfigError::FileNotFound(searched)) if args.config.is_none() => {
            let mut config = ArborConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides);
            Ok((config, Some(searched)))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

fn seed_strategy(path: Option<&PathBuf>) -> Result<SeedStrategy> {
    let Some(path) = path else {
        return Ok(SeedStrategy::Random);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seeds from {}", path.display()))?;
    let seeds: Vec<Node> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid seed programs in {}", path.display()))?;
    Ok(SeedStrategy::Import(seeds))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Debug flags are not clap arguments
    let args = Args::parse_from(std::env::args().filter(|arg| !arg.starts_with("--debug-")));

    let (config, fallback) = resolve_config(&args)?;
    let _logging = init_logging(&settings::logging_options(&config)?, &settings::debug_flags(&config))?;
    if let Some(searched) = fallback {
        warn!(target: "arbor", "No configuration file found, using defaults. {}", searched);
    }

    let strategy = seed_strategy(args.seeds.as_ref())?;

    let mut router = ZmqTaskRouter::with_config(settings::server_config(&config))?;
    router.start()?;
    info!(target: "arbor", "🦀 [COORDINATOR] Task router bound to {}", config.transport.address);

    let coordinator = Coordinator::new(config, Arc::new(router))?;

    let abort = coordinator.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target: "arbor", "🦀 [COORDINATOR] Interrupted, aborting run");
            abort.abort();
        }
    });

    let report = match coordinator.run(strategy).await {
        Ok(report) => report,
        Err(e) => {
            error!(target: "arbor", "🦀 [COORDINATOR] Run failed: {}", e);
            return Err(e.into());
        }
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(target: "arbor", "🦀 [COORDINATOR] Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
