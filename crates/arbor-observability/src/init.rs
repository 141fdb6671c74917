// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with a log directory, each process run also gets a
//! timestamped folder holding a daily-rotated JSON log:
//!
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── arbor.log.2025-01-01
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingOptions};

const RUN_PREFIX: &str = "run_";

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of this run's log files, if file logging is on
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `options.level` and the debug flags.
///
/// # Errors
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(options: &LoggingOptions, debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let directives = debug_flags.to_filter_string(&options.level);
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console = match options.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(filter())
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter())
            .boxed(),
    };
    layers.push(console);

    let mut file_guard = None;
    let mut run_dir = None;
    if let Some(base) = &options.directory {
        let folder = create_run_folder(base)?;
        cleanup_old_runs(base, options.retention_runs)?;

        let appender = rolling::daily(&folder, "arbor.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(filter())
                .boxed(),
        );
        file_guard = Some(guard);
        run_dir = Some(folder);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        run_dir,
    })
}

fn create_run_folder(base: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let folder = base.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&folder)
        .with_context(|| format!("Failed to create log directory: {}", folder.display()))?;
    Ok(folder)
}

/// Remove all but the `keep` newest run folders under `base`
fn cleanup_old_runs(base: &Path, keep: usize) -> Result<()> {
    let mut runs: Vec<PathBuf> = std::fs::read_dir(base)
        .with_context(|| format!("Failed to list log directory: {}", base.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(RUN_PREFIX))
        })
        .collect();

    // Timestamps sort lexicographically
    runs.sort();
    let excess = runs.len().saturating_sub(keep.max(1));
    for path in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
        }
    }
    Ok(())
}
