// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Per-generation summaries and the sinks they are reported to.
*/

use crate::types::{EvoResult, IndividualId};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Statistics of one evaluated generation
///
/// Fitness statistics cover viable individuals only and are `None` when there
/// are none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u64,
    pub population_size: usize,
    /// Individuals that reached a terminal evaluation state
    pub evaluated: usize,
    /// Individuals that failed permanently
    pub failed_count: usize,
    pub best_fitness: Option<f64>,
    pub mean_fitness: Option<f64>,
    pub worst_fitness: Option<f64>,
    pub best_individual: Option<IndividualId>,
    /// Rendered program of the best individual
    pub best_program: Option<String>,
    pub mean_nodes: f64,
}

/// Receives every summary produced by the population manager
pub trait SummarySink: Send + Sync {
    fn record(&mut self, summary: &GenerationSummary) -> EvoResult<()>;
}

/// Appends one JSON object per generation to a file
pub struct JsonLinesSummarySink {
    path: PathBuf,
    writer: BufWriter<File>,
}

#[derive(Serialize)]
struct TimestampedSummary<'a> {
    timestamp: String,
    #[serde(flatten)]
    summary: &'a GenerationSummary,
}

impl JsonLinesSummarySink {
    /// Open `path` for appending, creating it and its parent directories
    pub fn create(path: impl AsRef<Path>) -> EvoResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummarySink for JsonLinesSummarySink {
    fn record(&mut self, summary: &GenerationSummary) -> EvoResult<()> {
        let line = serde_json::to_string(&TimestampedSummary {
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
        })?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Logs each summary at info level
#[derive(Debug, Default)]
pub struct TracingSummarySink;

impl SummarySink for TracingSummarySink {
    fn record(&mut self, summary: &GenerationSummary) -> EvoResult<()> {
        info!(
            target: "arbor-evolution",
            "🧬 [EVOLUTION] Generation {}: best={} mean={} worst={} failed={}/{} mean_nodes={:.1}",
            summary.generation,
            format_fitness(summary.best_fitness),
            format_fitness(summary.mean_fitness),
            format_fitness(summary.worst_fitness),
            summary.failed_count,
            summary.population_size,
            summary.mean_nodes
        );
        Ok(())
    }
}

fn format_fitness(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "n/a".to_string(),
    }
}
