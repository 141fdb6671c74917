// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Arbor Worker

Evaluation side of distributed evaluation. A [`Worker`] pulls task frames from
a [`TaskQueueClient`](arbor_transports::TaskQueueClient), runs each program on
a pluggable [`Runtime`] and replies with a result frame.

- Tasks are executed `repeats` times and the fitness averaged
- A task whose header cannot be decoded but whose id is recoverable is answered
  with a `MALFORMED` result so the coordinator does not wait for it
- Individuals the coordinator abandoned are skipped
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod fitness;
pub mod runtime;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use fitness::FitnessAggregator;
pub use runtime::{ExecutionBudget, ExecutionFailure, FnRuntime, Measurements, Runtime};
pub use worker::{Worker, WorkerStats};
