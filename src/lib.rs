// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Arbor - Distributed Genetic Programming
//!
//! Arbor evolves program trees with tree-based genetic programming and
//! evaluates them on a pool of workers over a task queue.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arbor::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None, None)?;
//! let mut queue = MemoryTaskQueue::new();
//! queue.start()?;
//! // ... spawn workers with queue.connect_worker()
//! let coordinator = Coordinator::new(config, Arc::new(queue))?;
//! let report = coordinator.run(SeedStrategy::Random).await?;
//! println!("best after {} generations: {:?}", report.generations, report.best);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: arbor-ast, arbor-config                    │
//! │  (Program trees, language profiles, configuration)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Evolution: arbor-evolution                             │
//! │  (Population, selection, crossover, mutation, runs)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Distribution: arbor-dispatch, arbor-worker             │
//! │  (Deadlines, retries, cancellation, worker harness)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  I/O: arbor-serialization, arbor-transports             │
//! │  (Wire format, in-process and ZeroMQ task queues)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coordinator;
pub mod error;
pub mod settings;

pub use coordinator::Coordinator;
pub use error::{ArborError, ArborResult};

pub use arbor_ast as ast;
pub use arbor_config as config;
pub use arbor_dispatch as dispatch;
pub use arbor_evolution as evolution;
pub use arbor_observability as observability;
pub use arbor_serialization as serialization;
pub use arbor_transports as transports;
pub use arbor_worker as worker;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::coordinator::Coordinator;
    pub use crate::error::{ArborError, ArborResult};

    pub use arbor_ast::{LanguageProfile, Node, NodeKind, Role, TreeLimits};
    pub use arbor_config::{load_config, validate_config, ArborConfig};
    pub use arbor_dispatch::{AbortHandle, TaskDispatcher};
    pub use arbor_evolution::{
        EvolutionConfig, EvolutionRun, GenerationSummary, Individual, Objective,
        PopulationManager, RunReport, SeedStrategy, StopCondition, StopReason,
    };
    pub use arbor_transports::memory::{MemoryTaskClient, MemoryTaskQueue};
    pub use arbor_transports::{TaskQueueClient, TaskQueueServer, Transport};
    pub use arbor_worker::{
        ExecutionBudget, ExecutionFailure, FnRuntime, Measurements, Runtime, Worker,
    };
}
