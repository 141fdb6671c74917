// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # arbor-observability
//!
//! Logging setup shared by the Arbor binaries: a console layer, optional
//! JSON output, optional daily-rotated log files and per-crate debug flags
//! (`--debug-arbor-dispatch`, `ARBOR_DEBUG=arbor-worker`).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Arbor crates that accept debug flags; also the log targets they use
pub const KNOWN_CRATES: &[&str] = &[
    "arbor",
    "arbor-ast",
    "arbor-evolution",
    "arbor-serialization",
    "arbor-transports",
    "arbor-dispatch",
    "arbor-worker",
    "arbor-config",
];
