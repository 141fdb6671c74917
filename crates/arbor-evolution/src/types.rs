// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types and error handling for Arbor evolution.
*/

use arbor_ast::AstError;
use thiserror::Error;

/// Identifier of an individual, unique for the lifetime of a run
pub type IndividualId = u64;

/// Result type for evolution operations
pub type EvoResult<T> = Result<T, EvoError>;

/// Error types for evolution operations
#[derive(Error, Debug)]
pub enum EvoError {
    #[error("Invalid evolution config: {0}")]
    InvalidConfig(String),

    #[error("Seed program {index} rejected: {source}")]
    InvalidSeed {
        index: usize,
        #[source]
        source: AstError,
    },

    #[error("No seed programs supplied")]
    NoSeeds,

    #[error("Generation {generation} still has {pending} unevaluated individuals")]
    GenerationIncomplete { generation: u64, pending: usize },

    #[error("Population exhausted in generation {generation}: only {viable} individuals have a valid fitness")]
    PopulationExhausted { generation: u64, viable: usize },

    #[error("Run aborted during generation {generation}")]
    RunAborted { generation: u64 },

    #[error("Evaluation of generation {generation} failed: {message}")]
    Evaluation { generation: u64, message: String },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("JSON error: {0}")]
    JsonError(String),
}

impl EvoError {
    /// Generation the failure belongs to, when it is tied to one
    pub fn generation(&self) -> Option<u64> {
        match self {
            EvoError::GenerationIncomplete { generation, .. }
            | EvoError::PopulationExhausted { generation, .. }
            | EvoError::RunAborted { generation }
            | EvoError::Evaluation { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}

// Convert from serde_json::Error
impl From<serde_json::Error> for EvoError {
    fn from(err: serde_json::Error) -> Self {
        EvoError::JsonError(err.to_string())
    }
}

// Convert from std::io::Error
impl From<std::io::Error> for EvoError {
    fn from(err: std::io::Error) -> Self {
        EvoError::IoError(err.to_string())
    }
}
