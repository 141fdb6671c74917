// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dispatcher error types

use arbor_evolution::EvoError;
use arbor_transports::TransportError;
use thiserror::Error;

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid dispatch config: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Evaluation of generation {generation} aborted")]
    Aborted { generation: u64 },

    #[error("Task worker panicked or was cancelled: {0}")]
    TaskJoin(String),
}

impl DispatchError {
    /// Convert into the run-level error for `generation`
    pub fn into_evo_error(self, generation: u64) -> EvoError {
        match self {
            DispatchError::Aborted { generation } => EvoError::RunAborted { generation },
            other => EvoError::Evaluation {
                generation,
                message: other.to_string(),
            },
        }
    }
}
