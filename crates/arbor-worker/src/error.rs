// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Worker error types

use arbor_transports::TransportError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid worker config: {0}")]
    InvalidConfig(String),
}
