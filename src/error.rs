// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Top-level error type

use arbor_config::ConfigError;
use arbor_dispatch::DispatchError;
use arbor_evolution::EvoError;
use arbor_transports::TransportError;
use arbor_worker::WorkerError;
use thiserror::Error;

pub type ArborResult<T> = Result<T, ArborError>;

#[derive(Error, Debug)]
pub enum ArborError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Evolution(#[from] EvoError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}
