// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # arbor-transports
//!
//! Task-queue transports connecting the Arbor evolution coordinator with its
//! evaluation workers. Frames are opaque bytes; encoding lives in
//! `arbor-serialization`.
//!
//! ## Implementations
//!
//! ### Memory
//! - In-process crossbeam channels, for single-process runs and tests
//!
//! ### ZMQ (ZeroMQ)
//! - **Server**: ROUTER with least-recently-used worker queue, pending-task cache
//!   and heartbeat-based liveness
//! - **Client**: DEALER that announces READY, replies and heartbeats
//!
//! ## Feature Flags
//!
//! ```toml
//! # Coordinator only
//! [dependencies]
//! arbor-transports = { version = "0.1", features = ["zmq-server"] }
//!
//! # Everything
//! [dependencies]
//! arbor-transports = { version = "0.1", features = ["all"] }
//! ```
//!
//! Available feature flags:
//! - `memory`: In-process queue (default)
//! - `zmq-server`: ZMQ coordinator queue
//! - `zmq-client`: ZMQ worker endpoint
//! - `all`: Everything
//!
//! ## Example: In-process queue
//!
//! ```
//! # #[cfg(feature = "memory")]
//! # {
//! use arbor_transports::memory::MemoryTaskQueue;
//! use arbor_transports::traits::{TaskQueueClient, TaskQueueServer, Transport};
//!
//! let mut queue = MemoryTaskQueue::new();
//! queue.start().unwrap();
//! let mut worker = queue.connect_worker();
//! worker.start().unwrap();
//!
//! queue.dispatch(b"task").unwrap();
//! let task = worker.fetch_timeout(100).unwrap();
//! worker.reply(&task).unwrap();
//! assert_eq!(queue.collect_timeout(100).unwrap(), b"task");
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Common**: Shared types (errors, configs, signals)
//! 2. **Traits**: Transport-agnostic interfaces
//! 3. **Implementations**: Memory, ZMQ

pub mod common;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(any(feature = "zmq-server", feature = "zmq-client"))]
pub mod zmq;

// Re-export commonly used types
pub use common::{
    ClientConfig, ServerConfig, Signal, TransportConfig, TransportError, TransportResult,
};

pub use traits::{TaskQueueClient, TaskQueueServer, Transport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::traits::*;

    #[cfg(feature = "memory")]
    pub use crate::memory::*;

    #[cfg(feature = "zmq-server")]
    pub use crate::zmq::server::*;

    #[cfg(feature = "zmq-client")]
    pub use crate::zmq::client::*;
}
