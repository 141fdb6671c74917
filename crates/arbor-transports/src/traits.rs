// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions
//!
//! These traits define the common interface for all task-queue transports.
//! Implementations differ in how frames travel (in-process channels, ZMQ
//! sockets) but all deliver opaque byte frames at least once.

use crate::common::TransportResult;

/// Base transport trait - implemented by all transports
pub trait Transport: Send + Sync {
    /// Start the transport
    fn start(&mut self) -> TransportResult<()>;

    /// Stop the transport
    fn stop(&mut self) -> TransportResult<()>;

    /// Check if transport is running
    fn is_running(&self) -> bool;

    /// Get transport name/type
    fn transport_type(&self) -> &str;
}

/// Task queue (coordinator side)
///
/// Hands task frames to the next available worker and collects reply frames
/// from any worker. Replies are not correlated by the transport; callers route
/// them using the frame contents.
pub trait TaskQueueServer: Transport {
    /// Queue a task frame for the next available worker
    fn dispatch(&self, payload: &[u8]) -> TransportResult<()>;

    /// Wait up to `timeout_ms` for a reply frame from any worker
    fn collect_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>>;

    /// Best-effort delivery of a control frame to every live worker.
    /// Returns the number of workers it was sent to.
    fn broadcast(&self, payload: &[u8]) -> TransportResult<usize>;

    /// Workers currently believed alive
    fn worker_count(&self) -> usize;

    /// Drop task frames no worker has taken yet; returns how many were dropped
    fn discard_pending(&self) -> usize;
}

/// Task queue (worker side)
pub trait TaskQueueClient: Transport {
    /// Wait up to `timeout_ms` for the next frame addressed to this worker
    /// (a task or a broadcast control frame)
    fn fetch_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>>;

    /// Return a reply frame; the worker becomes available again
    fn reply(&self, payload: &[u8]) -> TransportResult<()>;

    /// Signal liveness while idle
    fn heartbeat(&self) -> TransportResult<()>;
}
