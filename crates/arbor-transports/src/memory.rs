// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process task queue
//!
//! Workers share one multi-consumer task channel, so whichever worker is free
//! takes the next task. Each worker also owns a private control channel that
//! receives broadcasts. Used for single-process runs and tests.

use crate::common::{TransportConfig, TransportError, TransportResult};
use crate::traits::{TaskQueueClient, TaskQueueServer, Transport};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

struct ControlLink {
    alive: Weak<()>,
    sender: Sender<Vec<u8>>,
}

/// Coordinator side of the in-process queue
pub struct MemoryTaskQueue {
    config: TransportConfig,
    task_tx: Sender<Vec<u8>>,
    task_rx: Receiver<Vec<u8>>,
    reply_tx: Sender<Vec<u8>>,
    reply_rx: Receiver<Vec<u8>>,
    controls: Mutex<Vec<ControlLink>>,
    running: Arc<Mutex<bool>>,
}

impl MemoryTaskQueue {
    pub fn new() -> Self {
        Self::with_config(TransportConfig::new("inproc://arbor-tasks"))
    }

    pub fn with_config(config: TransportConfig) -> Self {
        let (task_tx, task_rx) = channel::unbounded();
        let (reply_tx, reply_rx) = channel::unbounded();
        Self {
            config,
            task_tx,
            task_rx,
            reply_tx,
            reply_rx,
            controls: Mutex::new(Vec::new()),
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Create a worker endpoint attached to this queue
    pub fn connect_worker(&self) -> MemoryTaskClient {
        let (control_tx, control_rx) = channel::unbounded();
        let alive = Arc::new(());
        self.controls.lock().push(ControlLink {
            alive: Arc::downgrade(&alive),
            sender: control_tx,
        });
        MemoryTaskClient {
            task_rx: self.task_rx.clone(),
            reply_tx: self.reply_tx.clone(),
            control_rx,
            server_running: Arc::clone(&self.running),
            running: Mutex::new(false),
            _alive: alive,
        }
    }

    /// Tasks queued but not yet taken by a worker
    pub fn backlog(&self) -> usize {
        self.task_rx.len()
    }

    fn ensure_running(&self) -> TransportResult<()> {
        if *self.running.lock() {
            Ok(())
        } else {
            Err(TransportError::NotRunning)
        }
    }
}

impl Default for MemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTaskQueue {
    fn start(&mut self) -> TransportResult<()> {
        let mut running = self.running.lock();
        if *running {
            return Err(TransportError::AlreadyRunning);
        }
        *running = true;
        info!("🦀 [MEMORY-QUEUE] Started {}", self.config.address);
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        *self.running.lock() = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn transport_type(&self) -> &str {
        "memory-queue"
    }
}

impl TaskQueueServer for MemoryTaskQueue {
    fn dispatch(&self, payload: &[u8]) -> TransportResult<()> {
        self.ensure_running()?;
        self.config.check_message_size(payload.len())?;
        self.task_tx
            .send(payload.to_vec())
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn collect_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        self.ensure_running()?;
        self.reply_rx
            .recv_timeout(Duration::from_millis(timeout_ms))
            .map_err(|e| match e {
                channel::RecvTimeoutError::Timeout => TransportError::Timeout,
                channel::RecvTimeoutError::Disconnected => TransportError::ConnectionClosed,
            })
    }

    fn broadcast(&self, payload: &[u8]) -> TransportResult<usize> {
        self.ensure_running()?;
        let mut controls = self.controls.lock();
        controls.retain(|link| link.alive.strong_count() > 0);
        let mut delivered = 0;
        for link in controls.iter() {
            if link.sender.send(payload.to_vec()).is_ok() {
                delivered += 1;
            }
        }
        debug!("[MEMORY-QUEUE] Broadcast to {} workers", delivered);
        Ok(delivered)
    }

    fn worker_count(&self) -> usize {
        self.controls
            .lock()
            .iter()
            .filter(|link| link.alive.strong_count() > 0)
            .count()
    }

    fn discard_pending(&self) -> usize {
        self.task_rx.try_iter().count()
    }
}

/// Worker side of the in-process queue
pub struct MemoryTaskClient {
    task_rx: Receiver<Vec<u8>>,
    reply_tx: Sender<Vec<u8>>,
    control_rx: Receiver<Vec<u8>>,
    server_running: Arc<Mutex<bool>>,
    running: Mutex<bool>,
    _alive: Arc<()>,
}

impl MemoryTaskClient {
    fn ensure_running(&self) -> TransportResult<()> {
        if *self.running.lock() {
            Ok(())
        } else {
            Err(TransportError::NotRunning)
        }
    }
}

impl Transport for MemoryTaskClient {
    fn start(&mut self) -> TransportResult<()> {
        let mut running = self.running.lock();
        if *running {
            return Err(TransportError::AlreadyRunning);
        }
        *running = true;
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        *self.running.lock() = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn transport_type(&self) -> &str {
        "memory-worker"
    }
}

impl TaskQueueClient for MemoryTaskClient {
    fn fetch_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        self.ensure_running()?;
        // Control frames win over tasks when both are waiting
        if let Ok(control) = self.control_rx.try_recv() {
            return Ok(control);
        }
        crossbeam::select! {
            recv(self.control_rx) -> msg => msg.map_err(|_| TransportError::ConnectionClosed),
            recv(self.task_rx) -> msg => msg.map_err(|_| TransportError::ConnectionClosed),
            default(Duration::from_millis(timeout_ms)) => Err(TransportError::Timeout),
        }
    }

    fn reply(&self, payload: &[u8]) -> TransportResult<()> {
        self.ensure_running()?;
        if !*self.server_running.lock() {
            return Err(TransportError::ConnectionClosed);
        }
        self.reply_tx
            .send(payload.to_vec())
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn heartbeat(&self) -> TransportResult<()> {
        self.ensure_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> MemoryTaskQueue {
        let mut queue = MemoryTaskQueue::new();
        queue.start().unwrap();
        queue
    }

    #[test]
    fn test_not_running() {
        let queue = MemoryTaskQueue::new();
        assert!(matches!(
            queue.dispatch(b"x"),
            Err(TransportError::NotRunning)
        ));
    }

    #[test]
    fn test_dispatch_fetch_reply() {
        let queue = started();
        let mut worker = queue.connect_worker();
        worker.start().unwrap();

        queue.dispatch(b"task-1").unwrap();
        assert_eq!(worker.fetch_timeout(100).unwrap(), b"task-1");
        worker.reply(b"done-1").unwrap();
        assert_eq!(queue.collect_timeout(100).unwrap(), b"done-1");
    }

    #[test]
    fn test_collect_times_out() {
        let queue = started();
        assert!(matches!(
            queue.collect_timeout(10),
            Err(TransportError::Timeout)
        ));
    }

    #[test]
    fn test_broadcast_reaches_live_workers_only() {
        let queue = started();
        let mut a = queue.connect_worker();
        a.start().unwrap();
        let b = queue.connect_worker();
        assert_eq!(queue.worker_count(), 2);

        drop(b);
        assert_eq!(queue.worker_count(), 1);
        assert_eq!(queue.broadcast(b"abort").unwrap(), 1);
        assert_eq!(a.fetch_timeout(100).unwrap(), b"abort");
    }

    #[test]
    fn test_control_preferred_over_task() {
        let queue = started();
        let mut worker = queue.connect_worker();
        worker.start().unwrap();

        queue.dispatch(b"task").unwrap();
        queue.broadcast(b"control").unwrap();
        assert_eq!(worker.fetch_timeout(100).unwrap(), b"control");
        assert_eq!(worker.fetch_timeout(100).unwrap(), b"task");
        assert_eq!(queue.backlog(), 0);
    }

    #[test]
    fn test_discard_pending_drops_untaken_tasks() {
        let queue = started();
        let mut worker = queue.connect_worker();
        worker.start().unwrap();

        queue.dispatch(b"stale-1").unwrap();
        queue.dispatch(b"stale-2").unwrap();
        assert_eq!(queue.discard_pending(), 2);
        assert_eq!(queue.backlog(), 0);

        queue.dispatch(b"fresh").unwrap();
        assert_eq!(worker.fetch_timeout(100).unwrap(), b"fresh");
    }
}
