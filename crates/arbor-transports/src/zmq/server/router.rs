// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ ROUTER task queue (coordinator side)
//!
//! Workers connect with DEALER sockets and announce themselves with a READY
//! signal. The router keeps idle workers in least-recently-used order and hands
//! each task to the worker that has been idle longest. Tasks submitted while no
//! worker is idle are cached and flushed as soon as one reports READY or
//! returns a REPLY. Workers that stay silent for longer than
//! `heartbeat_interval * heartbeat_liveness` are purged.
//!
//! Frames: coordinator to worker `[identity, "", signal, payload]`,
//! worker to coordinator `["", signal, payload?]` (identity added by ZMQ).

use crate::common::{ServerConfig, Signal, TransportError, TransportResult};
use crate::traits::{TaskQueueServer, Transport};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Poll slice while collecting; the socket lock is released between slices
const COLLECT_SLICE_MS: u64 = 10;

#[derive(Default)]
struct RouterState {
    /// Idle workers, longest idle first
    ready: VecDeque<Vec<u8>>,
    /// Last time each known worker was heard from
    last_seen: HashMap<Vec<u8>, Instant>,
    /// Tasks waiting for an idle worker
    pending: VecDeque<Vec<u8>>,
}

impl RouterState {
    fn touch(&mut self, identity: &[u8]) {
        self.last_seen.insert(identity.to_vec(), Instant::now());
    }

    fn mark_ready(&mut self, identity: &[u8]) {
        self.touch(identity);
        if !self.ready.iter().any(|w| w.as_slice() == identity) {
            self.ready.push_back(identity.to_vec());
        }
    }

    fn purge_expired(&mut self, expiry: Duration) {
        let now = Instant::now();
        let before = self.last_seen.len();
        self.last_seen
            .retain(|_, seen| now.duration_since(*seen) <= expiry);
        if self.last_seen.len() != before {
            warn!(
                "[ZMQ-ROUTER] Purged {} silent workers",
                before - self.last_seen.len()
            );
            let last_seen = &self.last_seen;
            self.ready.retain(|w| last_seen.contains_key(w));
        }
    }
}

/// ZMQ ROUTER socket implementation of [`TaskQueueServer`]
pub struct ZmqTaskRouter {
    context: Arc<zmq::Context>,
    config: ServerConfig,
    socket: Arc<Mutex<Option<zmq::Socket>>>,
    state: Mutex<RouterState>,
    running: Arc<Mutex<bool>>,
}

impl ZmqTaskRouter {
    /// Create a new ROUTER socket
    pub fn new(context: Arc<zmq::Context>, config: ServerConfig) -> TransportResult<Self> {
        config.base.validate()?;

        Ok(Self {
            context,
            config,
            socket: Arc::new(Mutex::new(None)),
            state: Mutex::new(RouterState::default()),
            running: Arc::new(Mutex::new(false)),
        })
    }

    /// Create with default context
    pub fn with_address(address: impl Into<String>) -> TransportResult<Self> {
        Self::with_config(ServerConfig::new(address))
    }

    /// Create with a private context
    pub fn with_config(config: ServerConfig) -> TransportResult<Self> {
        Self::new(Arc::new(zmq::Context::new()), config)
    }

    /// Tasks cached while no worker is idle
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn send_to(
        sock: &zmq::Socket,
        identity: &[u8],
        signal: Signal,
        payload: &[u8],
    ) -> TransportResult<()> {
        sock.send(identity, zmq::SNDMORE)
            .and_then(|_| sock.send(&Vec::<u8>::new(), zmq::SNDMORE))
            .and_then(|_| sock.send(&signal.as_frame()[..], zmq::SNDMORE))
            .and_then(|_| sock.send(payload, 0))
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Hand cached tasks to idle workers
    fn flush_pending(sock: &zmq::Socket, state: &mut RouterState) -> TransportResult<()> {
        while !state.pending.is_empty() {
            let Some(worker) = state.ready.pop_front() else {
                break;
            };
            if let Some(task) = state.pending.pop_front() {
                if let Err(e) = Self::send_to(sock, &worker, Signal::Task, &task) {
                    state.pending.push_front(task);
                    return Err(e);
                }
                debug!("[ZMQ-ROUTER] Flushed cached task to worker");
            }
        }
        Ok(())
    }

    /// Read one inbound message; returns a reply payload if it was one
    fn handle_inbound(
        sock: &zmq::Socket,
        state: &mut RouterState,
    ) -> TransportResult<Option<Vec<u8>>> {
        // Receive multipart message: [identity, delimiter, signal, payload?]
        let mut msg_parts = Vec::new();
        let mut more = true;

        while more {
            let mut msg = zmq::Message::new();
            sock.recv(&mut msg, 0)?;
            msg_parts.push(msg.to_vec());
            more = sock.get_rcvmore()?;
        }

        if msg_parts.len() < 3 {
            return Err(TransportError::InvalidMessage(format!(
                "Expected at least 3 parts, got {}",
                msg_parts.len()
            )));
        }

        let identity = &msg_parts[0];
        match Signal::try_from(msg_parts[2].as_slice())? {
            Signal::Ready => {
                debug!("[ZMQ-ROUTER] Worker ready");
                state.mark_ready(identity);
                Self::flush_pending(sock, state)?;
                Ok(None)
            }
            Signal::Heartbeat => {
                state.touch(identity);
                Ok(None)
            }
            Signal::Reply => {
                let payload = msg_parts.get(3).cloned().unwrap_or_default();
                state.mark_ready(identity);
                if let Err(e) = Self::flush_pending(sock, state) {
                    warn!("[ZMQ-ROUTER] Could not flush cached tasks: {}", e);
                }
                Ok(Some(payload))
            }
            other => Err(TransportError::InvalidMessage(format!(
                "Unexpected signal {:?} from worker",
                other
            ))),
        }
    }
}

impl Transport for ZmqTaskRouter {
    fn start(&mut self) -> TransportResult<()> {
        if *self.running.lock() {
            return Err(TransportError::AlreadyRunning);
        }

        // Create ROUTER socket
        let socket = self.context.socket(zmq::ROUTER)?;

        // Set socket options
        if let Some(linger) = self.config.base.linger {
            socket.set_linger(linger.as_millis() as i32)?;
        } else {
            socket.set_linger(0)?;
        }

        socket.set_router_mandatory(false)?;
        socket.set_rcvhwm(self.config.base.recv_hwm as i32)?;
        socket.set_sndhwm(self.config.base.send_hwm as i32)?;

        // Bind socket
        socket
            .bind(&self.config.base.address)
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        *self.socket.lock() = Some(socket);
        *self.running.lock() = true;

        info!("🦀 [ZMQ-ROUTER] Listening on {}", self.config.base.address);

        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        *self.running.lock() = false;
        *self.socket.lock() = None;
        *self.state.lock() = RouterState::default();
        Ok(())
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn transport_type(&self) -> &str {
        "zmq-router"
    }
}

impl TaskQueueServer for ZmqTaskRouter {
    fn dispatch(&self, payload: &[u8]) -> TransportResult<()> {
        self.config.base.check_message_size(payload.len())?;

        let sock_guard = self.socket.lock();
        let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;
        let mut state = self.state.lock();
        state.purge_expired(self.config.base.worker_expiry());

        match state.ready.pop_front() {
            Some(worker) => {
                if let Err(e) = Self::send_to(sock, &worker, Signal::Task, payload) {
                    state.ready.push_front(worker);
                    return Err(e);
                }
                Ok(())
            }
            None => {
                if self.config.max_pending > 0 && state.pending.len() >= self.config.max_pending {
                    return Err(TransportError::SendFailed(format!(
                        "{} tasks already waiting for a worker",
                        state.pending.len()
                    )));
                }
                state.pending.push_back(payload.to_vec());
                debug!(
                    "[ZMQ-ROUTER] No idle worker, cached task ({} pending)",
                    state.pending.len()
                );
                Ok(())
            }
        }
    }

    fn collect_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            {
                let sock_guard = self.socket.lock();
                let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;

                let remaining = deadline.saturating_duration_since(Instant::now());
                let slice = (remaining.as_millis() as u64).min(COLLECT_SLICE_MS);
                let poll_items = &mut [sock.as_poll_item(zmq::POLLIN)];
                zmq::poll(poll_items, slice as i64)?;

                if poll_items[0].is_readable() {
                    let mut state = self.state.lock();
                    match Self::handle_inbound(sock, &mut state) {
                        Ok(Some(reply)) => return Ok(reply),
                        Ok(None) => {}
                        Err(TransportError::InvalidMessage(msg)) => {
                            warn!("[ZMQ-ROUTER] Dropped frame: {}", msg);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(TransportError::Timeout);
            }
        }
    }

    fn broadcast(&self, payload: &[u8]) -> TransportResult<usize> {
        let sock_guard = self.socket.lock();
        let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;
        let mut state = self.state.lock();
        state.purge_expired(self.config.base.worker_expiry());

        let mut delivered = 0;
        for identity in state.last_seen.keys() {
            match Self::send_to(sock, identity, Signal::Broadcast, payload) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("[ZMQ-ROUTER] Broadcast to worker failed: {}", e),
            }
        }
        Ok(delivered)
    }

    fn worker_count(&self) -> usize {
        let mut state = self.state.lock();
        state.purge_expired(self.config.base.worker_expiry());
        state.last_seen.len()
    }

    fn discard_pending(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        if dropped > 0 {
            debug!("[ZMQ-ROUTER] Discarded {} cached tasks", dropped);
        }
        dropped
    }
}
