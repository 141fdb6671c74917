// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ DEALER task queue (worker side)
//!
//! Connects to a [`ZmqTaskRouter`](crate::zmq::server::ZmqTaskRouter), announces
//! READY on start, and from then on receives one task at a time. Sending a reply
//! makes the worker eligible for the next task.

use crate::common::{ClientConfig, Signal, TransportError, TransportResult};
use crate::traits::{TaskQueueClient, Transport};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// ZMQ DEALER socket implementation of [`TaskQueueClient`]
pub struct ZmqTaskDealer {
    context: Arc<zmq::Context>,
    config: ClientConfig,
    socket: Arc<Mutex<Option<zmq::Socket>>>,
    running: Arc<Mutex<bool>>,
}

impl ZmqTaskDealer {
    /// Create a new DEALER socket
    pub fn new(context: Arc<zmq::Context>, config: ClientConfig) -> TransportResult<Self> {
        config.base.validate()?;

        Ok(Self {
            context,
            config,
            socket: Arc::new(Mutex::new(None)),
            running: Arc::new(Mutex::new(false)),
        })
    }

    /// Create with default context
    pub fn with_address(address: impl Into<String>) -> TransportResult<Self> {
        Self::with_config(ClientConfig::new(address))
    }

    /// Create with a private context
    pub fn with_config(config: ClientConfig) -> TransportResult<Self> {
        Self::new(Arc::new(zmq::Context::new()), config)
    }

    fn send_signal(&self, signal: Signal, payload: Option<&[u8]>) -> TransportResult<()> {
        let sock_guard = self.socket.lock();
        let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;

        // [delimiter, signal, payload?]
        let result = match payload {
            Some(data) => sock
                .send(&Vec::<u8>::new(), zmq::SNDMORE)
                .and_then(|_| sock.send(&signal.as_frame()[..], zmq::SNDMORE))
                .and_then(|_| sock.send(data, 0)),
            None => sock
                .send(&Vec::<u8>::new(), zmq::SNDMORE)
                .and_then(|_| sock.send(&signal.as_frame()[..], 0)),
        };
        result.map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

impl Transport for ZmqTaskDealer {
    fn start(&mut self) -> TransportResult<()> {
        if *self.running.lock() {
            return Err(TransportError::AlreadyRunning);
        }

        // Create DEALER socket
        let socket = self.context.socket(zmq::DEALER)?;

        // Set socket options
        if let Some(linger) = self.config.base.linger {
            socket.set_linger(linger.as_millis() as i32)?;
        } else {
            socket.set_linger(0)?;
        }

        socket.set_rcvhwm(self.config.base.recv_hwm as i32)?;
        socket.set_sndhwm(self.config.base.send_hwm as i32)?;

        if let Some(identity) = &self.config.identity {
            socket.set_identity(identity.as_bytes())?;
        }

        // Connect socket
        socket
            .connect(&self.config.base.address)
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        *self.socket.lock() = Some(socket);
        *self.running.lock() = true;

        info!("🦀 [ZMQ-DEALER] Connected to {}", self.config.base.address);

        self.send_signal(Signal::Ready, None)
    }

    fn stop(&mut self) -> TransportResult<()> {
        *self.running.lock() = false;
        *self.socket.lock() = None;
        Ok(())
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn transport_type(&self) -> &str {
        "zmq-dealer"
    }
}

impl TaskQueueClient for ZmqTaskDealer {
    fn fetch_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        let sock_guard = self.socket.lock();
        let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;

        let poll_items = &mut [sock.as_poll_item(zmq::POLLIN)];
        zmq::poll(poll_items, timeout_ms as i64)?;

        if !poll_items[0].is_readable() {
            return Err(TransportError::Timeout);
        }

        // Receive multipart message: [delimiter, signal, payload]
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

        match Signal::try_from(msg_parts[1].as_slice())? {
            Signal::Task | Signal::Broadcast => Ok(msg_parts.swap_remove(2)),
            other => Err(TransportError::InvalidMessage(format!(
                "Unexpected signal {:?} from coordinator",
                other
            ))),
        }
    }

    fn reply(&self, payload: &[u8]) -> TransportResult<()> {
        self.config.base.check_message_size(payload.len())?;
        self.send_signal(Signal::Reply, Some(payload))
    }

    fn heartbeat(&self) -> TransportResult<()> {
        debug!("[ZMQ-DEALER] Heartbeat");
        self.send_signal(Signal::Heartbeat, None)
    }
}
