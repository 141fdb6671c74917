// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Frame signals of the worker queue protocol
//!
//! Workers and the coordinator tag every transport frame with one signal byte.
//! Payloads are opaque to the transport.

use crate::common::TransportError;

#[repr(u8)]
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum Signal {
    /// Worker is idle and can take a task
    Ready = 0x01,
    /// Worker is alive
    Heartbeat = 0x02,
    /// Coordinator to worker: task payload follows
    Task = 0x04,
    /// Worker to coordinator: reply payload follows; worker is idle again
    Reply = 0x08,
    /// Coordinator to every worker: control payload follows
    Broadcast = 0x0A,
}

impl Signal {
    pub fn as_frame(&self) -> [u8; 1] {
        [*self as u8]
    }
}

impl TryFrom<&[u8]> for Signal {
    type Error = TransportError;
    fn try_from(frame: &[u8]) -> Result<Self, TransportError> {
        match frame {
            [0x01] => Ok(Signal::Ready),
            [0x02] => Ok(Signal::Heartbeat),
            [0x04] => Ok(Signal::Task),
            [0x08] => Ok(Signal::Reply),
            [0x0A] => Ok(Signal::Broadcast),
            other => Err(TransportError::InvalidMessage(format!(
                "Unknown signal frame {:?}",
                other
            ))),
        }
    }
}
