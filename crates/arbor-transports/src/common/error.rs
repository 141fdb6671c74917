// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Errors shared by every task-queue backend

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot bind task queue: {0}")]
    BindFailed(String),

    #[error("cannot reach coordinator: {0}")]
    ConnectFailed(String),

    /// Frame was not handed to the peer; the caller may resend
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Nothing arrived within the poll window
    #[error("timed out")]
    Timeout,

    /// Peer side of the queue is gone
    #[error("connection closed")]
    ConnectionClosed,

    #[error("transport is not running")]
    NotRunning,

    #[error("transport is already running")]
    AlreadyRunning,

    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    #[error("frame of {size} bytes exceeds limit of {max_size}")]
    MessageTooLarge { size: usize, max_size: usize },

    /// Unexpected frame layout or signal byte
    #[error("invalid frame: {0}")]
    InvalidMessage(String),

    #[cfg(any(feature = "zmq-server", feature = "zmq-client"))]
    #[error("zmq: {0}")]
    Zmq(#[source] zmq::Error),
}

impl TransportError {
    /// Errors worth retrying on the same transport
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SendFailed(_) | Self::Timeout)
    }
}

#[cfg(any(feature = "zmq-server", feature = "zmq-client"))]
impl From<zmq::Error> for TransportError {
    fn from(err: zmq::Error) -> Self {
        match err {
            zmq::Error::EAGAIN => Self::Timeout,
            _ => Self::Zmq(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::SendFailed("hwm".into()).is_transient());
        assert!(!TransportError::NotRunning.is_transient());
        assert!(!TransportError::ConnectionClosed.is_transient());
    }

    #[test]
    fn test_display() {
        let err = TransportError::MessageTooLarge {
            size: 20,
            max_size: 10,
        };
        assert_eq!(err.to_string(), "frame of 20 bytes exceeds limit of 10");
    }
}
