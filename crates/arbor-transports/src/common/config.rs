// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common configuration types for transports

use crate::common::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generic transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Address to bind (server) or connect (client)
    pub address: String,

    /// High water mark for send buffer (0 = unlimited)
    pub send_hwm: usize,

    /// High water mark for receive buffer (0 = unlimited)
    pub recv_hwm: usize,

    /// Linger time on close (None = immediate)
    pub linger: Option<Duration>,

    /// Maximum message size (None = unlimited)
    pub max_message_size: Option<usize>,

    /// How often an idle worker announces itself
    pub heartbeat_interval: Duration,

    /// Missed heartbeats before a worker is considered dead
    pub heartbeat_liveness: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: "tcp://127.0.0.1:5557".to_string(),
            send_hwm: 1000,
            recv_hwm: 1000,
            linger: Some(Duration::from_millis(1000)),
            max_message_size: Some(16 * 1024 * 1024), // 16 MB default
            heartbeat_interval: Duration::from_millis(1000),
            heartbeat_liveness: 10,
        }
    }
}

impl TransportConfig {
    /// Create a new config with the given address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set send high water mark
    pub fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Set receive high water mark
    pub fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm;
        self
    }

    /// Set linger time
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = Some(linger);
        self
    }

    /// Set no linger (immediate close)
    pub fn with_no_linger(mut self) -> Self {
        self.linger = None;
        self
    }

    /// Set maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = Some(size);
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration, liveness: u32) -> Self {
        self.heartbeat_interval = interval;
        self.heartbeat_liveness = liveness;
        self
    }

    /// Silence after which a worker is dropped from the ready queue
    pub fn worker_expiry(&self) -> Duration {
        self.heartbeat_interval * self.heartbeat_liveness
    }

    /// Reject a payload larger than the configured maximum
    pub fn check_message_size(&self, size: usize) -> TransportResult<()> {
        match self.max_message_size {
            Some(max_size) if size > max_size => {
                Err(TransportError::MessageTooLarge { size, max_size })
            }
            _ => Ok(()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> TransportResult<()> {
        if self.address.is_empty() {
            return Err(TransportError::InvalidConfig(
                "Address cannot be empty".to_string(),
            ));
        }

        if let Some(max_size) = self.max_message_size {
            if max_size == 0 {
                return Err(TransportError::InvalidConfig(
                    "Maximum message size must be greater than 0".to_string(),
                ));
            }
        }

        if self.heartbeat_interval.is_zero() || self.heartbeat_liveness == 0 {
            return Err(TransportError::InvalidConfig(
                "Heartbeat interval and liveness must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Server-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base transport config
    #[serde(flatten)]
    pub base: TransportConfig,

    /// Tasks held while no worker is ready (0 = unlimited)
    pub max_pending: usize,
}

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            base: TransportConfig::new(address),
            ..Default::default()
        }
    }
}

/// Client-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base transport config
    #[serde(flatten)]
    pub base: TransportConfig,

    /// Socket identity announced to the server (None = assigned by the server)
    pub identity: Option<String>,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            base: TransportConfig::new(address),
            ..Default::default()
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(TransportConfig::default().validate().is_ok());
        assert!(TransportConfig::new("").validate().is_err());
        assert!(TransportConfig::default()
            .with_max_message_size(0)
            .validate()
            .is_err());
        assert!(TransportConfig::default()
            .with_heartbeat(Duration::from_millis(100), 0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_worker_expiry() {
        let config = TransportConfig::default().with_heartbeat(Duration::from_millis(250), 4);
        assert_eq!(config.worker_expiry(), Duration::from_secs(1));
    }

    #[test]
    fn test_message_size() {
        let config = TransportConfig::default().with_max_message_size(8);
        assert!(config.check_message_size(8).is_ok());
        assert!(matches!(
            config.check_message_size(9),
            Err(TransportError::MessageTooLarge { size: 9, max_size: 8 })
        ));
    }
}
