// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run-level cancellation shared between the dispatcher and its callers

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable abort switch; once tripped it stays tripped until [`reset`](Self::reset)
#[derive(Debug, Clone)]
pub struct AbortHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn abort(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.sender.borrow()
    }

    /// Clear the flag so a new run can start
    pub fn reset(&self) {
        self.sender.send_replace(false);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once `receiver` reports an abort (or its handle is gone)
pub async fn aborted(receiver: &mut watch::Receiver<bool>) {
    loop {
        if *receiver.borrow_and_update() {
            return;
        }
        if receiver.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_abort_wakes_subscribers() {
        let handle = AbortHandle::new();
        let mut receiver = handle.subscribe();
        let remote = handle.clone();
        let waiter = tokio::spawn(async move {
            aborted(&mut receiver).await;
        });
        assert!(!handle.is_aborted());
        remote.abort();
        waiter.await.unwrap();
        assert!(handle.is_aborted());

        handle.reset();
        assert!(!remote.is_aborted());
    }
}
