// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Per-task state machine.

```text
Pending -> Sent -> Completed
             |  -> Failed
             '-> TimedOut -> Sent (while retries remain)
                          -> Failed (retries exhausted)
```

`Completed` and `Failed` are terminal; any later transition is rejected, which
makes duplicate result delivery a no-op.
*/

use arbor_evolution::IndividualId;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    /// `attempt` is zero-based
    Sent { attempt: u32 },
    TimedOut { attempt: u32 },
    Completed(f64),
    Failed(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed(_) | TaskState::Failed(_))
    }

    fn accepts(&self, next: &TaskState) -> bool {
        match (self, next) {
            (TaskState::Pending, TaskState::Sent { .. }) => true,
            (TaskState::Pending, TaskState::Failed(_)) => true,
            (TaskState::Sent { .. }, TaskState::Completed(_)) => true,
            (TaskState::Sent { .. }, TaskState::Failed(_)) => true,
            (TaskState::Sent { .. }, TaskState::TimedOut { .. }) => true,
            (TaskState::TimedOut { .. }, TaskState::Sent { .. }) => true,
            (TaskState::TimedOut { .. }, TaskState::Failed(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Sent { attempt } => write!(f, "sent (attempt {})", attempt + 1),
            TaskState::TimedOut { attempt } => write!(f, "timed out (attempt {})", attempt + 1),
            TaskState::Completed(fitness) => write!(f, "completed ({})", fitness),
            TaskState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Cumulative dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Task frames handed to the transport
    pub sent: u64,
    pub completed: u64,
    pub failed: u64,
    /// Sends that ran past their deadline
    pub timeouts: u64,
    /// Transport send errors retried within the budget
    pub send_errors: u64,
    /// Results for tasks that were already terminal or unknown
    pub duplicates: u64,
}

/// States of every task of the generation being evaluated
#[derive(Debug, Default)]
pub struct TaskTable {
    states: Mutex<HashMap<IndividualId, TaskState>>,
}

impl TaskTable {
    pub fn new(ids: impl IntoIterator<Item = IndividualId>) -> Self {
        Self {
            states: Mutex::new(ids.into_iter().map(|id| (id, TaskState::Pending)).collect()),
        }
    }

    /// Apply a transition; returns false (and changes nothing) if it is illegal
    pub fn transition(&self, id: IndividualId, next: TaskState) -> bool {
        let mut states = self.states.lock();
        match states.get_mut(&id) {
            Some(current) if current.accepts(&next) => {
                *current = next;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, id: IndividualId) -> Option<TaskState> {
        self.states.lock().get(&id).cloned()
    }

    /// Known task that has not reached a terminal state
    pub fn is_open(&self, id: IndividualId) -> bool {
        self.states
            .lock()
            .get(&id)
            .map(|state| !state.is_terminal())
            .unwrap_or(false)
    }

    pub fn open_count(&self) -> usize {
        self.states
            .lock()
            .values()
            .filter(|state| !state.is_terminal())
            .count()
    }
}
