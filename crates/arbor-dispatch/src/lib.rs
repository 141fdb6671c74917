// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Arbor Task Dispatcher

Coordinator half of distributed evaluation. [`TaskDispatcher`] implements
[`arbor_evolution::Evaluator`] on top of any
[`TaskQueueServer`](arbor_transports::TaskQueueServer): it encodes each
pending individual as a task frame, enforces per-task deadlines and a retry
budget, bounds the number of tasks in flight, suppresses duplicate results and
supports run-level cancellation through an [`AbortHandle`].

```text
Pending -> Sent -> Completed | TimedOut (resend) | Failed
```
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod abort;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod task;

pub use abort::AbortHandle;
pub use config::DispatchConfig;
pub use dispatcher::TaskDispatcher;
pub use error::{DispatchError, DispatchResult};
pub use task::{DispatchStats, TaskState, TaskTable};
