// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Worker loop.

Fetches frames from a task-queue client, executes tasks on a [`Runtime`] and
replies with encoded results. The worker keeps no state between tasks beyond
the set of individuals the coordinator has given up on. Idle workers send
heartbeats so the coordinator keeps them in its ready queue.
*/

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::runtime::{ExecutionBudget, ExecutionFailure, Runtime};
use arbor_serialization::{
    peek_individual_id, AbortMessage, MessageKind, ResultMessage, ResultStatus, TaskMessage,
    WireMessage,
};
use arbor_transports::{TaskQueueClient, TransportError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Abandoned ids remembered before the set is cleared
const MAX_ABANDONED: usize = 4096;

/// Counters for one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub tasks: u64,
    pub succeeded: u64,
    pub runtime_errors: u64,
    pub malformed: u64,
    /// Tasks skipped because the coordinator abandoned them
    pub skipped: u64,
    pub heartbeats: u64,
}

pub struct Worker<C, R> {
    client: C,
    runtime: R,
    config: WorkerConfig,
    stop: Arc<AtomicBool>,
    abandoned: HashSet<u64>,
    stats: WorkerStats,
}

impl<C, R> Worker<C, R>
where
    C: TaskQueueClient,
    R: Runtime,
{
    /// `client` must already be started
    pub fn new(client: C, runtime: R, config: WorkerConfig) -> WorkerResult<Self> {
        config.validate()?;
        Ok(Self {
            client,
            runtime,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            abandoned: HashSet::new(),
            stats: WorkerStats::default(),
        })
    }

    /// Flag that ends [`run`](Self::run) at the next poll
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Serve until stopped or the coordinator goes away
    pub fn run(&mut self) -> WorkerResult<WorkerStats> {
        info!(
            target: "arbor-worker",
            "🦀 [WORKER] Serving tasks over {}",
            self.client.transport_type()
        );
        let mut last_heartbeat = Instant::now();

        while !self.stop.load(Ordering::Relaxed) {
            match self.client.fetch_timeout(self.config.poll_timeout_ms) {
                Ok(frame) => {
                    if let Some(reply) = self.handle_frame(&frame) {
                        match self.client.reply(&reply) {
                            Ok(()) => {}
                            Err(TransportError::ConnectionClosed) => break,
                            Err(e) => return Err(e.into()),
                        }
                    }
                    last_heartbeat = Instant::now();
                }
                Err(TransportError::Timeout) => {
                    if last_heartbeat.elapsed() >= self.config.heartbeat_interval() {
                        self.client.heartbeat()?;
                        self.stats.heartbeats += 1;
                        last_heartbeat = Instant::now();
                    }
                }
                Err(TransportError::ConnectionClosed) => break,
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            target: "arbor-worker",
            "🦀 [WORKER] Stopped after {} tasks ({} ok, {} failed, {} malformed)",
            self.stats.tasks,
            self.stats.succeeded,
            self.stats.runtime_errors,
            self.stats.malformed
        );
        Ok(self.stats)
    }

    /// Process one inbound frame, returning the reply to send if any
    pub fn handle_frame(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        match WireMessage::try_from_bytes(frame) {
            Ok(WireMessage::Task(task)) => {
                self.stats.tasks += 1;
                if self.abandoned.remove(&task.individual_id) {
                    self.stats.skipped += 1;
                    debug!(
                        target: "arbor-worker",
                        "[WORKER] Skipping abandoned individual {}",
                        task.individual_id
                    );
                    return None;
                }
                Some(self.evaluate(&task).to_bytes())
            }
            Ok(WireMessage::Abort(abort)) => {
                self.handle_abort(abort);
                None
            }
            Ok(WireMessage::Result(result)) => {
                warn!(
                    target: "arbor-worker",
                    "[WORKER] Ignoring result frame for individual {}",
                    result.individual_id
                );
                None
            }
            Err(e) => match peek_individual_id(frame, MessageKind::Task) {
                Some(id) => {
                    self.stats.tasks += 1;
                    self.stats.malformed += 1;
                    warn!(
                        target: "arbor-worker",
                        "[WORKER] Malformed task for individual {}: {}",
                        id,
                        e
                    );
                    Some(ResultMessage::failure(id, ResultStatus::Malformed, e.to_string()).to_bytes())
                }
                None => {
                    warn!(target: "arbor-worker", "[WORKER] Dropped undecodable frame: {}", e);
                    None
                }
            },
        }
    }

    fn handle_abort(&mut self, abort: AbortMessage) {
        match abort {
            AbortMessage::Individual(id) => {
                if self.abandoned.len() >= MAX_ABANDONED {
                    self.abandoned.clear();
                }
                self.abandoned.insert(id);
                debug!(target: "arbor-worker", "[WORKER] Coordinator abandoned individual {}", id);
            }
            AbortMessage::All => {
                // Nothing runs between frames, so there is nothing to cancel
                self.abandoned.clear();
                info!(target: "arbor-worker", "[WORKER] Coordinator aborted the run");
            }
        }
    }

    /// Execute `repeats` times and average; any failing repeat fails the task
    fn evaluate(&mut self, task: &TaskMessage) -> ResultMessage {
        let id = task.individual_id;
        let budget = ExecutionBudget {
            time_budget: Duration::from_millis(task.config.time_budget_ms),
            max_steps: task.config.max_steps,
        };
        let repeats = task.config.repeats.max(1);

        let mut total = 0.0;
        for _ in 0..repeats {
            match self.execute_once(task, &budget) {
                Ok(fitness) => total += fitness,
                Err(reason) => {
                    self.stats.runtime_errors += 1;
                    debug!(
                        target: "arbor-worker",
                        "[WORKER] Individual {} failed: {}",
                        id,
                        reason
                    );
                    return ResultMessage::failure(id, ResultStatus::RuntimeError, reason);
                }
            }
        }

        self.stats.succeeded += 1;
        let fitness = total / repeats as f64;
        debug!(
            target: "arbor-worker",
            "[WORKER] Individual {} (generation {}, attempt {}) scored {}",
            id,
            task.config.generation,
            task.config.attempt,
            fitness
        );
        ResultMessage::ok(id, fitness)
    }

    fn execute_once(&self, task: &TaskMessage, budget: &ExecutionBudget) -> Result<f64, String> {
        let started = Instant::now();
        let measurements = self
            .runtime
            .execute(&task.ast, budget)
            .map_err(|failure| failure.to_string())?;

        let elapsed = started.elapsed();
        if !budget.time_budget.is_zero() && elapsed > budget.time_budget {
            return Err(ExecutionFailure::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: budget.time_budget.as_millis() as u64,
            }
            .to_string());
        }

        self.config.fitness.aggregate(&measurements, &task.ast)
    }
}
