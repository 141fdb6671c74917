// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Task dispatcher: evaluates a generation on remote workers.

Every pending individual becomes one tokio task that encodes a task frame,
hands it to the transport and waits for "result or deadline". A semaphore
bounds how many tasks wait at once. A single pump task polls the transport
for reply frames and routes each one to its waiting task by individual id.

Timeouts are resent until the retry budget is spent; worker-reported failures
and undecodable replies are final. Evaluation returns only once every task is
terminal, or promptly with an abort error when the run is cancelled.
*/

use crate::abort::{aborted, AbortHandle};
use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::task::{DispatchStats, TaskState, TaskTable};
use arbor_evolution::{EvaluationOutcome, EvaluationRequest, Evaluator, EvoResult, IndividualId};
use arbor_serialization::{
    peek_individual_id, AbortMessage, MessageKind, ResultMessage, ResultStatus, TaskMessage,
    WireMessage,
};
use arbor_transports::{TaskQueueServer, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// What the pump hands to a waiting task
#[derive(Debug)]
enum Delivery {
    Result(ResultMessage),
    /// Reply frame for this id that could not be decoded
    Undecodable(String),
}

/// State shared by the tasks of one generation
struct Generation {
    number: u64,
    transport: Arc<dyn TaskQueueServer>,
    config: DispatchConfig,
    table: TaskTable,
    waiters: Mutex<HashMap<IndividualId, oneshot::Sender<Delivery>>>,
    stats: Arc<Mutex<DispatchStats>>,
}

impl Generation {
    fn route(&self, frame: &[u8]) {
        let (id, delivery) = match WireMessage::try_result_from_bytes(frame) {
            Ok(result) => (result.individual_id, Delivery::Result(result)),
            Err(e) => match peek_individual_id(frame, MessageKind::Result) {
                Some(id) => (id, Delivery::Undecodable(e.to_string())),
                None => {
                    warn!(
                        target: "arbor-dispatch",
                        "[DISPATCH] Dropped undecodable reply frame ({} bytes): {}",
                        frame.len(),
                        e
                    );
                    return;
                }
            },
        };

        let waiter = if self.table.is_open(id) {
            self.waiters.lock().remove(&id)
        } else {
            None
        };
        match waiter {
            Some(sender) => {
                if sender.send(delivery).is_err() {
                    debug!(target: "arbor-dispatch", "[DISPATCH] Task {} stopped waiting", id);
                }
            }
            None => {
                self.stats.lock().duplicates += 1;
                debug!(
                    target: "arbor-dispatch",
                    "[DISPATCH] Ignoring result for individual {} (duplicate, late or unknown)",
                    id
                );
            }
        }
    }

    fn complete(&self, id: IndividualId, result: ResultMessage) -> EvaluationOutcome {
        match result.status {
            ResultStatus::Ok if result.fitness.is_finite() => {
                self.table.transition(id, TaskState::Completed(result.fitness));
                self.stats.lock().completed += 1;
                debug!(
                    target: "arbor-dispatch",
                    "[DISPATCH] Individual {} scored {}",
                    id,
                    result.fitness
                );
                EvaluationOutcome::Scored(result.fitness)
            }
            ResultStatus::Ok => self.fail(id, format!("non-finite fitness {}", result.fitness)),
            status => {
                let detail = result.diagnostics.unwrap_or_else(|| "no diagnostics".to_string());
                self.fail(id, format!("{}: {}", status, detail))
            }
        }
    }

    fn fail(&self, id: IndividualId, reason: String) -> EvaluationOutcome {
        self.table.transition(id, TaskState::Failed(reason.clone()));
        self.stats.lock().failed += 1;
        debug!(
            target: "arbor-dispatch",
            "[DISPATCH] Individual {} failed: {}",
            id,
            reason
        );
        EvaluationOutcome::Failed(reason)
    }

    fn broadcast_abort(&self, abort: AbortMessage) {
        if let Err(e) = self.transport.broadcast(&abort.to_bytes()) {
            debug!(target: "arbor-dispatch", "[DISPATCH] Abort notice not delivered: {}", e);
        }
    }
}

/// Poll the transport for replies until cancelled
async fn pump_results(generation: Arc<Generation>) {
    let idle = generation.config.poll_interval();
    loop {
        match generation.transport.collect_timeout(0) {
            Ok(frame) => {
                generation.route(&frame);
                tokio::task::yield_now().await;
            }
            Err(TransportError::Timeout) => tokio::time::sleep(idle).await,
            Err(e) => {
                warn!(target: "arbor-dispatch", "[DISPATCH] Receive failed: {}", e);
                tokio::time::sleep(idle).await;
            }
        }
    }
}

/// Ends a generation when evaluation returns or its future is dropped: stops
/// the reply pump and discards task frames no worker has taken
struct GenerationGuard {
    pump: JoinHandle<()>,
    generation: Arc<Generation>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.pump.abort();
        let stale = self.generation.transport.discard_pending();
        if stale > 0 {
            debug!(
                target: "arbor-dispatch",
                "[DISPATCH] Generation {}: discarded {} untaken task frames",
                self.generation.number,
                stale
            );
        }
    }
}

/// Drive one task through send/await rounds until it is terminal
async fn run_task(
    generation: Arc<Generation>,
    request: EvaluationRequest,
) -> DispatchResult<EvaluationOutcome> {
    let id = request.id;
    let attempts = generation.config.max_retries.saturating_add(1);
    let mut task = TaskMessage {
        individual_id: id,
        ast: request.ast,
        config: generation.config.evaluation_config(generation.number, 0),
    };

    for attempt in 0..attempts {
        task.config.attempt = attempt;
        let frame = match task.to_bytes() {
            Ok(frame) => frame,
            Err(e) => return Ok(generation.fail(id, format!("task could not be encoded: {}", e))),
        };

        // Register before sending so a fast reply cannot be missed
        let (sender, receiver) = oneshot::channel();
        generation.waiters.lock().insert(id, sender);
        generation.table.transition(id, TaskState::Sent { attempt });

        match generation.transport.dispatch(&frame) {
            Ok(()) => generation.stats.lock().sent += 1,
            Err(e) if e.is_transient() => {
                // A failed send spends the attempt like a timeout
                generation.waiters.lock().remove(&id);
                generation.table.transition(id, TaskState::TimedOut { attempt });
                generation.stats.lock().send_errors += 1;
                warn!(
                    target: "arbor-dispatch",
                    "[DISPATCH] Send of individual {} failed (attempt {}/{}): {}",
                    id,
                    attempt + 1,
                    attempts,
                    e
                );
                tokio::time::sleep(generation.config.poll_interval()).await;
                continue;
            }
            Err(e) => {
                generation.waiters.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(generation.config.task_timeout(), receiver).await {
            Ok(Ok(Delivery::Result(result))) => return Ok(generation.complete(id, result)),
            Ok(Ok(Delivery::Undecodable(reason))) => {
                return Ok(generation.fail(id, format!("malformed result: {}", reason)))
            }
            _ => {
                generation.waiters.lock().remove(&id);
                generation.table.transition(id, TaskState::TimedOut { attempt });
                generation.stats.lock().timeouts += 1;
                warn!(
                    target: "arbor-dispatch",
                    "[DISPATCH] Individual {} timed out (attempt {}/{})",
                    id,
                    attempt + 1,
                    attempts
                );
            }
        }
    }

    generation.broadcast_abort(AbortMessage::Individual(id));
    Ok(generation.fail(id, format!("no result after {} attempts", attempts)))
}

/// Coordinator-side evaluator that farms tasks out over a task queue
pub struct TaskDispatcher {
    transport: Arc<dyn TaskQueueServer>,
    config: DispatchConfig,
    abort: AbortHandle,
    stats: Arc<Mutex<DispatchStats>>,
}

impl TaskDispatcher {
    /// `transport` must already be started
    pub fn new(transport: Arc<dyn TaskQueueServer>, config: DispatchConfig) -> DispatchResult<Self> {
        config.validate()?;
        info!(
            target: "arbor-dispatch",
            "🦀 [DISPATCH] Dispatcher ready over {} (timeout={}ms, retries={}, in-flight={})",
            transport.transport_type(),
            config.task_timeout_ms,
            config.max_retries,
            config.max_in_flight
        );
        Ok(Self {
            transport,
            config,
            abort: AbortHandle::new(),
            stats: Arc::new(Mutex::new(DispatchStats::default())),
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Handle that cancels the current and every later evaluation
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.lock()
    }

    /// Evaluate `requests`, returning one terminal outcome per distinct id
    pub async fn evaluate_requests(
        &self,
        generation: u64,
        requests: Vec<EvaluationRequest>,
    ) -> DispatchResult<HashMap<IndividualId, EvaluationOutcome>> {
        let mut abort_rx = self.abort.subscribe();
        if self.abort.is_aborted() {
            return Err(DispatchError::Aborted { generation });
        }

        let mut seen = HashSet::new();
        let requests: Vec<EvaluationRequest> = requests
            .into_iter()
            .filter(|request| seen.insert(request.id))
            .collect();
        if requests.is_empty() {
            return Ok(HashMap::new());
        }

        info!(
            target: "arbor-dispatch",
            "[DISPATCH] Generation {}: dispatching {} tasks to {} workers",
            generation,
            requests.len(),
            self.transport.worker_count()
        );

        let shared = Arc::new(Generation {
            number: generation,
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            table: TaskTable::new(requests.iter().map(|request| request.id)),
            waiters: Mutex::new(HashMap::new()),
            stats: Arc::clone(&self.stats),
        });

        // Torn down on drop, like the task set
        let guard = GenerationGuard {
            pump: tokio::spawn(pump_results(Arc::clone(&shared))),
            generation: Arc::clone(&shared),
        };
        let permits = Arc::new(Semaphore::new(self.config.max_in_flight));
        let mut tasks = JoinSet::new();
        for request in requests {
            let shared = Arc::clone(&shared);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let id = request.id;
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| DispatchError::TaskJoin(e.to_string()))?;
                let outcome = run_task(shared, request).await?;
                Ok::<_, DispatchError>((id, outcome))
            });
        }

        let result = join_tasks(generation, &mut tasks, &mut abort_rx).await;
        drop(guard);

        match &result {
            Ok(outcomes) => debug!(
                target: "arbor-dispatch",
                "[DISPATCH] Generation {} complete: {} outcomes, {} open",
                generation,
                outcomes.len(),
                shared.table.open_count()
            ),
            Err(DispatchError::Aborted { .. }) => {
                warn!(
                    target: "arbor-dispatch",
                    "[DISPATCH] Generation {} aborted with {} tasks open",
                    generation,
                    shared.table.open_count()
                );
                shared.broadcast_abort(AbortMessage::All);
            }
            Err(e) => warn!(
                target: "arbor-dispatch",
                "[DISPATCH] Generation {} failed: {}",
                generation,
                e
            ),
        }
        result
    }
}

async fn join_tasks(
    generation: u64,
    tasks: &mut JoinSet<DispatchResult<(IndividualId, EvaluationOutcome)>>,
    abort_rx: &mut watch::Receiver<bool>,
) -> DispatchResult<HashMap<IndividualId, EvaluationOutcome>> {
    let mut outcomes = HashMap::with_capacity(tasks.len());
    loop {
        tokio::select! {
            biased;
            _ = aborted(abort_rx) => {
                tasks.abort_all();
                return Err(DispatchError::Aborted { generation });
            }
            joined = tasks.join_next() => match joined {
                None => return Ok(outcomes),
                Some(Ok(Ok((id, outcome)))) => {
                    outcomes.insert(id, outcome);
                }
                Some(Ok(Err(e))) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Some(Err(e)) => {
                    tasks.abort_all();
                    return Err(DispatchError::TaskJoin(e.to_string()));
                }
            },
        }
    }
}

#[async_trait]
impl Evaluator for TaskDispatcher {
    async fn evaluate(
        &self,
        generation: u64,
        requests: Vec<EvaluationRequest>,
    ) -> EvoResult<HashMap<IndividualId, EvaluationOutcome>> {
        self.evaluate_requests(generation, requests)
            .await
            .map_err(|e| e.into_evo_error(generation))
    }
}
