// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dispatcher behavior against a scripted in-process transport

use arbor_ast::Node;
use arbor_dispatch::*;
use arbor_evolution::{EvaluationOutcome, EvaluationRequest, Evaluator, EvoError};
use arbor_serialization::{AbortMessage, ResultMessage, ResultStatus, TaskMessage, WireMessage};
use arbor_transports::{TaskQueueServer, Transport, TransportError, TransportResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

type Responder = Box<dyn Fn(&TaskMessage) -> Vec<Vec<u8>> + Send + Sync>;
type Latency = Box<dyn Fn(&TaskMessage) -> Duration + Send + Sync>;

/// Transport that answers each task through a responder closure, releasing
/// the replies once the task's latency has elapsed
struct ScriptedTransport {
    responder: Responder,
    latency: Latency,
    replies: Mutex<VecDeque<(Instant, Vec<u8>)>>,
    sent: Mutex<Vec<TaskMessage>>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
    /// Number of upcoming dispatch calls that fail with a transient error
    failing_sends: Mutex<usize>,
    discards: Mutex<usize>,
}

impl ScriptedTransport {
    fn new(responder: impl Fn(&TaskMessage) -> Vec<Vec<u8>> + Send + Sync + 'static) -> Arc<Self> {
        Self::delayed(responder, |_| Duration::ZERO)
    }

    fn delayed(
        responder: impl Fn(&TaskMessage) -> Vec<Vec<u8>> + Send + Sync + 'static,
        latency: impl Fn(&TaskMessage) -> Duration + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            latency: Box::new(latency),
            replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
            failing_sends: Mutex::new(0),
            discards: Mutex::new(0),
        })
    }

    fn silent() -> Arc<Self> {
        Self::new(|_| Vec::new())
    }

    fn sends_for(&self, id: u64) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|task| task.individual_id == id)
            .count()
    }

    fn total_sends(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn start(&mut self) -> TransportResult<()> {
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        true
    }

    fn transport_type(&self) -> &str {
        "scripted"
    }
}

impl TaskQueueServer for ScriptedTransport {
    fn dispatch(&self, payload: &[u8]) -> TransportResult<()> {
        {
            let mut failing = self.failing_sends.lock();
            if *failing > 0 {
                *failing -= 1;
                return Err(TransportError::SendFailed("queue full".to_string()));
            }
        }
        let task = match WireMessage::try_from_bytes(payload) {
            Ok(WireMessage::Task(task)) => task,
            other => panic!("dispatcher sent a non-task frame: {:?}", other),
        };
        let ready_at = Instant::now() + (self.latency)(&task);
        let replies = (self.responder)(&task);
        self.replies
            .lock()
            .extend(replies.into_iter().map(|frame| (ready_at, frame)));
        self.sent.lock().push(task);
        Ok(())
    }

    fn collect_timeout(&self, _timeout_ms: u64) -> TransportResult<Vec<u8>> {
        let mut replies = self.replies.lock();
        let now = Instant::now();
        let ready = replies
            .iter()
            .position(|(ready_at, _)| *ready_at <= now)
            .ok_or(TransportError::Timeout)?;
        replies
            .remove(ready)
            .map(|(_, frame)| frame)
            .ok_or(TransportError::Timeout)
    }

    fn broadcast(&self, payload: &[u8]) -> TransportResult<usize> {
        self.broadcasts.lock().push(payload.to_vec());
        Ok(1)
    }

    fn worker_count(&self) -> usize {
        1
    }

    fn discard_pending(&self) -> usize {
        *self.discards.lock() += 1;
        0
    }
}

fn requests(ids: &[u64]) -> Vec<EvaluationRequest> {
    ids.iter()
        .map(|&id| EvaluationRequest {
            id,
            ast: Node::int(id as i64),
        })
        .collect()
}

fn dispatcher(transport: Arc<ScriptedTransport>, config: DispatchConfig) -> TaskDispatcher {
    TaskDispatcher::new(transport, config).unwrap()
}

fn echo_fitness(task: &TaskMessage) -> Vec<Vec<u8>> {
    vec![ResultMessage::ok(task.individual_id, task.individual_id as f64 / 10.0).to_bytes()]
}

#[tokio::test(start_paused = true)]
async fn test_all_tasks_complete() {
    let transport = ScriptedTransport::new(echo_fitness);
    let dispatcher = dispatcher(transport.clone(), DispatchConfig::default());

    let outcomes = dispatcher
        .evaluate_requests(0, requests(&[1, 2, 3, 4]))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[&3], EvaluationOutcome::Scored(0.3));
    assert_eq!(transport.total_sends(), 4);
    assert_eq!(dispatcher.stats().completed, 4);
    assert_eq!(*transport.discards.lock(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_silent_worker_exhausts_retries() {
    let transport = ScriptedTransport::silent();
    let config = DispatchConfig::default()
        .with_timeout_ms(1000)
        .with_max_retries(2);
    let dispatcher = dispatcher(transport.clone(), config);

    let outcomes = dispatcher.evaluate_requests(0, requests(&[9])).await.unwrap();

    assert_eq!(transport.sends_for(9), 3);
    assert!(matches!(outcomes[&9], EvaluationOutcome::Failed(_)));
    let attempts: Vec<u32> = transport.sent.lock().iter().map(|t| t.config.attempt).collect();
    assert_eq!(attempts, vec![0, 1, 2]);
    assert_eq!(dispatcher.stats().timeouts, 3);

    // The coordinator gives up on the task and tells the workers so
    let notices = transport.broadcasts.lock();
    assert_eq!(
        WireMessage::try_from_bytes(&notices[0]).unwrap(),
        WireMessage::Abort(AbortMessage::Individual(9))
    );
}

#[tokio::test(start_paused = true)]
async fn test_bad_version_fails_only_that_task() {
    let transport = ScriptedTransport::new(|task| {
        let mut frame = ResultMessage::ok(task.individual_id, 1.0).to_bytes();
        if task.individual_id == 2 {
            frame[0] = 99;
        }
        vec![frame]
    });
    let dispatcher = dispatcher(transport.clone(), DispatchConfig::default());

    let outcomes = dispatcher
        .evaluate_requests(0, requests(&[1, 2, 3]))
        .await
        .unwrap();

    match &outcomes[&2] {
        EvaluationOutcome::Failed(reason) => assert!(reason.contains("malformed result")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(outcomes[&1], EvaluationOutcome::Scored(1.0));
    assert_eq!(outcomes[&3], EvaluationOutcome::Scored(1.0));
    // Not retried
    assert_eq!(transport.sends_for(2), 1);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_error_is_not_retried() {
    let transport = ScriptedTransport::new(|task| {
        vec![ResultMessage::failure(task.individual_id, ResultStatus::RuntimeError, "division by zero").to_bytes()]
    });
    let dispatcher = dispatcher(transport.clone(), DispatchConfig::default());

    let outcomes = dispatcher.evaluate_requests(0, requests(&[5])).await.unwrap();
    match &outcomes[&5] {
        EvaluationOutcome::Failed(reason) => assert!(reason.contains("division by zero")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(transport.sends_for(5), 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_finite_fitness_fails() {
    let transport = ScriptedTransport::new(|task| {
        vec![ResultMessage::ok(task.individual_id, f64::INFINITY).to_bytes()]
    });
    let dispatcher = dispatcher(transport, DispatchConfig::default());
    let outcomes = dispatcher.evaluate_requests(0, requests(&[1])).await.unwrap();
    assert!(matches!(outcomes[&1], EvaluationOutcome::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_results_are_ignored() {
    let transport = ScriptedTransport::new(|task| {
        let frame = ResultMessage::ok(task.individual_id, 0.5).to_bytes();
        vec![frame.clone(), frame]
    });
    let dispatcher = dispatcher(transport.clone(), DispatchConfig::default());

    let first = dispatcher.evaluate_requests(0, requests(&[1])).await.unwrap();
    let second = dispatcher.evaluate_requests(1, requests(&[2])).await.unwrap();

    assert_eq!(first[&1], EvaluationOutcome::Scored(0.5));
    assert_eq!(second[&2], EvaluationOutcome::Scored(0.5));
    // The stale copy for individual 1 is consumed and ignored at the latest
    // while generation 1 is collected
    assert!(dispatcher.stats().duplicates >= 1);
    assert_eq!(dispatcher.stats().completed, 2);
    assert_eq!(transport.total_sends(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_send_error_uses_retry_budget() {
    let transport = ScriptedTransport::new(echo_fitness);
    *transport.failing_sends.lock() = 1;
    let config = DispatchConfig::default().with_max_retries(1);
    let dispatcher = dispatcher(transport.clone(), config);

    let outcomes = dispatcher.evaluate_requests(0, requests(&[4])).await.unwrap();
    assert_eq!(outcomes[&4], EvaluationOutcome::Scored(0.4));
    assert_eq!(dispatcher.stats().send_errors, 1);
    // The delivered frame is the second attempt
    assert_eq!(transport.sent.lock()[0].config.attempt, 1);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_is_bounded() {
    let transport = ScriptedTransport::silent();
    let config = DispatchConfig::default()
        .with_timeout_ms(100)
        .with_max_retries(0)
        .with_max_in_flight(2);
    let dispatcher = Arc::new(dispatcher(transport.clone(), config));

    let background = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move { dispatcher.evaluate_requests(0, requests(&[1, 2, 3, 4, 5])).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.total_sends(), 2);

    let outcomes = background.await.unwrap().unwrap();
    assert_eq!(outcomes.len(), 5);
    assert_eq!(transport.total_sends(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_abort_returns_promptly() {
    let transport = ScriptedTransport::silent();
    let config = DispatchConfig::default().with_timeout_ms(60_000);
    let dispatcher = Arc::new(dispatcher(transport.clone(), config));
    let handle = dispatcher.abort_handle();

    let background = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move { dispatcher.evaluate(3, requests(&[1, 2])).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.abort();
    let result = background.await.unwrap();
    assert!(matches!(result, Err(EvoError::RunAborted { generation: 3 })));

    let notices = transport.broadcasts.lock();
    let last = notices.last().expect("abort notice broadcast");
    assert_eq!(
        WireMessage::try_from_bytes(last).unwrap(),
        WireMessage::Abort(AbortMessage::All)
    );
    drop(notices);

    // Later evaluations refuse to start until the handle is reset
    assert!(matches!(
        dispatcher.evaluate(4, requests(&[3])).await,
        Err(EvoError::RunAborted { generation: 4 })
    ));
    handle.reset();
    assert!(dispatcher.evaluate(4, Vec::new()).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_requests_are_sent_once() {
    let transport = ScriptedTransport::new(echo_fitness);
    let dispatcher = dispatcher(transport.clone(), DispatchConfig::default());
    let outcomes: HashMap<u64, EvaluationOutcome> = dispatcher
        .evaluate_requests(0, requests(&[7, 7, 8]))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(transport.sends_for(7), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_completes_retried_task_once() {
    // Fitness tags which attempt answered
    let transport = ScriptedTransport::delayed(
        |task| {
            if task.individual_id == 1 {
                vec![ResultMessage::ok(1, task.config.attempt as f64).to_bytes()]
            } else {
                Vec::new()
            }
        },
        |task| match task.config.attempt {
            0 => Duration::from_millis(150),
            _ => Duration::from_millis(100),
        },
    );
    let config = DispatchConfig::default()
        .with_timeout_ms(100)
        .with_max_retries(3);
    let dispatcher = dispatcher(transport.clone(), config);

    // Silent individual 2 keeps the generation open past the second reply
    let outcomes = dispatcher.evaluate_requests(0, requests(&[1, 2])).await.unwrap();

    assert_eq!(outcomes[&1], EvaluationOutcome::Scored(0.0));
    assert_eq!(transport.sends_for(1), 2);
    assert!(matches!(outcomes[&2], EvaluationOutcome::Failed(_)));
    let stats = dispatcher.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.duplicates, 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_evaluation_leaves_no_reply_pump() {
    let transport = ScriptedTransport::delayed(
        |task| vec![ResultMessage::ok(task.individual_id, 0.5).to_bytes()],
        |_| Duration::from_millis(20),
    );
    let config = DispatchConfig::default()
        .with_timeout_ms(200)
        .with_max_retries(0);
    let dispatcher = dispatcher(transport.clone(), config);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(5), dispatcher.evaluate_requests(0, requests(&[1])))
            .await;
    assert!(abandoned.is_err());

    let outcomes = dispatcher.evaluate_requests(1, requests(&[2])).await.unwrap();

    assert_eq!(outcomes[&2], EvaluationOutcome::Scored(0.5));
    let stats = dispatcher.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.timeouts, 0);
    // Individual 1's reply reaches the live generation and is ignored there
    assert_eq!(stats.duplicates, 1);
    // Both generations were torn down
    assert_eq!(*transport.discards.lock(), 2);
}
