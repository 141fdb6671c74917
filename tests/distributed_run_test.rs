// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end runs: coordinator, dispatcher and worker threads over the
//! in-process task queue

use arbor::ast::{BinaryOp, Literal, UnaryOp};
use arbor::evolution::EvoError;
use arbor::prelude::*;
use arbor::worker::{WorkerConfig, WorkerStats};
use arbor::ArborError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

fn eval(node: &Node, x: f64) -> f64 {
    match node.kind {
        NodeKind::Literal {
            value: Literal::Int(v),
        } => v as f64,
        NodeKind::Literal {
            value: Literal::Float(v),
        } => v,
        NodeKind::Variable { .. } => x,
        NodeKind::Unary { op: UnaryOp::Neg } => -eval(&node.children[0], x),
        NodeKind::Binary { op } => {
            let (a, b) = (eval(&node.children[0], x), eval(&node.children[1], x));
            match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div if b == 0.0 => 1.0,
                BinaryOp::Div => a / b,
                _ => 0.0,
            }
        }
        _ => 0.0,
    }
}

/// Reports the absolute error against 2x + 3
fn regression(program: &Node, _: &ExecutionBudget) -> Result<Measurements, ExecutionFailure> {
    let error: f64 = (-4..=4)
        .map(|x| x as f64)
        .map(|x| (eval(program, x) - (2.0 * x + 3.0)).abs())
        .sum();
    if error.is_finite() {
        Ok(Measurements::new().with("error", error))
    } else {
        Err(ExecutionFailure::Runtime("diverged".to_string()))
    }
}

struct WorkerPool {
    stop_flags: Vec<Arc<AtomicBool>>,
    handles: Vec<JoinHandle<arbor::worker::WorkerResult<WorkerStats>>>,
}

impl WorkerPool {
    fn spawn(queue: &MemoryTaskQueue, count: usize) -> Self {
        let mut pool = Self {
            stop_flags: Vec::new(),
            handles: Vec::new(),
        };
        for _ in 0..count {
            let mut client = queue.connect_worker();
            client.start().unwrap();
            let config = WorkerConfig {
                poll_timeout_ms: 10,
                ..Default::default()
            };
            let mut worker = Worker::new(client, FnRuntime::new(regression), config).unwrap();
            pool.stop_flags.push(worker.stop_flag());
            pool.handles.push(std::thread::spawn(move || worker.run()));
        }
        pool
    }

    fn shutdown(self) -> Vec<WorkerStats> {
        for flag in &self.stop_flags {
            flag.store(true, Ordering::Relaxed);
        }
        self.handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect()
    }
}

fn config(seed: u64) -> ArborConfig {
    let mut config = ArborConfig::default();
    config.run.seed = Some(seed);
    config.run.max_generations = Some(4);
    config.population.size = 12;
    config.dispatch.max_in_flight = 4;
    config
}

async fn distributed_run(config: ArborConfig) -> (RunReport, Vec<WorkerStats>) {
    let mut queue = MemoryTaskQueue::new();
    queue.start().unwrap();
    let pool = WorkerPool::spawn(&queue, 3);

    let coordinator = Coordinator::new(config, Arc::new(queue)).unwrap();
    let report = coordinator.run(SeedStrategy::Random).await.unwrap();
    (report, pool.shutdown())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distributed_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let summary_path = dir.path().join("summaries.jsonl");
    let mut config = config(3);
    config.run.summary_path = Some(summary_path.clone());

    let (report, stats) = distributed_run(config).await;

    assert_eq!(report.generations, 4);
    assert_eq!(report.stop_reason, StopReason::GenerationLimit);
    assert!(report.best.is_some());
    for summary in &report.summaries {
        assert_eq!(summary.population_size, 12);
    }

    let lines = std::fs::read_to_string(&summary_path).unwrap();
    assert_eq!(lines.lines().count(), 4);

    // Elites are not re-evaluated, so at least the first generation was
    let tasks: u64 = stats.iter().map(|s| s.tasks).sum();
    assert!(tasks >= 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distributed_runs_are_reproducible() {
    let (a, _) = distributed_run(config(21)).await;
    let (b, _) = distributed_run(config(21)).await;
    assert_eq!(a.summaries, b.summaries);
    assert_eq!(a.seed, 21);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abort_without_workers() {
    let mut queue = MemoryTaskQueue::new();
    queue.start().unwrap();
    let mut config = config(1);
    config.dispatch.task_timeout_ms = 60_000;

    let coordinator = Coordinator::new(config, Arc::new(queue)).unwrap();
    let abort = coordinator.abort_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        abort.abort();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator.run(SeedStrategy::Random),
    )
    .await
    .unwrap();
    assert!(matches!(
        result,
        Err(ArborError::Evolution(EvoError::RunAborted { generation: 0 }))
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let mut queue = MemoryTaskQueue::new();
    queue.start().unwrap();
    let mut config = ArborConfig::default();
    config.population.size = 1;

    assert!(matches!(
        Coordinator::new(config, Arc::new(queue)),
        Err(ArborError::Config(_))
    ));
}
