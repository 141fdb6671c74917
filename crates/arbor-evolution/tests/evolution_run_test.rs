// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for population management and the run driver

use arbor_ast::{BinaryOp, LanguageProfile, Literal, Node, NodeKind, UnaryOp};
use arbor_evolution::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Minimal arithmetic interpreter for the test fitness function
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

/// Absolute error against x^2 + 1 over a few sample points
fn regression_error(ast: &Node) -> Result<f64, String> {
    let error: f64 = (-3..=3)
        .map(|x| x as f64)
        .map(|x| (eval(ast, x) - (x * x + 1.0)).abs())
        .sum();
    if error.is_finite() {
        Ok(error)
    } else {
        Err("diverged".to_string())
    }
}

fn config(seed: u64) -> EvolutionConfig {
    EvolutionConfig {
        population_size: 16,
        tournament_size: 3,
        seed: Some(seed),
        profile: LanguageProfile::arithmetic(),
        ..Default::default()
    }
}

async fn run_once(seed: u64, generations: u64) -> RunReport {
    let mut manager = PopulationManager::new(config(seed)).unwrap();
    manager.initialize(16, SeedStrategy::Random).unwrap();
    let evaluator = Arc::new(LocalEvaluator::new(regression_error));
    EvolutionRun::new(manager, evaluator, StopCondition::generations(generations))
        .unwrap()
        .run()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_identical_seed_reproduces_summaries() {
    let a = run_once(77, 6).await;
    let b = run_once(77, 6).await;
    assert_eq!(a.summaries, b.summaries);
    assert_eq!(a.seed, 77);
    assert_eq!(a.generations, 6);
    assert_eq!(a.summaries.len(), 6);
}

#[tokio::test]
async fn test_best_fitness_never_regresses() {
    for seed in 0..8 {
        let report = run_once(seed, 10).await;
        for pair in report.summaries.windows(2) {
            let (before, after) = (pair[0].best_fitness.unwrap(), pair[1].best_fitness.unwrap());
            assert!(
                after <= before,
                "seed {}: best fitness regressed: {} -> {}",
                seed,
                before,
                after
            );
        }
    }

    let report = run_once(5, 10).await;
    for summary in &report.summaries {
        assert_eq!(summary.population_size, 16);
        assert_eq!(summary.evaluated, 16);
    }
    let best = report.best.unwrap();
    assert_eq!(
        best.fitness(Objective::Minimize),
        report.summaries.last().unwrap().best_fitness.unwrap()
    );
}

#[tokio::test]
async fn test_target_fitness_stops_run() {
    let mut manager = PopulationManager::new(config(9)).unwrap();
    let exact = Node::binary(
        BinaryOp::Add,
        Node::binary(BinaryOp::Mul, Node::var(0), Node::var(0)),
        Node::int(1),
    );
    manager
        .initialize(8, SeedStrategy::Import(vec![exact.clone()]))
        .unwrap();
    let evaluator = Arc::new(LocalEvaluator::new(regression_error));
    let stop = StopCondition::generations(50).with_target(0.0);
    let report = EvolutionRun::new(manager, evaluator, stop)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::TargetReached);
    assert_eq!(report.generations, 1);
    assert_eq!(report.best.unwrap().ast, exact);
}

#[tokio::test]
async fn test_stagnation_stops_run() {
    let mut manager = PopulationManager::new(config(10)).unwrap();
    manager.initialize(8, SeedStrategy::Random).unwrap();
    // Constant fitness never improves after the first generation
    let evaluator = Arc::new(LocalEvaluator::new(|_: &Node| Ok(1.0)));
    let stop = StopCondition::generations(100).with_stagnation_limit(3);
    let report = EvolutionRun::new(manager, evaluator, stop)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::Stagnation);
    assert_eq!(report.generations, 4);
}

#[tokio::test]
async fn test_run_requires_stop_condition_and_population() {
    let evaluator: Arc<dyn Evaluator> = Arc::new(LocalEvaluator::new(regression_error));

    let empty = PopulationManager::new(config(1)).unwrap();
    assert!(matches!(
        EvolutionRun::new(empty, evaluator.clone(), StopCondition::generations(1)),
        Err(EvoError::InvalidConfig(_))
    ));

    let mut manager = PopulationManager::new(config(1)).unwrap();
    manager.initialize(4, SeedStrategy::Random).unwrap();
    assert!(matches!(
        EvolutionRun::new(manager, evaluator, StopCondition::default()),
        Err(EvoError::InvalidConfig(_))
    ));
}

#[test]
fn test_search_without_elites_is_rejected() {
    let config = EvolutionConfig {
        elitism: 0,
        ..config(1)
    };
    assert!(matches!(
        PopulationManager::new(config),
        Err(EvoError::InvalidConfig(_))
    ));
}

/// N=4, k=2, no mutation, crossover always: every crossover child is its first
/// parent with one subtree replaced by a subtree of the second parent
#[tokio::test]
async fn test_crossover_children_are_single_subtree_swaps() {
    let config = EvolutionConfig {
        population_size: 4,
        tournament_size: 2,
        crossover_rate: 1.0,
        mutation_rate: 0.0,
        seed: Some(31),
        profile: LanguageProfile::arithmetic(),
        ..Default::default()
    };
    let mut manager = PopulationManager::new(config).unwrap();
    let seeds = vec![
        Node::binary(BinaryOp::Add, Node::var(0), Node::int(1)),
        Node::binary(
            BinaryOp::Mul,
            Node::binary(BinaryOp::Sub, Node::var(0), Node::int(2)),
            Node::var(0),
        ),
        Node::unary(UnaryOp::Neg, Node::binary(BinaryOp::Div, Node::int(3), Node::var(0))),
        Node::binary(BinaryOp::Sub, Node::int(4), Node::var(0)),
    ];
    manager.initialize(4, SeedStrategy::Import(seeds)).unwrap();

    let evaluator = LocalEvaluator::new(regression_error);
    manager.evaluate_generation(&evaluator).await.unwrap();
    let parents: HashMap<IndividualId, Node> = manager
        .individuals()
        .map(|i| (i.id, i.ast.clone()))
        .collect();
    manager.advance().unwrap();
    assert_eq!(manager.len(), 4);

    let mut crossovers = 0;
    for child in manager.individuals().filter(|i| i.generation == 1) {
        assert_ne!(child.lineage.operator, Operator::Mutation);
        if child.lineage.operator != Operator::Crossover {
            continue;
        }
        crossovers += 1;
        let a = &parents[&child.lineage.parents[0]];
        let b = &parents[child.lineage.parents.last().unwrap()];

        let explained = a.locations().iter().filter(|l| !l.path.is_empty()).any(|la| {
            b.locations()
                .iter()
                .filter(|lb| !lb.path.is_empty() && lb.role == la.role)
                .any(|lb| {
                    let sub_a = a.get(&la.path).unwrap();
                    let sub_b = b.get(&lb.path).unwrap();
                    let mut candidate = a.clone();
                    candidate.replace_at(&la.path, sub_b.clone()).unwrap();
                    candidate == child.ast
                        && child.ast.node_count()
                            == a.node_count() - sub_a.node_count() + sub_b.node_count()
                })
        });
        assert!(explained, "child {} is not a single subtree swap", child.ast);
    }
    assert!(crossovers > 0);
}
