// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Subtree crossover.

A random node of the receiving parent is replaced by a copy of a random,
role-compatible subtree of the donor. The root is excluded from both choices
unless both parents are single-node trees. Children that break the tree limits
are discarded and the exchange is retried; after the last attempt the child is
a plain copy of the receiving parent.
*/

use arbor_ast::{Node, NodeLocation, TreeLimits};
use rand::Rng;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverOutcome {
    pub child: Node,
    /// Swap point in the receiving parent, `None` on fallback
    pub receiver_path: Option<Vec<usize>>,
    /// Swap point in the donor, `None` on fallback
    pub donor_path: Option<Vec<usize>>,
    /// Child is an unmodified copy of the receiving parent
    pub fallback: bool,
}

impl CrossoverOutcome {
    fn fallback(receiver: &Node) -> Self {
        Self {
            child: receiver.clone(),
            receiver_path: None,
            donor_path: None,
            fallback: true,
        }
    }
}

fn swap_points(tree: &Node, include_root: bool) -> Vec<NodeLocation> {
    tree.locations()
        .into_iter()
        .filter(|location| include_root || !location.path.is_empty())
        .collect()
}

/// Cross `receiver` with `donor` under `limits`, trying at most `attempts` swaps
pub fn crossover<R: Rng + ?Sized>(
    rng: &mut R,
    receiver: &Node,
    donor: &Node,
    limits: &TreeLimits,
    attempts: usize,
) -> CrossoverOutcome {
    let both_single = receiver.is_leaf() && donor.is_leaf();
    let receiver_points = swap_points(receiver, both_single);
    let donor_points = swap_points(donor, both_single);
    if receiver_points.is_empty() || donor_points.is_empty() {
        return CrossoverOutcome::fallback(receiver);
    }

    for attempt in 0..attempts.max(1) {
        let target = &receiver_points[rng.gen_range(0..receiver_points.len())];
        let compatible: Vec<&NodeLocation> = donor_points
            .iter()
            .filter(|location| location.role == target.role)
            .collect();
        if compatible.is_empty() {
            continue;
        }
        let source = compatible[rng.gen_range(0..compatible.len())];
        let Some(subtree) = donor.get(&source.path) else {
            continue;
        };

        // Depth of the child along the swap path, checked before copying
        if target.depth - 1 + subtree.depth() > limits.max_depth {
            trace!(attempt, "crossover rejected: depth limit");
            continue;
        }

        let mut child = receiver.clone();
        if child.replace_at(&target.path, subtree.clone()).is_err() {
            continue;
        }
        if !limits.admits(&child) {
            trace!(attempt, "crossover rejected: tree limits");
            continue;
        }
        return CrossoverOutcome {
            child,
            receiver_path: Some(target.path.clone()),
            donor_path: Some(source.path.clone()),
            fallback: false,
        };
    }

    CrossoverOutcome::fallback(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;
    use arbor_ast::{BinaryOp, LanguageProfile, Role};

    fn sample_a() -> Node {
        // (+ x0 (* 2 3))
        Node::binary(
            BinaryOp::Add,
            Node::var(0),
            Node::binary(BinaryOp::Mul, Node::int(2), Node::int(3)),
        )
    }

    fn sample_b() -> Node {
        // (- (- x0 1) (- 4 5))
        Node::binary(
            BinaryOp::Sub,
            Node::binary(BinaryOp::Sub, Node::var(0), Node::int(1)),
            Node::binary(BinaryOp::Sub, Node::int(4), Node::int(5)),
        )
    }

    #[test]
    fn test_child_size_matches_swapped_subtrees() {
        let (a, b) = (sample_a(), sample_b());
        let limits = TreeLimits::new(8, 256);
        let (mut rng, _) = seeded_rng(Some(21));

        for _ in 0..100 {
            let outcome = crossover(&mut rng, &a, &b, &limits, 10);
            assert!(!outcome.fallback);
            let sub_a = a.get(outcome.receiver_path.as_ref().unwrap()).unwrap();
            let sub_b = b.get(outcome.donor_path.as_ref().unwrap()).unwrap();
            assert_eq!(
                outcome.child.node_count(),
                a.node_count() - sub_a.node_count() + sub_b.node_count()
            );
            outcome.child.check_structure().unwrap();
        }
    }

    #[test]
    fn test_root_never_chosen_for_larger_trees() {
        let (a, b) = (sample_a(), sample_b());
        let limits = TreeLimits::default();
        let (mut rng, _) = seeded_rng(Some(8));
        for _ in 0..100 {
            let outcome = crossover(&mut rng, &a, &b, &limits, 10);
            assert!(!outcome.receiver_path.unwrap().is_empty());
            assert!(!outcome.donor_path.unwrap().is_empty());
        }
    }

    #[test]
    fn test_single_node_parents_swap_roots() {
        let limits = TreeLimits::default();
        let (mut rng, _) = seeded_rng(Some(1));
        let outcome = crossover(&mut rng, &Node::int(1), &Node::var(0), &limits, 3);
        assert_eq!(outcome.child, Node::var(0));
        assert_eq!(outcome.receiver_path, Some(vec![]));
    }

    #[test]
    fn test_single_node_receiver_falls_back() {
        let limits = TreeLimits::default();
        let (mut rng, _) = seeded_rng(Some(1));
        let outcome = crossover(&mut rng, &Node::int(1), &sample_b(), &limits, 3);
        assert!(outcome.fallback);
        assert_eq!(outcome.child, Node::int(1));
    }

    #[test]
    fn test_limits_force_fallback() {
        // Any swap of a depth-2 donor subtree into depth 3 would exceed max depth 3
        let deep = Node::binary(
            BinaryOp::Add,
            Node::binary(BinaryOp::Add, Node::var(0), Node::var(0)),
            Node::binary(BinaryOp::Add, Node::var(0), Node::var(0)),
        );
        let tiny = TreeLimits::new(3, 7);
        let (mut rng, _) = seeded_rng(Some(2));
        for _ in 0..20 {
            let outcome = crossover(&mut rng, &deep, &deep, &tiny, 5);
            assert!(tiny.admits(&outcome.child));
        }
    }

    #[test]
    fn test_statement_roles_are_preserved() {
        let profile = LanguageProfile::imperative();
        let (mut rng, _) = seeded_rng(Some(13));
        let trees = crate::operators::generator::ramped_half_and_half(&mut rng, &profile, 20, 5);
        for pair in trees.windows(2) {
            let outcome = crossover(&mut rng, &pair[0], &pair[1], &profile.limits, 10);
            assert_eq!(outcome.child.role(), Role::Statement);
            profile.validate(&outcome.child).unwrap();
        }
    }
}
