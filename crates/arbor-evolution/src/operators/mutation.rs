// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Subtree mutation: replace a random node with a fresh subtree of the same role

use super::generator::{generate, GrowMethod};
use arbor_ast::{LanguageProfile, Node};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub child: Node,
    /// Location of the replaced node
    pub path: Vec<usize>,
}

/// Mutate a copy of `tree`
///
/// The replacement is grown within the depth budget left at the chosen node
/// (capped by `max_subtree_depth`). Returns `None` when no attempt produced a
/// tree within the profile's limits.
pub fn mutate<R: Rng + ?Sized>(
    rng: &mut R,
    tree: &Node,
    profile: &LanguageProfile,
    max_subtree_depth: usize,
    attempts: usize,
) -> Option<MutationOutcome> {
    let locations = tree.locations();
    let max_depth = profile.limits.max_depth;

    for _ in 0..attempts.max(1) {
        let target = &locations[rng.gen_range(0..locations.len())];
        if target.depth > max_depth {
            continue;
        }
        let budget = (max_depth - target.depth + 1).min(max_subtree_depth.max(1));
        let replacement = generate(rng, profile, target.role, budget, GrowMethod::Grow);

        let mut child = tree.clone();
        if child.replace_at(&target.path, replacement).is_err() {
            continue;
        }
        if profile.limits.admits(&child) {
            return Some(MutationOutcome {
                child,
                path: target.path.clone(),
            });
        }
    }
    None
}
