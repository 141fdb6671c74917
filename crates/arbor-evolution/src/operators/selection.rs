// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tournament selection and ranking

use crate::fitness::Objective;
use crate::individual::Individual;
use rand::Rng;
use std::cmp::Ordering;

/// Order two individuals best-first; equal fitness puts the lower id first
pub fn rank_order(objective: Objective, a: &Individual, b: &Individual) -> Ordering {
    objective
        .compare(a.fitness(objective), b.fitness(objective))
        .reverse()
        .then(a.id.cmp(&b.id))
}

/// Sort a slice of candidates best-first
pub fn rank<'a>(objective: Objective, candidates: &mut [&'a Individual]) {
    candidates.sort_by(|a, b| rank_order(objective, a, b));
}

/// Draw `k` candidates uniformly with replacement and return the best
///
/// Returns `None` only when `candidates` is empty.
pub fn tournament<'a, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[&'a Individual],
    k: usize,
    objective: Objective,
) -> Option<&'a Individual> {
    if candidates.is_empty() {
        return None;
    }
    let mut winner: Option<&'a Individual> = None;
    for _ in 0..k.max(1) {
        let contender = candidates[rng.gen_range(0..candidates.len())];
        winner = match winner {
            Some(current) if rank_order(objective, current, contender) != Ordering::Greater => {
                Some(current)
            }
            _ => Some(contender),
        };
    }
    winner
}
