// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Seeded random number generation for evolution runs.

All stochastic decisions of a run draw from one [`StdRng`] owned by the run
context, so a fixed seed reproduces a run exactly. Without a seed, one is drawn
from the thread RNG and logged so the run can be replayed.
*/

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Build the run generator, returning the seed actually used
pub fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(random_u64);
    (StdRng::seed_from_u64(seed), seed)
}

/// Generate random u64 (used for unseeded runs)
pub fn random_u64() -> u64 {
    rand::thread_rng().gen()
}

/// True with probability `p` (clamped to [0, 1])
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    if p <= 0.0 {
        false
    } else if p >= 1.0 {
        true
    } else {
        rng.gen::<f64>() < p
    }
}

/// Uniform pick from a non-empty slice
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())])
    }
}
