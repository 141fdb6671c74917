// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Genetic operators over program trees.

Every operator works on deep copies; parents are never modified. All
randomness comes from the caller's generator so runs stay reproducible.
*/

pub mod crossover;
pub mod generator;
pub mod mutation;
pub mod selection;

pub use crossover::{crossover, CrossoverOutcome};
pub use generator::{generate, ramped_half_and_half, terminal, GrowMethod};
pub use mutation::{mutate, MutationOutcome};
pub use selection::{rank, rank_order, tournament};
