// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Arbor Program Trees

Shared abstract-syntax-tree model for every language front end Arbor evolves
programs for.

- [`Node`] / [`NodeKind`] - owned, acyclic program trees with a closed node set
- [`Role`] - expression/statement typing used to keep genetic operators valid
- [`LanguageProfile`] - per-language vocabulary and [`TreeLimits`]

Front ends parse source text into [`Node`] trees; runtimes execute them. Neither
concern lives in this crate.
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod node;
pub mod profile;

pub use error::{AstError, AstResult};
pub use node::{Arity, BinaryOp, Literal, Node, NodeKind, NodeLocation, Role, UnaryOp};
pub use profile::{FunctionSignature, LanguageProfile, LiteralRange, TreeLimits};
