// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for tree construction and validation

use crate::node::Role;
use thiserror::Error;

/// Result type for tree operations
pub type AstResult<T> = Result<T, AstError>;

/// Structural and vocabulary violations found in a program tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AstError {
    #[error("{kind} at {path:?} expects {expected} children, found {found}")]
    ArityMismatch {
        kind: &'static str,
        path: Vec<usize>,
        expected: String,
        found: usize,
    },

    #[error("node at {path:?} has role {found}, slot requires {expected}")]
    RoleMismatch {
        path: Vec<usize>,
        expected: Role,
        found: Role,
    },

    #[error("tree depth {depth} exceeds limit {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("tree has {nodes} nodes, limit is {max}")]
    NodeLimitExceeded { nodes: usize, max: usize },

    #[error("no node at path {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("variable slot {slot} out of range (profile declares {count})")]
    UnknownVariable { slot: u16, count: u16 },

    #[error("function {function} is not declared by the language profile")]
    UnknownFunction { function: u16 },

    #[error("operator {0} is not available in this language profile")]
    OperatorNotAllowed(String),

    #[error("root node has role {found}, profile requires {expected}")]
    RootRole { expected: Role, found: Role },
}
