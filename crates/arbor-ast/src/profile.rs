// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Language profiles
//!
//! Each pluggable front end describes the subset of the shared node vocabulary its
//! runtime can execute, plus the size limits that keep evolved programs from
//! bloating. Operators and seed import validate against the active profile.

use crate::error::{AstError, AstResult};
use crate::node::{BinaryOp, Node, NodeKind, Role, UnaryOp};
use serde::{Deserialize, Serialize};

/// Bounds on tree size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_nodes: 256,
        }
    }
}

impl TreeLimits {
    pub fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth,
            max_nodes,
        }
    }

    pub fn check(&self, tree: &Node) -> AstResult<()> {
        let depth = tree.depth();
        if depth > self.max_depth {
            return Err(AstError::DepthExceeded {
                depth,
                max: self.max_depth,
            });
        }
        let nodes = tree.node_count();
        if nodes > self.max_nodes {
            return Err(AstError::NodeLimitExceeded {
                nodes,
                max: self.max_nodes,
            });
        }
        Ok(())
    }

    pub fn admits(&self, tree: &Node) -> bool {
        self.check(tree).is_ok()
    }
}

/// A callable exposed by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub id: u16,
    pub name: String,
    pub arity: u8,
}

/// Inclusive range used when generating integer literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralRange {
    pub min: i64,
    pub max: i64,
}

impl Default for LiteralRange {
    fn default() -> Self {
        Self { min: -10, max: 10 }
    }
}

/// Vocabulary and limits of one target language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageProfile {
    pub name: String,
    /// Role of a whole program (expression for pure GP, statement for imperative languages)
    pub root_role: Role,
    pub limits: TreeLimits,
    /// Number of variable slots, `x0 .. x{n-1}`
    pub variables: u16,
    pub functions: Vec<FunctionSignature>,
    pub binary_ops: Vec<BinaryOp>,
    pub unary_ops: Vec<UnaryOp>,
    pub literal_range: LiteralRange,
    /// Emit float literals as well as integers
    pub float_literals: bool,
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self::arithmetic()
    }
}

impl LanguageProfile {
    /// Expression-only profile for symbolic regression style problems
    pub fn arithmetic() -> Self {
        Self {
            name: "arithmetic".to_string(),
            root_role: Role::Expression,
            limits: TreeLimits::default(),
            variables: 1,
            functions: Vec::new(),
            binary_ops: vec![BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div],
            unary_ops: vec![UnaryOp::Neg],
            literal_range: LiteralRange::default(),
            float_literals: false,
        }
    }

    /// Statement-rooted profile with the full operator set
    pub fn imperative() -> Self {
        Self {
            name: "imperative".to_string(),
            root_role: Role::Statement,
            limits: TreeLimits::new(10, 512),
            variables: 3,
            functions: Vec::new(),
            binary_ops: BinaryOp::ALL.to_vec(),
            unary_ops: UnaryOp::ALL.to_vec(),
            literal_range: LiteralRange::default(),
            float_literals: false,
        }
    }

    pub fn with_limits(mut self, limits: TreeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_variables(mut self, variables: u16) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, arity: u8) -> Self {
        let id = self.functions.len() as u16;
        self.functions.push(FunctionSignature {
            id,
            name: name.into(),
            arity,
        });
        self
    }

    pub fn function(&self, id: u16) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.id == id)
    }

    /// Profile supports statements at all
    pub fn has_statements(&self) -> bool {
        self.root_role == Role::Statement
    }

    /// Full check: structure, limits, root role and vocabulary
    pub fn validate(&self, tree: &Node) -> AstResult<()> {
        if tree.role() != self.root_role {
            return Err(AstError::RootRole {
                expected: self.root_role,
                found: tree.role(),
            });
        }
        tree.validate(&self.limits)?;

        let mut stack = vec![tree];
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Variable { slot } | NodeKind::Assign { slot } => {
                    if *slot >= self.variables {
                        return Err(AstError::UnknownVariable {
                            slot: *slot,
                            count: self.variables,
                        });
                    }
                }
                NodeKind::Binary { op } if !self.binary_ops.contains(op) => {
                    return Err(AstError::OperatorNotAllowed(op.symbol().to_string()));
                }
                NodeKind::Unary { op } if !self.unary_ops.contains(op) => {
                    return Err(AstError::OperatorNotAllowed(op.symbol().to_string()));
                }
                NodeKind::Call { function } => {
                    let signature = self
                        .function(*function)
                        .ok_or(AstError::UnknownFunction {
                            function: *function,
                        })?;
                    if node.children.len() != signature.arity as usize {
                        return Err(AstError::ArityMismatch {
                            kind: "call",
                            path: Vec::new(),
                            expected: signature.arity.to_string(),
                            found: node.children.len(),
                        });
                    }
                }
                _ => {}
            }
            stack.extend(node.children.iter());
        }
        Ok(())
    }
}
