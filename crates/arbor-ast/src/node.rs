// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Program tree nodes
//!
//! A program is an owned tree of [`Node`]s. Children are held by value, so a tree
//! can never contain a cycle or share a subtree with another tree; copying an
//! individual is a plain `clone()`.
//!
//! Every [`NodeKind`] has a semantic [`Role`] (expression or statement) and a
//! child schema describing which role each child slot accepts. Genetic operators
//! only exchange subtrees whose roles agree, which keeps every tree they produce
//! structurally valid.

use crate::error::{AstError, AstResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Produces a value
    Expression,
    /// Performs an effect, produces no value
    Statement,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Expression => write!(f, "expression"),
            Role::Statement => write!(f, "statement"),
        }
    }
}

/// Constant value carried by a literal node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Two-operand operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// All binary operators, in declaration order
    pub const ALL: [BinaryOp; 13] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Ge,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::And,
        BinaryOp::Or,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Single-operand operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 2] = [UnaryOp::Neg, UnaryOp::Not];

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "!",
        }
    }
}

/// Number of children a node kind accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Any number of children (blocks, calls; call arity is checked against the profile)
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => *n == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

/// Closed set of node kinds understood by every language front end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    // Expressions
    Literal { value: Literal },
    Variable { slot: u16 },
    Binary { op: BinaryOp },
    Unary { op: UnaryOp },
    Call { function: u16 },

    // Statements
    /// Sequence of statements
    Block,
    /// `[condition, then, else]`
    If,
    /// `[condition, body]`
    While,
    /// `[value]`
    Assign { slot: u16 },
    /// `[value]`
    Return,
}

impl NodeKind {
    pub fn role(&self) -> Role {
        match self {
            NodeKind::Literal { .. }
            | NodeKind::Variable { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Unary { .. }
            | NodeKind::Call { .. } => Role::Expression,
            NodeKind::Block
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Assign { .. }
            | NodeKind::Return => Role::Statement,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            NodeKind::Literal { .. } | NodeKind::Variable { .. } => Arity::Exact(0),
            NodeKind::Binary { .. } => Arity::Exact(2),
            NodeKind::Unary { .. } => Arity::Exact(1),
            NodeKind::Call { .. } | NodeKind::Block => Arity::Variadic,
            NodeKind::If => Arity::Exact(3),
            NodeKind::While => Arity::Exact(2),
            NodeKind::Assign { .. } | NodeKind::Return => Arity::Exact(1),
        }
    }

    /// Role required of the child at `index`
    pub fn child_role(&self, index: usize) -> Role {
        match self {
            NodeKind::Block => Role::Statement,
            NodeKind::If | NodeKind::While if index > 0 => Role::Statement,
            _ => Role::Expression,
        }
    }

    /// Short lowercase name used in diagnostics and display
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "literal",
            NodeKind::Variable { .. } => "variable",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Unary { .. } => "unary",
            NodeKind::Call { .. } => "call",
            NodeKind::Block => "block",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::Assign { .. } => "assign",
            NodeKind::Return => "return",
        }
    }
}

/// One node of a program tree, owning its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Position of a node inside a tree, as visited by [`Node::locations`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    /// Child indices from the root; empty for the root itself
    pub path: Vec<usize>,
    /// Depth of the node, the root being at depth 1
    pub depth: usize,
    pub role: Role,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    //region Constructors

    pub fn int(value: i64) -> Self {
        Self::leaf(NodeKind::Literal {
            value: Literal::Int(value),
        })
    }

    pub fn float(value: f64) -> Self {
        Self::leaf(NodeKind::Literal {
            value: Literal::Float(value),
        })
    }

    pub fn boolean(value: bool) -> Self {
        Self::leaf(NodeKind::Literal {
            value: Literal::Bool(value),
        })
    }

    pub fn var(slot: u16) -> Self {
        Self::leaf(NodeKind::Variable { slot })
    }

    pub fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Self {
        Self::new(NodeKind::Binary { op }, vec![lhs, rhs])
    }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Self::new(NodeKind::Unary { op }, vec![operand])
    }

    pub fn call(function: u16, args: Vec<Node>) -> Self {
        Self::new(NodeKind::Call { function }, args)
    }

    pub fn block(statements: Vec<Node>) -> Self {
        Self::new(NodeKind::Block, statements)
    }

    pub fn if_else(condition: Node, then: Node, otherwise: Node) -> Self {
        Self::new(NodeKind::If, vec![condition, then, otherwise])
    }

    pub fn while_loop(condition: Node, body: Node) -> Self {
        Self::new(NodeKind::While, vec![condition, body])
    }

    pub fn assign(slot: u16, value: Node) -> Self {
        Self::new(NodeKind::Assign { slot }, vec![value])
    }

    pub fn ret(value: Node) -> Self {
        Self::new(NodeKind::Return, vec![value])
    }

    //endregion

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// Height of this subtree; a single node has depth 1
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }

    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        let mut current = self;
        for &index in path {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut current = self;
        for &index in path {
            current = current.children.get_mut(index)?;
        }
        Some(current)
    }

    /// Swap in `replacement` at `path`, returning the subtree it displaced
    pub fn replace_at(&mut self, path: &[usize], replacement: Node) -> AstResult<Node> {
        let slot = self
            .get_mut(path)
            .ok_or_else(|| AstError::InvalidPath(path.to_vec()))?;
        Ok(std::mem::replace(slot, replacement))
    }

    /// Every node of the tree in pre-order
    pub fn locations(&self) -> Vec<NodeLocation> {
        let mut out = Vec::with_capacity(self.node_count());
        let mut stack = vec![(self, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            for (index, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child, child_path));
            }
            out.push(NodeLocation {
                depth: path.len() + 1,
                role: node.role(),
                path,
            });
        }
        out
    }

    /// Check child counts and child roles over the whole subtree
    pub fn check_structure(&self) -> AstResult<()> {
        let mut stack: Vec<(&Node, Vec<usize>)> = vec![(self, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            let arity = node.kind.arity();
            if !arity.accepts(node.children.len()) {
                return Err(AstError::ArityMismatch {
                    kind: node.kind.name(),
                    path,
                    expected: arity.to_string(),
                    found: node.children.len(),
                });
            }
            for (index, child) in node.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(index);
                let expected = node.kind.child_role(index);
                if child.role() != expected {
                    return Err(AstError::RoleMismatch {
                        path: child_path,
                        expected,
                        found: child.role(),
                    });
                }
                stack.push((child, child_path));
            }
        }
        Ok(())
    }

    /// Structure plus size limits
    pub fn validate(&self, limits: &crate::TreeLimits) -> AstResult<()> {
        self.check_structure()?;
        limits.check(self)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// S-expression rendering, e.g. `(if (< x0 3) (block) (return x1))`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = match &self.kind {
            NodeKind::Literal { value } => return write!(f, "{}", value),
            NodeKind::Variable { slot } => return write!(f, "x{}", slot),
            NodeKind::Binary { op } => op.symbol().to_string(),
            NodeKind::Unary { op } => op.symbol().to_string(),
            NodeKind::Call { function } => format!("call f{}", function),
            NodeKind::Assign { slot } => format!("set x{}", slot),
            other => other.name().to_string(),
        };
        write!(f, "({}", head)?;
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, ")")
    }
}
