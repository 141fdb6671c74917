// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Random tree generation over a language profile's vocabulary.

Generation is role-aware: expression positions receive literals, variables,
operators and calls; statement positions receive blocks, conditionals, loops,
assignments and returns. An empty `Block` is the statement terminal, so a
statement subtree can always be closed off at depth 1.
*/

use crate::random::{chance, pick};
use arbor_ast::{LanguageProfile, Node, Role};
use rand::Rng;

/// Shape of the generated tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowMethod {
    /// Every branch reaches the requested depth where the vocabulary allows
    Full,
    /// Branches may stop early at any depth
    Grow,
}

/// Largest number of statements placed in one generated block
const MAX_BLOCK_LEN: usize = 3;

/// Attempts per individual before ramped initialization falls back to a terminal
const INIT_ATTEMPTS: usize = 20;

/// Build a random subtree of `role` whose depth does not exceed `max_depth`
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &LanguageProfile,
    role: Role,
    max_depth: usize,
    method: GrowMethod,
) -> Node {
    let max_depth = max_depth.max(1);
    match role {
        Role::Expression => expression(rng, profile, max_depth, method),
        Role::Statement => statement(rng, profile, max_depth, method),
    }
}

/// Generate `count` trees with ramped half-and-half
///
/// Depths ramp from 2 up to `max_depth` (bounded by the profile's limit),
/// alternating full and grow. Trees over the node limit are regenerated.
pub fn ramped_half_and_half<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &LanguageProfile,
    count: usize,
    max_depth: usize,
) -> Vec<Node> {
    let ceiling = max_depth.min(profile.limits.max_depth).max(1);
    let floor = 2.min(ceiling);
    let ramp = ceiling - floor + 1;

    (0..count)
        .map(|i| {
            let depth = floor + (i / 2) % ramp;
            let method = if i % 2 == 0 {
                GrowMethod::Full
            } else {
                GrowMethod::Grow
            };
            for _ in 0..INIT_ATTEMPTS {
                let tree = generate(rng, profile, profile.root_role, depth, method);
                if profile.limits.admits(&tree) {
                    return tree;
                }
            }
            terminal(rng, profile, profile.root_role)
        })
        .collect()
}

/// Single-node tree of `role`
pub fn terminal<R: Rng + ?Sized>(rng: &mut R, profile: &LanguageProfile, role: Role) -> Node {
    match role {
        Role::Expression => expression_terminal(rng, profile),
        Role::Statement => Node::block(Vec::new()),
    }
}

//region Expressions

#[derive(Clone, Copy)]
enum ExprChoice {
    Binary,
    Unary,
    Call,
}

fn expression<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &LanguageProfile,
    depth: usize,
    method: GrowMethod,
) -> Node {
    if depth <= 1 {
        return expression_terminal(rng, profile);
    }

    let mut choices = Vec::with_capacity(3);
    if !profile.binary_ops.is_empty() {
        choices.push(ExprChoice::Binary);
    }
    if !profile.unary_ops.is_empty() {
        choices.push(ExprChoice::Unary);
    }
    if !profile.functions.is_empty() {
        choices.push(ExprChoice::Call);
    }
    if choices.is_empty() {
        return expression_terminal(rng, profile);
    }

    // Grow treats terminals as one more candidate alongside the operator kinds
    if method == GrowMethod::Grow && rng.gen_range(0..=choices.len()) == choices.len() {
        return expression_terminal(rng, profile);
    }

    let child = depth - 1;
    match choices[rng.gen_range(0..choices.len())] {
        ExprChoice::Binary => {
            let op = profile.binary_ops[rng.gen_range(0..profile.binary_ops.len())];
            let lhs = expression(rng, profile, child, method);
            let rhs = expression(rng, profile, child, method);
            Node::binary(op, lhs, rhs)
        }
        ExprChoice::Unary => {
            let op = profile.unary_ops[rng.gen_range(0..profile.unary_ops.len())];
            Node::unary(op, expression(rng, profile, child, method))
        }
        ExprChoice::Call => {
            let signature = &profile.functions[rng.gen_range(0..profile.functions.len())];
            let (id, arity) = (signature.id, signature.arity);
            let args = (0..arity)
                .map(|_| expression(rng, profile, child, method))
                .collect();
            Node::call(id, args)
        }
    }
}

fn expression_terminal<R: Rng + ?Sized>(rng: &mut R, profile: &LanguageProfile) -> Node {
    if profile.variables > 0 && chance(rng, 0.5) {
        return Node::var(rng.gen_range(0..profile.variables));
    }
    let range = profile.literal_range;
    let (min, max) = if range.min <= range.max {
        (range.min, range.max)
    } else {
        (range.max, range.min)
    };
    if profile.float_literals && chance(rng, 0.5) {
        Node::float(rng.gen_range(min as f64..=max as f64))
    } else {
        Node::int(rng.gen_range(min..=max))
    }
}

//endregion

//region Statements

#[derive(Clone, Copy)]
enum StmtChoice {
    Block,
    If,
    While,
    Assign,
    Return,
}

fn statement<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &LanguageProfile,
    depth: usize,
    method: GrowMethod,
) -> Node {
    if depth <= 1 {
        return Node::block(Vec::new());
    }

    let mut choices = vec![
        StmtChoice::Block,
        StmtChoice::If,
        StmtChoice::While,
        StmtChoice::Return,
    ];
    if profile.variables > 0 {
        choices.push(StmtChoice::Assign);
    }

    if method == GrowMethod::Grow && rng.gen_range(0..=choices.len()) == choices.len() {
        return Node::block(Vec::new());
    }

    let child = depth - 1;
    let choice = *pick(rng, &choices).unwrap_or(&StmtChoice::Block);
    match choice {
        StmtChoice::Block => {
            let len = rng.gen_range(1..=MAX_BLOCK_LEN);
            let statements = (0..len)
                .map(|_| statement(rng, profile, child, method))
                .collect();
            Node::block(statements)
        }
        StmtChoice::If => {
            let condition = expression(rng, profile, child, method);
            let then = statement(rng, profile, child, method);
            let otherwise = statement(rng, profile, child, method);
            Node::if_else(condition, then, otherwise)
        }
        StmtChoice::While => {
            let condition = expression(rng, profile, child, method);
            let body = statement(rng, profile, child, method);
            Node::while_loop(condition, body)
        }
        StmtChoice::Assign => {
            let slot = rng.gen_range(0..profile.variables.max(1));
            Node::assign(slot, expression(rng, profile, child, method))
        }
        StmtChoice::Return => Node::ret(expression(rng, profile, child, method)),
    }
}

//endregion

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;
    use arbor_ast::NodeKind;

    #[test]
    fn test_generated_expressions_are_valid() {
        let profile = LanguageProfile::arithmetic().with_function("sin", 1);
        let (mut rng, _) = seeded_rng(Some(11));
        for depth in 1..=6 {
            for method in [GrowMethod::Full, GrowMethod::Grow] {
                let tree = generate(&mut rng, &profile, Role::Expression, depth, method);
                assert!(tree.depth() <= depth);
                tree.check_structure().unwrap();
            }
        }
    }

    #[test]
    fn test_full_reaches_depth() {
        let profile = LanguageProfile::arithmetic();
        let (mut rng, _) = seeded_rng(Some(5));
        for depth in 1..=5 {
            let tree = generate(&mut rng, &profile, Role::Expression, depth, GrowMethod::Full);
            assert_eq!(tree.depth(), depth);
        }
    }

    #[test]
    fn test_generated_statements_are_valid() {
        let profile = LanguageProfile::imperative();
        let (mut rng, _) = seeded_rng(Some(99));
        for _ in 0..50 {
            let tree = generate(&mut rng, &profile, Role::Statement, 5, GrowMethod::Grow);
            assert_eq!(tree.role(), Role::Statement);
            assert!(tree.depth() <= 5);
            profile.validate(&tree).unwrap();
        }
    }

    #[test]
    fn test_ramped_half_and_half_respects_profile() {
        let profile = LanguageProfile::imperative();
        let (mut rng, _) = seeded_rng(Some(1));
        let trees = ramped_half_and_half(&mut rng, &profile, 40, 6);
        assert_eq!(trees.len(), 40);
        for tree in &trees {
            profile.validate(tree).unwrap();
        }
    }

    #[test]
    fn test_terminal_roles() {
        let profile = LanguageProfile::imperative();
        let (mut rng, _) = seeded_rng(Some(2));
        assert_eq!(
            terminal(&mut rng, &profile, Role::Statement).kind,
            NodeKind::Block
        );
        assert!(terminal(&mut rng, &profile, Role::Expression).is_leaf());
    }
}
