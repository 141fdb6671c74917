// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pre-order binary encoding of program trees
//!
//! Each node is written as `tag:u8, child_count:u16`, the scalar fields of its
//! kind, then its children in order.
//!
//! | kind     | tag | scalars                                   |
//! |----------|-----|-------------------------------------------|
//! | literal  | 1   | sub-tag u8 (0 int, 1 float, 2 bool) + value |
//! | variable | 2   | slot u16                                  |
//! | binary   | 3   | operator u8                               |
//! | unary    | 4   | operator u8                               |
//! | call     | 5   | function u16                              |
//! | block    | 16  |                                           |
//! | if       | 17  |                                           |
//! | while    | 18  |                                           |
//! | assign   | 19  | slot u16                                  |
//! | return   | 20  |                                           |

use crate::bytes::{put_f64, put_i64, put_u16, put_u8, ByteReader};
use crate::{CodecError, CodecResult};
use arbor_ast::{BinaryOp, Literal, Node, NodeKind, UnaryOp};

/// Nesting limit enforced while decoding untrusted frames
pub const MAX_DECODE_DEPTH: usize = 512;

//region Tags

const TAG_LITERAL: u8 = 1;
const TAG_VARIABLE: u8 = 2;
const TAG_BINARY: u8 = 3;
const TAG_UNARY: u8 = 4;
const TAG_CALL: u8 = 5;
const TAG_BLOCK: u8 = 16;
const TAG_IF: u8 = 17;
const TAG_WHILE: u8 = 18;
const TAG_ASSIGN: u8 = 19;
const TAG_RETURN: u8 = 20;

const LITERAL_INT: u8 = 0;
const LITERAL_FLOAT: u8 = 1;
const LITERAL_BOOL: u8 = 2;

fn binary_op_code(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add => 0,
        BinaryOp::Sub => 1,
        BinaryOp::Mul => 2,
        BinaryOp::Div => 3,
        BinaryOp::Mod => 4,
        BinaryOp::Lt => 5,
        BinaryOp::Le => 6,
        BinaryOp::Gt => 7,
        BinaryOp::Ge => 8,
        BinaryOp::Eq => 9,
        BinaryOp::Ne => 10,
        BinaryOp::And => 11,
        BinaryOp::Or => 12,
    }
}

fn binary_op_from_code(code: u8) -> CodecResult<BinaryOp> {
    BinaryOp::ALL
        .get(code as usize)
        .copied()
        .ok_or(CodecError::InvalidField {
            field: "binary operator",
            value: code as u64,
        })
}

fn unary_op_code(op: UnaryOp) -> u8 {
    match op {
        UnaryOp::Neg => 0,
        UnaryOp::Not => 1,
    }
}

fn unary_op_from_code(code: u8) -> CodecResult<UnaryOp> {
    UnaryOp::ALL
        .get(code as usize)
        .copied()
        .ok_or(CodecError::InvalidField {
            field: "unary operator",
            value: code as u64,
        })
}

//endregion

//region Encoding

/// Appends the encoding of `tree` to `out`
pub fn encode_tree(tree: &Node, out: &mut Vec<u8>) -> CodecResult<()> {
    let child_count = u16::try_from(tree.children.len())
        .map_err(|_| CodecError::TooManyChildren(tree.children.len()))?;

    match &tree.kind {
        NodeKind::Literal { value } => {
            put_u8(out, TAG_LITERAL);
            put_u16(out, child_count);
            match value {
                Literal::Int(v) => {
                    put_u8(out, LITERAL_INT);
                    put_i64(out, *v);
                }
                Literal::Float(v) => {
                    put_u8(out, LITERAL_FLOAT);
                    put_f64(out, *v);
                }
                Literal::Bool(v) => {
                    put_u8(out, LITERAL_BOOL);
                    put_u8(out, *v as u8);
                }
            }
        }
        NodeKind::Variable { slot } => {
            put_u8(out, TAG_VARIABLE);
            put_u16(out, child_count);
            put_u16(out, *slot);
        }
        NodeKind::Binary { op } => {
            put_u8(out, TAG_BINARY);
            put_u16(out, child_count);
            put_u8(out, binary_op_code(*op));
        }
        NodeKind::Unary { op } => {
            put_u8(out, TAG_UNARY);
            put_u16(out, child_count);
            put_u8(out, unary_op_code(*op));
        }
        NodeKind::Call { function } => {
            put_u8(out, TAG_CALL);
            put_u16(out, child_count);
            put_u16(out, *function);
        }
        NodeKind::Block => {
            put_u8(out, TAG_BLOCK);
            put_u16(out, child_count);
        }
        NodeKind::If => {
            put_u8(out, TAG_IF);
            put_u16(out, child_count);
        }
        NodeKind::While => {
            put_u8(out, TAG_WHILE);
            put_u16(out, child_count);
        }
        NodeKind::Assign { slot } => {
            put_u8(out, TAG_ASSIGN);
            put_u16(out, child_count);
            put_u16(out, *slot);
        }
        NodeKind::Return => {
            put_u8(out, TAG_RETURN);
            put_u16(out, child_count);
        }
    }

    for child in &tree.children {
        encode_tree(child, out)?;
    }
    Ok(())
}

/// Encodes a tree into a fresh buffer
pub fn tree_to_bytes(tree: &Node) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(tree.node_count() * 6);
    encode_tree(tree, &mut out)?;
    Ok(out)
}

//endregion

//region Decoding

/// Decodes exactly one tree from `bytes` and checks its child schema
pub fn tree_from_bytes(bytes: &[u8]) -> CodecResult<Node> {
    let mut reader = ByteReader::new(bytes);
    let tree = decode_node(&mut reader, 1)?;
    reader.finish()?;
    tree.check_structure()?;
    Ok(tree)
}

fn decode_node(reader: &mut ByteReader<'_>, depth: usize) -> CodecResult<Node> {
    if depth > MAX_DECODE_DEPTH {
        return Err(CodecError::TreeTooDeep {
            max: MAX_DECODE_DEPTH,
        });
    }

    let tag = reader.read_u8()?;
    let child_count = reader.read_u16()? as usize;

    let kind = match tag {
        TAG_LITERAL => {
            let value = match reader.read_u8()? {
                LITERAL_INT => Literal::Int(reader.read_i64()?),
                LITERAL_FLOAT => Literal::Float(reader.read_f64()?),
                LITERAL_BOOL => Literal::Bool(reader.read_u8()? != 0),
                other => {
                    return Err(CodecError::InvalidField {
                        field: "literal type",
                        value: other as u64,
                    })
                }
            };
            NodeKind::Literal { value }
        }
        TAG_VARIABLE => NodeKind::Variable {
            slot: reader.read_u16()?,
        },
        TAG_BINARY => NodeKind::Binary {
            op: binary_op_from_code(reader.read_u8()?)?,
        },
        TAG_UNARY => NodeKind::Unary {
            op: unary_op_from_code(reader.read_u8()?)?,
        },
        TAG_CALL => NodeKind::Call {
            function: reader.read_u16()?,
        },
        TAG_BLOCK => NodeKind::Block,
        TAG_IF => NodeKind::If,
        TAG_WHILE => NodeKind::While,
        TAG_ASSIGN => NodeKind::Assign {
            slot: reader.read_u16()?,
        },
        TAG_RETURN => NodeKind::Return,
        unknown => return Err(CodecError::UnknownNodeKind(unknown)),
    };

    // Every node costs at least 3 bytes, so a count larger than that cannot be honest.
    if child_count * 3 > reader.remaining() {
        return Err(CodecError::Truncated {
            needed: child_count * 3,
            available: reader.remaining(),
        });
    }

    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(decode_node(reader, depth + 1)?);
    }
    Ok(Node::new(kind, children))
}

//endregion
