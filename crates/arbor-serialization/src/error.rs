// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::MessageKind;
use arbor_ast::AstError;
use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Failures while encoding or decoding wire frames
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("protocol mismatch: expected wire version {expected}, found {found}")]
    ProtocolMismatch { expected: u8, found: u8 },

    #[error("unknown message kind {0}")]
    UnknownMessageKind(u8),

    #[error("expected {expected} message, got {found}")]
    UnexpectedKind {
        expected: MessageKind,
        found: MessageKind,
    },

    #[error("unknown node kind tag {0}")]
    UnknownNodeKind(u8),

    #[error("invalid value {value} for field '{field}'")]
    InvalidField { field: &'static str, value: u64 },

    #[error("truncated frame: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("declared length {declared} does not match payload length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("tree nesting exceeds decoder limit of {max}")]
    TreeTooDeep { max: usize },

    #[error("node has {0} children, more than the wire format allows")]
    TooManyChildren(usize),

    #[error("decoded tree is malformed: {0}")]
    InvalidTree(#[from] AstError),

    #[error("diagnostics are not valid UTF-8")]
    InvalidUtf8,
}

impl CodecError {
    /// Peer speaks a different protocol revision: another wire version or a
    /// node vocabulary this decoder does not know
    pub fn is_protocol_mismatch(&self) -> bool {
        matches!(
            self,
            CodecError::ProtocolMismatch { .. } | CodecError::UnknownNodeKind(_)
        )
    }
}
