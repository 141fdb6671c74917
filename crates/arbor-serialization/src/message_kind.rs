// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{CodecError, CodecResult};
use std::fmt::{Display, Formatter};

/// Type of a wire frame, stored in the second header byte.
///
/// # Example
/// ```
/// use arbor_serialization::MessageKind;
///
/// assert_eq!(MessageKind::Task as u8, 1);
/// assert_eq!(MessageKind::try_from(2u8).unwrap(), MessageKind::Result);
/// assert!(MessageKind::try_from(200u8).is_err());
/// ```
#[repr(u8)]
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum MessageKind {
    /// Coordinator asks a worker to evaluate one individual
    Task = 1u8,

    /// Worker reports the outcome of one task
    Result = 2u8,

    /// Coordinator withdraws one task, or all of them
    Abort = 3u8,
}

impl MessageKind {
    /// Reads the kind byte of a framed message without validating the rest
    pub fn try_get_kind_from_frame(bytes: &[u8]) -> CodecResult<MessageKind> {
        if bytes.len() < 2 {
            return Err(CodecError::Truncated {
                needed: 2,
                available: bytes.len(),
            });
        }
        MessageKind::try_from(bytes[1])
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = CodecError;
    fn try_from(value: u8) -> Result<Self, CodecError> {
        match value {
            1 => Ok(MessageKind::Task),
            2 => Ok(MessageKind::Result),
            3 => Ok(MessageKind::Abort),
            _ => Err(CodecError::UnknownMessageKind(value)),
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageKind::Task => "TASK",
            MessageKind::Result => "RESULT",
            MessageKind::Abort => "ABORT",
        };
        write!(f, "{name}")
    }
}
