// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Arbor Wire Format
//!
//! Versioned binary framing for the messages that travel between the evolution
//! coordinator and its workers.
//!
//! ## Frame layout
//!
//! ```text
//! +---------+------+--------------+-------------------+
//! | version | kind | length (u32) | payload (length)  |
//! +---------+------+--------------+-------------------+
//! ```
//!
//! All integers are little-endian. A frame whose version byte differs from
//! [`WIRE_VERSION`] is rejected with [`CodecError::ProtocolMismatch`].
//!
//! ## Basic Usage
//!
//! ```rust
//! use arbor_ast::{BinaryOp, Node};
//! use arbor_serialization::{EvaluationConfig, TaskMessage, WireMessage};
//!
//! let task = TaskMessage {
//!     individual_id: 1,
//!     ast: Node::binary(BinaryOp::Add, Node::var(0), Node::int(1)),
//!     config: EvaluationConfig::default(),
//! };
//! let frame = task.to_bytes().unwrap();
//! assert!(matches!(WireMessage::try_from_bytes(&frame), Ok(WireMessage::Task(_))));
//! ```

mod bytes;
mod envelope;
mod error;
mod message_kind;
mod messages;
pub mod tree_codec;

pub use envelope::{open, peek_individual_id, seal, HEADER_BYTE_COUNT, WIRE_VERSION};
pub use error::{CodecError, CodecResult};
pub use message_kind::MessageKind;
pub use messages::{
    AbortMessage, EvaluationConfig, ResultMessage, ResultStatus, TaskMessage, WireMessage,
};
pub use tree_codec::{tree_from_bytes, tree_to_bytes};
