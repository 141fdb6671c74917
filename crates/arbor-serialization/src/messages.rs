// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed messages exchanged between the coordinator and workers
//!
//! # Format
//! - Task: `individual_id:u64, ast:bytes, eval_config:bytes`
//! - Result: `individual_id:u64, status:u8, fitness:f64, diagnostics:bytes`
//! - Abort: `scope:u8, individual_id:u64`
//!
//! `bytes` fields are prefixed with a `u32` length. An empty diagnostics field
//! means no diagnostics were attached.

use crate::bytes::{put_f64, put_prefixed, put_u32, put_u64, put_u8, ByteReader};
use crate::envelope::{open, seal};
use crate::tree_codec::{tree_from_bytes, tree_to_bytes};
use crate::{CodecError, CodecResult, MessageKind};
use arbor_ast::Node;
use std::fmt::{Display, Formatter};

//region Evaluation Config

/// Execution parameters shipped with every task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Wall-clock budget for a single execution
    pub time_budget_ms: u64,
    /// Interpreter step budget, 0 for unlimited
    pub max_steps: u64,
    /// Number of executions to average over
    pub repeats: u32,
    pub generation: u64,
    /// Zero-based resend counter
    pub attempt: u32,
}

impl EvaluationConfig {
    pub const BYTE_COUNT: usize = 32; // u64, u64, u32, u64, u32

    fn encode(&self, out: &mut Vec<u8>) {
        put_u64(out, self.time_budget_ms);
        put_u64(out, self.max_steps);
        put_u32(out, self.repeats);
        put_u64(out, self.generation);
        put_u32(out, self.attempt);
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let config = Self {
            time_budget_ms: reader.read_u64()?,
            max_steps: reader.read_u64()?,
            repeats: reader.read_u32()?,
            generation: reader.read_u64()?,
            attempt: reader.read_u32()?,
        };
        reader.finish()?;
        Ok(config)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 1000,
            max_steps: 0,
            repeats: 1,
            generation: 0,
            attempt: 0,
        }
    }
}

//endregion

//region Task

#[derive(Debug, Clone, PartialEq)]
pub struct TaskMessage {
    pub individual_id: u64,
    pub ast: Node,
    pub config: EvaluationConfig,
}

impl TaskMessage {
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        let ast = tree_to_bytes(&self.ast)?;
        let mut config = Vec::with_capacity(EvaluationConfig::BYTE_COUNT);
        self.config.encode(&mut config);

        let mut payload = Vec::with_capacity(16 + ast.len() + config.len());
        put_u64(&mut payload, self.individual_id);
        put_prefixed(&mut payload, &ast);
        put_prefixed(&mut payload, &config);
        Ok(seal(MessageKind::Task, &payload))
    }

    fn decode_payload(payload: &[u8]) -> CodecResult<Self> {
        let mut reader = ByteReader::new(payload);
        let individual_id = reader.read_u64()?;
        let ast = tree_from_bytes(reader.read_prefixed()?)?;
        let config = EvaluationConfig::decode(reader.read_prefixed()?)?;
        reader.finish()?;
        Ok(Self {
            individual_id,
            ast,
            config,
        })
    }
}

//endregion

//region Result

/// Outcome class reported by a worker
#[repr(u8)]
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum ResultStatus {
    /// Execution finished and `fitness` is meaningful
    Ok = 0u8,
    /// The program failed while running (error, budget exhausted)
    RuntimeError = 1u8,
    /// The task could not be decoded or the program was rejected before running
    Malformed = 2u8,
}

impl TryFrom<u8> for ResultStatus {
    type Error = CodecError;
    fn try_from(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(ResultStatus::Ok),
            1 => Ok(ResultStatus::RuntimeError),
            2 => Ok(ResultStatus::Malformed),
            _ => Err(CodecError::InvalidField {
                field: "result status",
                value: value as u64,
            }),
        }
    }
}

impl Display for ResultStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResultStatus::Ok => "OK",
            ResultStatus::RuntimeError => "RUNTIME_ERROR",
            ResultStatus::Malformed => "MALFORMED",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultMessage {
    pub individual_id: u64,
    pub status: ResultStatus,
    pub fitness: f64,
    pub diagnostics: Option<String>,
}

impl ResultMessage {
    pub fn ok(individual_id: u64, fitness: f64) -> Self {
        Self {
            individual_id,
            status: ResultStatus::Ok,
            fitness,
            diagnostics: None,
        }
    }

    pub fn failure(individual_id: u64, status: ResultStatus, reason: impl Into<String>) -> Self {
        Self {
            individual_id,
            status,
            fitness: f64::NAN,
            diagnostics: Some(reason.into()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let diagnostics = self.diagnostics.as_deref().unwrap_or("").as_bytes();
        let mut payload = Vec::with_capacity(21 + diagnostics.len());
        put_u64(&mut payload, self.individual_id);
        put_u8(&mut payload, self.status as u8);
        put_f64(&mut payload, self.fitness);
        put_prefixed(&mut payload, diagnostics);
        seal(MessageKind::Result, &payload)
    }

    fn decode_payload(payload: &[u8]) -> CodecResult<Self> {
        let mut reader = ByteReader::new(payload);
        let individual_id = reader.read_u64()?;
        let status = ResultStatus::try_from(reader.read_u8()?)?;
        let fitness = reader.read_f64()?;
        let diagnostics = reader.read_prefixed()?;
        reader.finish()?;

        let diagnostics = if diagnostics.is_empty() {
            None
        } else {
            Some(
                std::str::from_utf8(diagnostics)
                    .map_err(|_| CodecError::InvalidUtf8)?
                    .to_string(),
            )
        };
        Ok(Self {
            individual_id,
            status,
            fitness,
            diagnostics,
        })
    }
}

//endregion

//region Abort

const ABORT_SCOPE_ONE: u8 = 0;
const ABORT_SCOPE_ALL: u8 = 1;

/// Cancellation notice; workers may ignore it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortMessage {
    Individual(u64),
    All,
}

impl AbortMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(9);
        match self {
            AbortMessage::Individual(id) => {
                put_u8(&mut payload, ABORT_SCOPE_ONE);
                put_u64(&mut payload, *id);
            }
            AbortMessage::All => {
                put_u8(&mut payload, ABORT_SCOPE_ALL);
                put_u64(&mut payload, 0);
            }
        }
        seal(MessageKind::Abort, &payload)
    }

    fn decode_payload(payload: &[u8]) -> CodecResult<Self> {
        let mut reader = ByteReader::new(payload);
        let scope = reader.read_u8()?;
        let id = reader.read_u64()?;
        reader.finish()?;
        match scope {
            ABORT_SCOPE_ONE => Ok(AbortMessage::Individual(id)),
            ABORT_SCOPE_ALL => Ok(AbortMessage::All),
            other => Err(CodecError::InvalidField {
                field: "abort scope",
                value: other as u64,
            }),
        }
    }
}

//endregion

//region Wire Message

/// Any decoded frame
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Task(TaskMessage),
    Result(ResultMessage),
    Abort(AbortMessage),
}

impl WireMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            WireMessage::Task(_) => MessageKind::Task,
            WireMessage::Result(_) => MessageKind::Result,
            WireMessage::Abort(_) => MessageKind::Abort,
        }
    }

    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        match self {
            WireMessage::Task(task) => task.to_bytes(),
            WireMessage::Result(result) => Ok(result.to_bytes()),
            WireMessage::Abort(abort) => Ok(abort.to_bytes()),
        }
    }

    /// Decodes a full frame, header included
    pub fn try_from_bytes(frame: &[u8]) -> CodecResult<Self> {
        let (kind, payload) = open(frame)?;
        match kind {
            MessageKind::Task => Ok(WireMessage::Task(TaskMessage::decode_payload(payload)?)),
            MessageKind::Result => Ok(WireMessage::Result(ResultMessage::decode_payload(
                payload,
            )?)),
            MessageKind::Abort => Ok(WireMessage::Abort(AbortMessage::decode_payload(payload)?)),
        }
    }

    /// Decodes a frame that must be a result
    pub fn try_result_from_bytes(frame: &[u8]) -> CodecResult<ResultMessage> {
        match Self::try_from_bytes(frame)? {
            WireMessage::Result(result) => Ok(result),
            other => Err(CodecError::UnexpectedKind {
                expected: MessageKind::Result,
                found: other.kind(),
            }),
        }
    }
}

//endregion
