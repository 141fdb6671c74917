// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::bytes::{put_u32, put_u8, ByteReader};
use crate::{CodecError, CodecResult, MessageKind};
use byteorder::{ByteOrder, LittleEndian};

/// Current version of the wire format, first byte of every frame
pub const WIRE_VERSION: u8 = 1;

/// version (u8) + kind (u8) + payload length (u32)
pub const HEADER_BYTE_COUNT: usize = 6;

/// Prepends the frame header to `payload`
pub fn seal(kind: MessageKind, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_BYTE_COUNT + payload.len());
    put_u8(&mut frame, WIRE_VERSION);
    put_u8(&mut frame, kind as u8);
    put_u32(&mut frame, payload.len() as u32);
    frame.extend_from_slice(payload);
    frame
}

/// Validates the header of `frame` and returns its kind and payload
///
/// # Example
/// ```
/// use arbor_serialization::{open, seal, MessageKind};
///
/// let frame = seal(MessageKind::Abort, &[1, 2, 3]);
/// let (kind, payload) = open(&frame).unwrap();
/// assert_eq!(kind, MessageKind::Abort);
/// assert_eq!(payload, &[1, 2, 3]);
/// ```
pub fn open(frame: &[u8]) -> CodecResult<(MessageKind, &[u8])> {
    let mut reader = ByteReader::new(frame);
    let version = reader.read_u8()?;
    if version != WIRE_VERSION {
        return Err(CodecError::ProtocolMismatch {
            expected: WIRE_VERSION,
            found: version,
        });
    }
    let kind = MessageKind::try_from(reader.read_u8()?)?;
    let declared = reader.read_u32()? as usize;
    let actual = reader.remaining();
    if declared != actual {
        return Err(CodecError::LengthMismatch { declared, actual });
    }
    Ok((kind, reader.take(actual)?))
}

/// Best-effort recovery of the individual id from a frame that failed to decode.
///
/// Task and result payloads both start with the id, so as long as the kind byte
/// is recognizable and enough bytes are present the id can be read regardless
/// of the version byte.
pub fn peek_individual_id(frame: &[u8], expected: MessageKind) -> Option<u64> {
    if frame.len() < HEADER_BYTE_COUNT + 8 {
        return None;
    }
    if frame[1] != expected as u8 || expected == MessageKind::Abort {
        return None;
    }
    Some(LittleEndian::read_u64(
        &frame[HEADER_BYTE_COUNT..HEADER_BYTE_COUNT + 8],
    ))
}
