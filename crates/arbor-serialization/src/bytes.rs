// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounds-checked little-endian cursor over a received frame

use crate::{CodecError, CodecResult};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub(crate) fn take(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(CodecError::Truncated {
                needed: count,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16(&mut self) -> CodecResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub(crate) fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub(crate) fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub(crate) fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub(crate) fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// `u32` length followed by that many bytes
    pub(crate) fn read_prefixed(&mut self) -> CodecResult<&'a [u8]> {
        let length = self.read_u32()? as usize;
        self.take(length)
    }

    /// Fails if any bytes were left unread
    pub(crate) fn finish(self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(CodecError::TrailingBytes(extra)),
        }
    }
}

// Writes into a Vec<u8> cannot fail, so the io::Result from WriteBytesExt is dropped here.

pub(crate) fn put_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub(crate) fn put_u16(out: &mut Vec<u8>, value: u16) {
    let _ = out.write_u16::<LittleEndian>(value);
}

pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32) {
    let _ = out.write_u32::<LittleEndian>(value);
}

pub(crate) fn put_u64(out: &mut Vec<u8>, value: u64) {
    let _ = out.write_u64::<LittleEndian>(value);
}

pub(crate) fn put_i64(out: &mut Vec<u8>, value: i64) {
    let _ = out.write_i64::<LittleEndian>(value);
}

pub(crate) fn put_f64(out: &mut Vec<u8>, value: f64) {
    let _ = out.write_f64::<LittleEndian>(value);
}

pub(crate) fn put_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reports_truncation() {
        let bytes = [1u8, 0, 0];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u16().unwrap(), 1);
        assert_eq!(
            reader.read_u32(),
            Err(CodecError::Truncated {
                needed: 4,
                available: 1
            })
        );
    }

    #[test]
    fn test_prefixed_and_trailing() {
        let mut out = Vec::new();
        put_prefixed(&mut out, b"abc");
        put_u8(&mut out, 9);

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_prefixed().unwrap(), b"abc");
        assert_eq!(reader.finish(), Err(CodecError::TrailingBytes(1)));
    }
}
