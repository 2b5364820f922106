//! Byte cursor for protocol primitives.
//!
//! Integers are big-endian, VarInts use the protocol's 7-bit groups, and
//! strings are VarInt byte-length prefixed UTF-8.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Maximum string length in characters.
pub const MAX_STRING_LENGTH: usize = 32767;

const MAX_VARINT_BYTES: usize = 5;
const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Growable write side with a hard size limit.
#[derive(Debug)]
pub struct PacketWriter {
    buf: BytesMut,
    limit: usize,
}

impl PacketWriter {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        let size = self.buf.len() + additional;
        if size > self.limit {
            return Err(CodecError::PacketTooLarge {
                size,
                limit: self.limit,
            });
        }
        self.buf.reserve(additional);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.reserve(4)?;
        self.buf.put_i32(value);
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.reserve(8)?;
        self.buf.put_i64(value);
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.reserve(4)?;
        self.buf.put_f32(value);
        Ok(())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.reserve(8)?;
        self.buf.put_f64(value);
        Ok(())
    }

    pub fn write_var_int(&mut self, value: i32) -> Result<()> {
        let mut value = value as u32;
        loop {
            if value & !(SEGMENT_BITS as u32) == 0 {
                return self.write_u8(value as u8);
            }
            self.write_u8((value as u8 & SEGMENT_BITS) | CONTINUE_BIT)?;
            value >>= 7;
        }
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let length = value.chars().count();
        if length > MAX_STRING_LENGTH {
            return Err(CodecError::StringTooLong {
                length,
                max: MAX_STRING_LENGTH,
            });
        }
        self.write_var_int(value.len() as i32)?;
        self.write_bytes(value.as_bytes())
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.reserve(value.len())?;
        self.buf.put_slice(value);
        Ok(())
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Read side over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct PacketReader {
    buf: Bytes,
}

impl PacketReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn need(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(CodecError::UnexpectedEof {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.need(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    pub fn read_var_int(&mut self) -> Result<i32> {
        let mut value: u32 = 0;
        for position in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            value |= ((byte & SEGMENT_BITS) as u32) << (7 * position);
            if byte & CONTINUE_BIT == 0 {
                return Ok(value as i32);
            }
        }
        Err(CodecError::VarIntTooBig)
    }

    /// Reads a VarInt that must not be negative.
    pub fn read_length(&mut self) -> Result<usize> {
        let length = self.read_var_int()?;
        usize::try_from(length).map_err(|_| CodecError::NegativeLength(length))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_length()?;
        // Each character takes at most three bytes on the wire.
        if length > MAX_STRING_LENGTH * 3 {
            return Err(CodecError::StringTooLong {
                length,
                max: MAX_STRING_LENGTH * 3,
            });
        }
        let bytes = self.read_bytes(length)?;
        let value = String::from_utf8(bytes.to_vec())?;
        let chars = value.chars().count();
        if chars > MAX_STRING_LENGTH {
            return Err(CodecError::StringTooLong {
                length: chars,
                max: MAX_STRING_LENGTH,
            });
        }
        Ok(value)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<Bytes> {
        self.need(length)?;
        Ok(self.buf.split_to(length))
    }

    /// Runs `read` and returns the exact bytes it consumed.
    pub fn capture<F>(&mut self, read: F) -> Result<Bytes>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let snapshot = self.buf.clone();
        read(self)?;
        let consumed = snapshot.len() - self.buf.len();
        Ok(snapshot.slice(..consumed))
    }
}
