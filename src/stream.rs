//! Byte stream cursor and writer
//!
//! `ByteReader` is a forward-only cursor over a borrowed buffer. Every read checks the
//! remaining length first and fails without consuming anything. A reader owns its
//! position, so each decode works on its own cursor; share the buffer, never the reader.
//!
//! `ByteWriter` is the exact mirror and cannot fail.

use crate::config::CodecLimits;
use crate::error::{Result, WireError};
use crate::types::Hash;
use crate::varint::{decode_varint, encode_varint};

/// Cursor over an immutable byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    limits: CodecLimits,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_limits(data, CodecLimits::default())
    }

    pub fn with_limits(data: &'a [u8], limits: CodecLimits) -> Self {
        Self { data, pos: 0, limits }
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    /// Current cursor offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `n` bytes and advance past them
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(WireError::BufferUnderrun {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Big-endian u16, used for ports (network byte order)
    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Copy exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take_array()
    }

    /// 32-byte hash in internal byte order
    pub fn read_hash(&mut self) -> Result<Hash> {
        self.take_array()
    }

    /// Compact-size integer; the cursor only moves if the whole encoding is valid
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, used) = decode_varint(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    /// Read an element count and check it before the caller allocates.
    ///
    /// The count must not exceed `limit`, and `count * min_element_size` must fit in the
    /// remaining input, so a hostile count fails here instead of in `Vec::with_capacity`.
    pub fn read_count(
        &mut self,
        what: &'static str,
        limit: usize,
        min_element_size: usize,
    ) -> Result<usize> {
        let count = self.read_varint()?;
        if count > limit as u64 {
            return Err(WireError::CountTooLarge { what, count, limit });
        }
        let count = count as usize;
        let needed = count.saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(WireError::BufferUnderrun {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    /// Varint length followed by that many bytes
    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>> {
        let limit = self.limits.max_var_bytes;
        let len = self.read_count("byte run", limit, 1)?;
        self.read_bytes(len)
    }

    pub fn read_var_str(&mut self) -> Result<String> {
        String::from_utf8(self.read_var_bytes()?).map_err(|_| WireError::InvalidUtf8)
    }
}

/// Growable output buffer, mirror of `ByteReader`
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u16_be(&mut self, value: u16) -> &mut Self {
        self.write(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_varint(&mut self, value: u64) -> &mut Self {
        self.write(&encode_varint(value))
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_varint(bytes.len() as u64).write(bytes)
    }

    pub fn write_var_str(&mut self, value: &str) -> &mut Self {
        self.write_var_bytes(value.as_bytes())
    }
}
