//! Little-endian binary streams.
//!
//! [`OutputBlob`] only appends. [`InputBlob`] reads through a cursor and
//! checks every read against the remaining length, so a truncated or
//! malformed stream becomes an error instead of an out-of-bounds access.

use crate::error::{Error, ErrorContext, Result};

/// Append-only binary writer.
#[derive(Debug, Clone, Default)]
pub struct OutputBlob {
    data: Vec<u8>,
}

impl OutputBlob {
    /// Creates an empty blob.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends `count` zero bytes.
    pub fn write_zeros(&mut self, count: usize) {
        self.data.resize(self.data.len() + count, 0);
    }

    /// Appends a `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Appends a `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Appends an `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Appends a `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the blob, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Cursor-based binary reader over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct InputBlob<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> InputBlob<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads the next `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if fewer than `count` bytes remain.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Error::unexpected_eof(count, self.remaining())
                .with_context(ErrorContext::new().with_offset(self.pos)));
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Skips `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if fewer than `count` bytes remain.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a `u16`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` on a truncated stream.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads a `u32`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` on a truncated stream.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads an `i32`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` on a truncated stream.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Reads a `u64`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` on a truncated stream.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads an element count and checks that `count * record_size` bytes
    /// are still available.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLength` if the records cannot fit in the stream.
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_count(&mut self, what: &'static str, record_size: usize) -> Result<usize> {
        let offset = self.pos;
        let count = self.read_u32()? as usize;
        match count.checked_mul(record_size) {
            Some(bytes) if bytes <= self.remaining() => Ok(count),
            _ => Err(Error::invalid_length(what, count as i64)
                .with_context(ErrorContext::new().with_section(what).with_offset(offset))),
        }
    }
}
