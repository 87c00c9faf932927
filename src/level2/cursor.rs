//! Bounds-checked sequential reader over a decompressed archive.

use crate::util::{f32_from_be_slice, Error, Integral, Result};

/// Owns the decompressed byte stream and a read position.
///
/// All reads are bounds-checked. Numeric reads decode big-endian fields
/// regardless of host byte order. Failed repositioning leaves the position
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct ByteCursor {
    data: Vec<u8>,
    pos: usize,
}

impl ByteCursor {
    /// Wrap a buffer, positioned at its start.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Bytes left between the position and the end.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read up to `n` bytes. Returns fewer only at the end of the buffer;
    /// the position advances by the number of bytes returned.
    pub fn read(&mut self, n: usize) -> &[u8] {
        let start = self.pos;
        let end = start.saturating_add(n).min(self.data.len());
        self.pos = end;
        &self.data[start..end]
    }

    /// Copy up to `buf.len()` bytes into `buf`, returning the count copied.
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let bytes = self.read(buf.len());
        let n = bytes.len();
        buf[..n].copy_from_slice(bytes);
        n
    }

    /// Read exactly `n` bytes or fail with [`Error::Truncated`] without moving.
    pub fn read_exact(&mut self, n: usize, context: &'static str) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(Error::truncated(context, self.position()));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..start + n])
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N, context)?);
        Ok(out)
    }

    /// Read a big-endian integer field.
    pub fn read_integral<T: Integral>(&mut self) -> Result<T> {
        let bytes = self.read_exact(T::SIZE, "integer field")?;
        Ok(T::from_be_slice(bytes))
    }

    /// Read a big-endian IEEE-754 single.
    pub fn read_float(&mut self) -> Result<f32> {
        let bytes = self.read_exact(4, "float field")?;
        Ok(f32_from_be_slice(bytes))
    }

    /// Look at `n` bytes at `pos` without moving.
    pub fn peek_at(&self, pos: u64, n: usize) -> Option<&[u8]> {
        let start = usize::try_from(pos).ok()?;
        let end = start.checked_add(n)?;
        self.data.get(start..end)
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.seek_signed(self.pos as i128 + n as i128)
    }

    /// Move back by `n` bytes.
    pub fn rewind(&mut self, n: u64) -> Result<()> {
        self.seek_signed(self.pos as i128 - n as i128)
    }

    /// Move to an absolute position. `pos == len()` is allowed (end of buffer).
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.seek_signed(pos as i128)
    }

    /// Move to `base + offset`, for pointer fields relative to a record start.
    pub fn seek_relative(&mut self, base: u64, offset: u64) -> Result<()> {
        self.seek_signed(base as i128 + offset as i128)
    }

    fn seek_signed(&mut self, target: i128) -> Result<()> {
        if target < 0 || target > self.data.len() as i128 {
            return Err(Error::OutOfRange { target, len: self.len() });
        }
        self.pos = target as usize;
        Ok(())
    }
}
