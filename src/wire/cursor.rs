//! Byte cursor over a DNS message buffer.

use super::DecodeError;

/// A monotonically advancing read position over a fixed buffer.
///
/// All multi-byte reads are big-endian, as everywhere in the DNS wire
/// format. A read that would run past the end of the buffer returns
/// [`DecodeError::TruncatedMessage`]; the cursor is left unchanged in
/// that case.
///
/// Cursors are cheap to copy. [`Cursor::fork`] yields an independent
/// cursor over the same buffer, which is how compression pointers are
/// followed without disturbing the primary read position.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// An independent cursor over the same buffer, positioned at `at`.
    pub fn fork(&self, at: usize) -> Cursor<'a> {
        Cursor { buf: self.buf, pos: at }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Move the read position to an absolute offset within the buffer.
    pub fn seek(&mut self, at: usize) -> Result<(), DecodeError> {
        if at > self.buf.len() {
            return Err(DecodeError::TruncatedMessage);
        }
        self.pos = at;
        Ok(())
    }

    /// Advance the read position by exactly `n` bytes.
    pub fn advance(&mut self, n: usize) -> Result<(), DecodeError> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    fn ensure(&self, width: usize) -> Result<(), DecodeError> {
        if self.remaining() < width {
            return Err(DecodeError::TruncatedMessage);
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        let value = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        let value = u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(value)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_u32()? as i32)
    }

    /// The next `len` bytes as a slice, advancing past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}
