//! Byte-aligned MSB-first bit fields.
//!
//! Every field occupies `ceil(len / 8)` bytes. The value is left-justified so
//! its bits sit at the high end of the first byte and the unused low bits of
//! the last byte are zero.

use crate::error::{CellPackError, Result};
use bytes::{BufMut, BytesMut};

/// Widest field the format can hold.
pub(crate) const MAX_FIELD_BITS: u32 = 64;

pub(crate) const fn field_bytes(len: u32) -> usize {
    len.div_ceil(8) as usize
}

/// Append the low `len` bits of `value`.
pub(crate) fn put_field(buf: &mut BytesMut, value: u64, len: u32) {
    debug_assert!(len <= MAX_FIELD_BITS);
    debug_assert!(len == 64 || value >> len == 0);

    let nbytes = field_bytes(len);
    if nbytes == 0 {
        return;
    }
    let aligned = (value as u128) << (nbytes as u32 * 8 - len);
    let be = aligned.to_be_bytes();
    buf.put_slice(&be[be.len() - nbytes..]);
}

/// Cursor over a packed byte string.
pub(crate) struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or_else(|| {
            CellPackError::Malformed(format!("unexpected end of input at byte {}", self.pos))
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a `len`-bit field written by [`put_field`].
    pub(crate) fn read_field(&mut self, len: u32) -> Result<u64> {
        if len > MAX_FIELD_BITS {
            return Err(CellPackError::Malformed(format!(
                "field length {} exceeds {} bits",
                len, MAX_FIELD_BITS
            )));
        }

        let nbytes = field_bytes(len);
        let end = self.pos + nbytes;
        let chunk = self.data.get(self.pos..end).ok_or_else(|| {
            CellPackError::Malformed(format!(
                "{}-bit field at byte {} runs past end of input ({} bytes)",
                len,
                self.pos,
                self.data.len()
            ))
        })?;

        let aligned = chunk
            .iter()
            .fold(0u128, |acc, &byte| (acc << 8) | byte as u128);
        let spare = nbytes as u32 * 8 - len;
        if spare > 0 && aligned & ((1u128 << spare) - 1) != 0 {
            return Err(CellPackError::Malformed(format!(
                "non-zero padding bits in field at byte {}",
                self.pos
            )));
        }

        self.pos = end;
        Ok((aligned >> spare) as u64)
    }
}
