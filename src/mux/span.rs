//! Byte ranges with optional bounds
//!
//! `offset` defaults to 0 and `length` to "everything that remains" (for
//! reads) or "all supplied data" (for writes).

use crate::error::{MuxError, Result};

/// A global byte range whose length may be left open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// First global offset
    pub offset: u64,
    /// Number of bytes; `None` means the default for the operation
    pub length: Option<u64>,
}

impl Span {
    /// The whole address space
    pub const fn all() -> Self {
        Self {
            offset: 0,
            length: None,
        }
    }

    /// From `offset` to the end
    pub const fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            length: None,
        }
    }

    /// Exactly `length` bytes at `offset`
    pub const fn new(offset: u64, length: u64) -> Self {
        Self {
            offset,
            length: Some(length),
        }
    }

    /// Concrete `(offset, length)` for a read over `total` bytes
    pub(crate) fn for_read(self, total: u64) -> Result<(u64, u64)> {
        let length = match self.length {
            Some(length) => length,
            None => total
                .checked_sub(self.offset)
                .ok_or_else(|| MuxError::out_of_bounds(self.offset, 0, total))?,
        };
        check_bounds(self.offset, length, total)?;
        Ok((self.offset, length))
    }

    /// Concrete `(offset, length)` for a write of `data_len` bytes over `total`
    pub(crate) fn for_write(self, data_len: u64, total: u64) -> Result<(u64, u64)> {
        let length = self.length.unwrap_or(data_len);
        if length > data_len {
            return Err(MuxError::LengthExceedsData {
                length,
                available: data_len,
            });
        }
        check_bounds(self.offset, length, total)?;
        Ok((self.offset, length))
    }
}

/// `offset + length` must not run past `total`
pub(crate) fn check_bounds(offset: u64, length: u64, total: u64) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= total => Ok(()),
        _ => Err(MuxError::out_of_bounds(offset, length, total)),
    }
}
