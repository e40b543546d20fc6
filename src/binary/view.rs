//! Bounds-checked little-endian reads over the database buffer.

use crate::LookupError;

/// Read-only view over a database image.
///
/// Every accessor checks `offset + width <= len` before touching the
/// buffer and reports [`LookupError::OutOfBounds`] otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    data: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// Wrap a buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The underlying buffer.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Borrow exactly `width` bytes at `offset`.
    pub fn bytes(&self, offset: usize, width: usize) -> Result<&'a [u8], LookupError> {
        let end = offset
            .checked_add(width)
            .filter(|&end| end <= self.data.len())
            .ok_or(LookupError::OutOfBounds {
                offset,
                width,
                len: self.data.len(),
            })?;
        Ok(&self.data[offset..end])
    }

    /// Read one byte.
    pub fn read_u8(&self, offset: usize) -> Result<u8, LookupError> {
        Ok(self.bytes(offset, 1)?[0])
    }

    /// Read a 3-byte little-endian integer.
    pub fn read_u24le(&self, offset: usize) -> Result<u32, LookupError> {
        let b = self.bytes(offset, 3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    /// Read a 4-byte little-endian integer.
    pub fn read_u32le(&self, offset: usize) -> Result<u32, LookupError> {
        let b = self.bytes(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a NUL-terminated string starting at `offset`.
    ///
    /// The terminator is not included. A string that runs to the end of
    /// the buffer without a terminator is returned as-is.
    pub fn read_cstring(&self, offset: usize) -> Result<&'a [u8], LookupError> {
        if offset >= self.data.len() {
            return Err(LookupError::OutOfBounds {
                offset,
                width: 1,
                len: self.data.len(),
            });
        }
        let rest = &self.data[offset..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        Ok(&rest[..len])
    }
}
