//! Binary format constants and structures.

use super::view::ByteView;
use crate::LoadError;

/// Header size in bytes: two little-endian u32 offsets.
pub const HEADER_SIZE: usize = 8;

/// Size of one index entry: start IP (4) + record offset (3).
pub const INDEX_ENTRY_LEN: usize = 7;

/// Size of a redirect pointer.
pub const OFFSET_LEN: usize = 3;

/// Largest offset a redirect pointer can hold.
pub const MAX_OFFSET: usize = 0x00FF_FFFF;

/// Flag byte for a record whose country and area both live elsewhere.
pub const FLAG_REDIRECT_BOTH: u8 = 0x01;

/// Flag byte for a record whose country lives elsewhere.
pub const FLAG_REDIRECT_COUNTRY: u8 = 0x02;

/// How the string data following a flag position is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// No redirect: the flag byte is the first byte of an inline string.
    Inline,
    /// `0x01`: a pointer to a block holding both country and area.
    RedirectCountryAndArea,
    /// `0x02`: a pointer to the country string, area follows the pointer.
    RedirectCountryOnly,
}

impl RedirectMode {
    /// Classify a flag byte.
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            FLAG_REDIRECT_BOTH => RedirectMode::RedirectCountryAndArea,
            FLAG_REDIRECT_COUNTRY => RedirectMode::RedirectCountryOnly,
            _ => RedirectMode::Inline,
        }
    }
}

/// Database header: absolute offsets of the first and last index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseHeader {
    /// Offset of the first index entry
    pub index_begin: u32,
    /// Offset of the last index entry (inclusive)
    pub index_end: u32,
}

impl DatabaseHeader {
    /// Parse and validate the header at the start of `view`.
    pub fn parse(view: &ByteView<'_>) -> Result<Self, LoadError> {
        if view.len() < HEADER_SIZE {
            return Err(LoadError::InvalidFormat(format!(
                "file too small: expected at least {} bytes, got {}",
                HEADER_SIZE,
                view.len()
            )));
        }

        let header = Self {
            index_begin: view.read_u32le(0)?,
            index_end: view.read_u32le(4)?,
        };
        header.validate(view.len())?;

        if header.index_len() % INDEX_ENTRY_LEN != 0 {
            log::warn!(
                "index region {}..={} is not a multiple of {} bytes",
                header.index_begin,
                header.index_end,
                INDEX_ENTRY_LEN
            );
        }

        Ok(header)
    }

    /// Check the offsets against a buffer of `len` bytes.
    pub fn validate(&self, len: usize) -> Result<(), LoadError> {
        if self.index_end < self.index_begin {
            return Err(LoadError::InvalidFormat(format!(
                "index end {} precedes index begin {}",
                self.index_end, self.index_begin
            )));
        }
        let last_entry_end = self.index_end as u64 + INDEX_ENTRY_LEN as u64;
        if last_entry_end > len as u64 {
            return Err(LoadError::InvalidFormat(format!(
                "last index entry at {} runs past end of file ({} bytes)",
                self.index_end, len
            )));
        }
        Ok(())
    }

    /// Byte distance between the first and last index entries.
    pub fn index_len(&self) -> usize {
        (self.index_end - self.index_begin) as usize
    }

    /// Number of index entries.
    pub fn record_count(&self) -> usize {
        self.index_len() / INDEX_ENTRY_LEN + 1
    }

    /// Absolute offset of index entry `slot`.
    pub fn entry_offset(&self, slot: usize) -> usize {
        self.index_begin as usize + slot * INDEX_ENTRY_LEN
    }

    /// Serialize to the on-disk representation.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&self.index_begin.to_le_bytes());
        bytes[4..].copy_from_slice(&self.index_end.to_le_bytes());
        bytes
    }
}
