//! Binary search over the fixed-width record index.

use super::format::{DatabaseHeader, INDEX_ENTRY_LEN};
use super::view::ByteView;
use crate::LookupError;

/// One decoded index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// First address covered by the record
    pub start_ip: u32,
    /// Absolute offset of the record
    pub record_offset: usize,
}

/// Result of an index search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHandle {
    /// Position of the entry in the index
    pub slot: usize,
    /// First address covered by the record
    pub start_ip: u32,
    /// Absolute offset of the record
    pub record_offset: usize,
    /// Whether the queried address lies inside `[start_ip, end_ip]`.
    ///
    /// `false` means the search ended without a containing range and the
    /// last probed entry was returned instead.
    pub exact: bool,
}

/// Sorted index of IP ranges.
#[derive(Debug, Clone, Copy)]
pub struct RecordIndex<'a> {
    view: ByteView<'a>,
    header: DatabaseHeader,
}

impl<'a> RecordIndex<'a> {
    /// Create an index over `view` described by `header`.
    pub fn new(view: ByteView<'a>, header: DatabaseHeader) -> Self {
        Self { view, header }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.header.record_count()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the entry at `slot`.
    pub fn entry(&self, slot: usize) -> Result<IndexEntry, LookupError> {
        let offset = self.header.entry_offset(slot);
        let start_ip = self.view.read_u32le(offset)?;
        let record_offset = self.view.read_u24le(offset + 4)? as usize;
        Ok(IndexEntry {
            start_ip,
            record_offset,
        })
    }

    /// Read the start address of the entry at `slot`.
    pub fn start_ip(&self, slot: usize) -> Result<u32, LookupError> {
        self.view.read_u32le(self.header.entry_offset(slot))
    }

    /// Read the end address stored at the head of a record.
    pub fn end_ip(&self, record_offset: usize) -> Result<u32, LookupError> {
        self.view.read_u32le(record_offset)
    }

    /// Find the entry whose range contains `ip`.
    ///
    /// When no range contains `ip` (a gap, or an address below the first
    /// or above the last range), the entry probed last is returned with
    /// `exact == false`. Databases of this format cover the whole address
    /// space, so callers always get an answer.
    pub fn find(&self, ip: u32) -> Result<RecordHandle, LookupError> {
        if self.is_empty() {
            return Err(LookupError::NotFound);
        }

        let mut low: i64 = 0;
        let mut high: i64 = self.len() as i64 - 1;
        let mut candidate = 0usize;

        while low <= high {
            let mid = ((low + high) / 2) as usize;
            candidate = mid;

            let start_ip = self.start_ip(mid)?;
            if ip < start_ip {
                high = mid as i64 - 1;
                continue;
            }

            let record_offset = self
                .view
                .read_u24le(self.header.entry_offset(mid) + 4)? as usize;
            if ip > self.end_ip(record_offset)? {
                low = mid as i64 + 1;
            } else {
                return Ok(RecordHandle {
                    slot: mid,
                    start_ip,
                    record_offset,
                    exact: true,
                });
            }
        }

        let entry = self.entry(candidate)?;
        Ok(RecordHandle {
            slot: candidate,
            start_ip: entry.start_ip,
            record_offset: entry.record_offset,
            exact: false,
        })
    }

    /// Iterate over all entries in index order.
    pub fn entries(&self) -> impl Iterator<Item = Result<IndexEntry, LookupError>> + 'a {
        let index = *self;
        (0..index.len()).map(move |slot| index.entry(slot))
    }
}
