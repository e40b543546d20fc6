//! Memory-mapped database reader.

use memmap2::Mmap;
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::Path;

use super::format::DatabaseHeader;
use super::index::{RecordHandle, RecordIndex};
use super::resolver::RedirectResolver;
use super::view::ByteView;
use crate::encoding::Encoding;
use crate::location::{Location, LocationBuf};
use crate::{LoadError, LookupError};

/// A loaded IP location database.
///
/// The database owns its read-only mapping for its whole lifetime.
/// Lookups borrow from it, so results cannot outlive the mapping, and
/// any number of threads may look up concurrently.
pub struct Database {
    mmap: Mmap,
    header: DatabaseHeader,
}

/// One decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// First address of the range
    pub start_ip: Ipv4Addr,
    /// Last address of the range
    pub end_ip: Ipv4Addr,
    /// Location strings
    pub location: Location<'a>,
}

/// Summary of a loaded database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    /// Number of index entries
    pub record_count: usize,
    /// Offset of the first index entry
    pub index_begin: u32,
    /// Offset of the last index entry
    pub index_end: u32,
    /// File size in bytes
    pub size: usize,
    /// Location of the last record, which holds the release label in
    /// published databases
    pub version: Option<LocationBuf>,
}

impl Database {
    /// Open and map a database file.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let db = Self::from_mmap(mmap)?;

        log::debug!(
            "Loaded {} records from {:?} ({} bytes)",
            db.record_count(),
            path,
            db.mmap.len()
        );

        Ok(db)
    }

    /// Load a database image from bytes.
    ///
    /// This writes the data to a temp file and then memory-maps it.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        use std::io::Write;

        // Validate before touching the filesystem
        DatabaseHeader::parse(&ByteView::new(&data))?;

        let mut temp_file = tempfile::tempfile()?;
        temp_file.write_all(&data)?;

        let mmap = unsafe { Mmap::map(&temp_file)? };
        Self::from_mmap(mmap)
    }

    fn from_mmap(mmap: Mmap) -> Result<Self, LoadError> {
        let header = DatabaseHeader::parse(&ByteView::new(&mmap))?;
        Ok(Self { mmap, header })
    }

    /// The parsed header.
    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    /// Number of records.
    pub fn record_count(&self) -> usize {
        self.header.record_count()
    }

    /// Raw database image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Bounds-checked view over the image.
    pub fn view(&self) -> ByteView<'_> {
        ByteView::new(&self.mmap)
    }

    /// The record index.
    pub fn index(&self) -> RecordIndex<'_> {
        RecordIndex::new(self.view(), self.header)
    }

    /// The redirect resolver.
    pub fn resolver(&self) -> RedirectResolver<'_> {
        RedirectResolver::new(self.view())
    }

    /// Look up a dotted-quad IPv4 address.
    pub fn lookup(&self, ip: &str) -> Result<Location<'_>, LookupError> {
        let addr: Ipv4Addr = ip
            .parse()
            .map_err(|_| LookupError::InvalidInput(ip.to_string()))?;
        self.lookup_ip(addr)
    }

    /// Look up the province and city of an address, decoded from `encoding`.
    ///
    /// Both are empty for addresses outside mainland China.
    pub fn lookup_province_city(
        &self,
        ip: &str,
        encoding: Encoding,
    ) -> crate::Result<(String, String)> {
        Ok(self.lookup(ip)?.decode(encoding)?.province_city())
    }

    /// Look up an IPv4 address.
    pub fn lookup_ip(&self, ip: Ipv4Addr) -> Result<Location<'_>, LookupError> {
        self.lookup_u32(u32::from(ip))
    }

    /// Look up an address in host order.
    pub fn lookup_u32(&self, ip: u32) -> Result<Location<'_>, LookupError> {
        let handle = self.find(ip)?;
        self.resolver().resolve(handle.record_offset)
    }

    /// Find the index entry for an address in host order.
    pub fn find(&self, ip: u32) -> Result<RecordHandle, LookupError> {
        self.index().find(ip)
    }

    /// Decode the record at index `slot`.
    pub fn record(&self, slot: usize) -> Result<Record<'_>, LookupError> {
        if slot >= self.record_count() {
            return Err(LookupError::NotFound);
        }
        let index = self.index();
        let entry = index.entry(slot)?;
        let end_ip = index.end_ip(entry.record_offset)?;
        let location = self.resolver().resolve(entry.record_offset)?;
        Ok(Record {
            start_ip: Ipv4Addr::from(entry.start_ip),
            end_ip: Ipv4Addr::from(end_ip),
            location,
        })
    }

    /// Iterate over all records in index order.
    pub fn records(&self) -> impl Iterator<Item = Result<Record<'_>, LookupError>> + '_ {
        (0..self.record_count()).map(move |slot| self.record(slot))
    }

    /// Check the whole index.
    ///
    /// Fails if start addresses are not ascending, a range is inverted,
    /// or any record cannot be decoded. Records with an empty country
    /// are tolerated.
    pub fn verify(&self) -> Result<(), LoadError> {
        let index = self.index();
        let mut previous: Option<u32> = None;

        for slot in 0..index.len() {
            let entry = index.entry(slot)?;
            if let Some(prev) = previous {
                if entry.start_ip < prev {
                    return Err(LoadError::InvalidFormat(format!(
                        "index not sorted: entry {} starts at {} after {}",
                        slot,
                        Ipv4Addr::from(entry.start_ip),
                        Ipv4Addr::from(prev)
                    )));
                }
            }
            previous = Some(entry.start_ip);

            let end_ip = index.end_ip(entry.record_offset)?;
            if end_ip < entry.start_ip {
                return Err(LoadError::InvalidFormat(format!(
                    "entry {} has inverted range {}-{}",
                    slot,
                    Ipv4Addr::from(entry.start_ip),
                    Ipv4Addr::from(end_ip)
                )));
            }

            match self.resolver().resolve(entry.record_offset) {
                Ok(_) | Err(LookupError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Summarize the database.
    pub fn info(&self) -> DatabaseInfo {
        let last = self.record_count() - 1;
        let version = match self.record(last) {
            Ok(record) => Some(record.location.to_buf()),
            Err(LookupError::NotFound) => None,
            Err(e) => {
                log::warn!("Cannot decode version record {}: {}", last, e);
                None
            }
        };

        DatabaseInfo {
            record_count: self.record_count(),
            index_begin: self.header.index_begin,
            index_end: self.header.index_end,
            size: self.mmap.len(),
            version,
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("header", &self.header)
            .field("size", &self.mmap.len())
            .finish()
    }
}
