//! Database file writer.
//!
//! Records are written first, directly after the header, and the sorted
//! index goes at the end of the file. Repeated strings are shared through
//! redirect pointers.

use ahash::AHashMap;
use std::net::Ipv4Addr;

use super::format::*;
use crate::{Error, Result};

/// How a record's strings are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordLayout {
    /// Share any country, area or country+area pair already written
    #[default]
    Auto,
    /// Country and area stored inline in the record
    Inline,
    /// `0x02`: country stored elsewhere, area inline
    CountryRedirect,
    /// `0x01`: country and area stored together elsewhere
    FullRedirect,
}

/// One IP range to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEntry {
    /// First address (host order)
    pub start_ip: u32,
    /// Last address (host order)
    pub end_ip: u32,
    /// Country bytes in the database encoding
    pub country: Vec<u8>,
    /// Area bytes in the database encoding
    pub area: Vec<u8>,
    /// String layout
    pub layout: RecordLayout,
}

impl RangeEntry {
    /// Create an entry with the default layout.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr, country: &[u8], area: &[u8]) -> Self {
        Self {
            start_ip: start.into(),
            end_ip: end.into(),
            country: country.to_vec(),
            area: area.to_vec(),
            layout: RecordLayout::Auto,
        }
    }

    /// Set the string layout.
    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.start_ip > self.end_ip {
            return Err(Error::InvalidRange {
                start: self.start_ip.into(),
                end: self.end_ip.into(),
                reason: "start is after end".to_string(),
            });
        }
        if self.country.is_empty() {
            return Err(Error::InvalidString("country must not be empty".to_string()));
        }
        validate_string(&self.country)?;
        validate_string(&self.area)
    }
}

/// A string must not contain NUL and must not start with a flag byte.
fn validate_string(s: &[u8]) -> Result<()> {
    if s.contains(&0) {
        return Err(Error::InvalidString(format!(
            "{:?} contains a NUL byte",
            String::from_utf8_lossy(s)
        )));
    }
    if matches!(s.first(), Some(&FLAG_REDIRECT_BOTH) | Some(&FLAG_REDIRECT_COUNTRY)) {
        return Err(Error::InvalidString(format!(
            "{:?} starts with a redirect flag byte",
            String::from_utf8_lossy(s)
        )));
    }
    Ok(())
}

/// Database writer.
#[derive(Debug, Default)]
pub struct DatabaseWriter {
    entries: Vec<RangeEntry>,
}

impl DatabaseWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range with the default layout.
    pub fn add_range(
        &mut self,
        start: Ipv4Addr,
        end: Ipv4Addr,
        country: &[u8],
        area: &[u8],
    ) -> Result<()> {
        self.add_entry(RangeEntry::new(start, end, country, area))
    }

    /// Add a range with an explicit layout.
    pub fn add_range_with_layout(
        &mut self,
        start: Ipv4Addr,
        end: Ipv4Addr,
        country: &[u8],
        area: &[u8],
        layout: RecordLayout,
    ) -> Result<()> {
        self.add_entry(RangeEntry::new(start, end, country, area).with_layout(layout))
    }

    /// Add a prepared entry.
    pub fn add_entry(&mut self, entry: RangeEntry) -> Result<()> {
        entry.validate()?;
        self.entries.push(entry);
        Ok(())
    }

    /// Number of ranges added.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no ranges were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the database.
    pub fn build(&self) -> Result<Vec<u8>> {
        if self.entries.is_empty() {
            return Err(Error::EmptyDatabase);
        }

        let mut sorted: Vec<&RangeEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.start_ip);
        for pair in sorted.windows(2) {
            if pair[1].start_ip <= pair[0].end_ip {
                return Err(Error::InvalidRange {
                    start: pair[1].start_ip.into(),
                    end: pair[1].end_ip.into(),
                    reason: format!(
                        "overlaps {}-{}",
                        Ipv4Addr::from(pair[0].start_ip),
                        Ipv4Addr::from(pair[0].end_ip)
                    ),
                });
            }
        }

        let mut state = BuildState::new();
        let mut record_offsets = Vec::with_capacity(sorted.len());
        for entry in &sorted {
            record_offsets.push(state.write_record(entry)?);
        }

        let mut buffer = state.buffer;
        let index_begin = buffer.len();
        for (entry, &offset) in sorted.iter().zip(&record_offsets) {
            buffer.extend_from_slice(&entry.start_ip.to_le_bytes());
            buffer.extend_from_slice(&u24(offset)?);
        }
        let index_end = index_begin + (sorted.len() - 1) * INDEX_ENTRY_LEN;

        let header = DatabaseHeader {
            index_begin: u32::try_from(index_begin).map_err(|_| Error::OffsetOverflow(index_begin))?,
            index_end: u32::try_from(index_end).map_err(|_| Error::OffsetOverflow(index_end))?,
        };
        buffer[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

        log::debug!(
            "Built database: {} records, {} bytes",
            sorted.len(),
            buffer.len()
        );

        Ok(buffer)
    }
}

/// Encode a redirect pointer.
fn u24(offset: usize) -> Result<[u8; OFFSET_LEN]> {
    if offset > MAX_OFFSET {
        return Err(Error::OffsetOverflow(offset));
    }
    let b = (offset as u32).to_le_bytes();
    Ok([b[0], b[1], b[2]])
}

/// Output buffer plus the offsets of strings already written.
struct BuildState {
    buffer: Vec<u8>,
    countries: AHashMap<Vec<u8>, usize>,
    areas: AHashMap<Vec<u8>, usize>,
    blocks: AHashMap<(Vec<u8>, Vec<u8>), usize>,
}

impl BuildState {
    fn new() -> Self {
        Self {
            buffer: vec![0u8; HEADER_SIZE],
            countries: AHashMap::new(),
            areas: AHashMap::new(),
            blocks: AHashMap::new(),
        }
    }

    fn write_record(&mut self, entry: &RangeEntry) -> Result<usize> {
        let key = (entry.country.clone(), entry.area.clone());
        let layout = match entry.layout {
            RecordLayout::Auto if self.blocks.contains_key(&key) => RecordLayout::FullRedirect,
            RecordLayout::Auto if self.countries.contains_key(&entry.country) => {
                RecordLayout::CountryRedirect
            }
            RecordLayout::Auto => RecordLayout::Inline,
            explicit => explicit,
        };
        let share_area = entry.layout == RecordLayout::Auto;

        // Strings a redirect points at must exist before the record
        let country_offset = match layout {
            RecordLayout::CountryRedirect => Some(self.pooled_country(&entry.country)?),
            _ => None,
        };
        let block_offset = match layout {
            RecordLayout::FullRedirect => Some(self.pooled_block(entry)?),
            _ => None,
        };

        let record_offset = self.buffer.len();
        u24(record_offset)?;
        self.buffer.extend_from_slice(&entry.end_ip.to_le_bytes());
        let block = self.buffer.len();

        match (country_offset, block_offset) {
            (_, Some(target)) => {
                self.buffer.push(FLAG_REDIRECT_BOTH);
                self.buffer.extend_from_slice(&u24(target)?);
            }
            (Some(target), None) => {
                self.buffer.push(FLAG_REDIRECT_COUNTRY);
                self.buffer.extend_from_slice(&u24(target)?);
                self.write_area(&entry.area, share_area)?;
                self.blocks.entry(key).or_insert(block);
            }
            (None, None) => {
                self.write_country(&entry.country);
                self.write_area(&entry.area, share_area)?;
                self.blocks.entry(key).or_insert(block);
            }
        }

        Ok(record_offset)
    }

    /// Offset of `country` as a standalone string, writing it if needed.
    fn pooled_country(&mut self, country: &[u8]) -> Result<usize> {
        match self.countries.get(country) {
            Some(&offset) => Ok(offset),
            None => Ok(self.write_country(country)),
        }
    }

    /// Offset of a country+area block, writing it if needed.
    fn pooled_block(&mut self, entry: &RangeEntry) -> Result<usize> {
        let key = (entry.country.clone(), entry.area.clone());
        if let Some(&offset) = self.blocks.get(&key) {
            return Ok(offset);
        }

        let block = self.buffer.len();
        match self.countries.get(&entry.country) {
            Some(&country) => {
                self.buffer.push(FLAG_REDIRECT_COUNTRY);
                self.buffer.extend_from_slice(&u24(country)?);
            }
            None => {
                self.write_country(&entry.country);
            }
        }
        self.write_area(&entry.area, false)?;
        self.blocks.insert(key, block);
        Ok(block)
    }

    fn write_country(&mut self, country: &[u8]) -> usize {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(country);
        self.buffer.push(0);
        self.countries.entry(country.to_vec()).or_insert(offset);
        offset
    }

    fn write_area(&mut self, area: &[u8], share: bool) -> Result<()> {
        if share && !area.is_empty() {
            if let Some(&offset) = self.areas.get(area) {
                self.buffer.push(FLAG_REDIRECT_COUNTRY);
                self.buffer.extend_from_slice(&u24(offset)?);
                return Ok(());
            }
        }
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(area);
        self.buffer.push(0);
        if !area.is_empty() {
            self.areas.entry(area.to_vec()).or_insert(offset);
        }
        Ok(())
    }
}
