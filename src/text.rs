//! Plain-text range dump format.
//!
//! One range per line. [`dump`] writes tab-separated fields, keeping
//! strings byte for byte:
//!
//! ```text
//! 1.0.0.0<TAB>1.0.0.255<TAB>Australia<TAB>APNIC
//! ```
//!
//! Lines without a tab are split on whitespace for hand-written input:
//!
//! ```text
//! # start         end               country   area
//! 1.0.1.0         1.0.3.255         China     Fuzhou Telecom
//! ```
//!
//! There the area is the rest of the line and may contain spaces or be
//! absent. A line is a comment only if it starts with `#`. Text is UTF-8
//! and is converted to the database encoding on parse.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::Ipv4Addr;

use crate::binary::{Database, DatabaseWriter, RangeEntry};
use crate::encoding::{self, Encoding};
use crate::{Error, LookupError, Result};

/// Text dump parser.
pub struct TextParser;

impl TextParser {
    /// Parse ranges from a reader, encoding strings as `encoding`.
    pub fn parse<R: Read>(reader: R, encoding: Encoding) -> Result<Vec<RangeEntry>> {
        let mut entries = Vec::new();
        let buf_reader = BufReader::new(reader);

        for (i, line) in buf_reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            entries.push(parse_line(&line, encoding).map_err(|message| Error::Parse {
                line: line_no,
                message,
            })?);
        }

        Ok(entries)
    }

    /// Parse ranges straight into a writer.
    pub fn parse_into<R: Read>(
        reader: R,
        encoding: Encoding,
        writer: &mut DatabaseWriter,
    ) -> Result<usize> {
        let entries = Self::parse(reader, encoding)?;
        let count = entries.len();
        for entry in entries {
            writer.add_entry(entry)?;
        }
        Ok(count)
    }
}

/// Split off the next whitespace-delimited field.
fn next_field(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

fn parse_ip(field: &str, name: &str) -> std::result::Result<Ipv4Addr, String> {
    if field.is_empty() {
        return Err(format!("missing {} address", name));
    }
    field
        .parse()
        .map_err(|_| format!("invalid {} address: {}", name, field))
}

/// Split a line into start, end, country and area.
fn split_fields(line: &str) -> (&str, &str, &str, &str) {
    if line.contains('\t') {
        // Strings are kept verbatim
        let mut fields = line.splitn(4, '\t');
        let start = fields.next().unwrap_or("").trim();
        let end = fields.next().unwrap_or("").trim();
        let country = fields.next().unwrap_or("");
        let area = fields.next().unwrap_or("");
        return (start, end, country, area);
    }

    let (start, rest) = next_field(line);
    let (end, rest) = next_field(rest);
    let (country, rest) = next_field(rest);
    (start, end, country, rest.trim())
}

fn parse_line(line: &str, encoding: Encoding) -> std::result::Result<RangeEntry, String> {
    let (start, end, country, area) = split_fields(line);

    let start = parse_ip(start, "start")?;
    let end = parse_ip(end, "end")?;
    if country.is_empty() {
        return Err("missing country".to_string());
    }

    let country = encoding::encode(country, encoding).map_err(|e| e.to_string())?;
    let area = encoding::encode(area, encoding).map_err(|e| e.to_string())?;
    Ok(RangeEntry::new(start, end, &country, &area))
}

/// Write every record of `db` as text, decoding strings from `encoding`.
///
/// Malformed strings are written with replacement characters; records
/// that fail to decode stop the dump. Records with an empty country
/// cannot be rebuilt and are skipped with a warning.
pub fn dump<W: Write>(db: &Database, encoding: Encoding, mut out: W) -> Result<usize> {
    let mut count = 0;
    for slot in 0..db.record_count() {
        let record = match db.record(slot) {
            Ok(record) => record,
            Err(LookupError::NotFound) => {
                let index = db.index();
                let entry = index.entry(slot)?;
                let end_ip = index.end_ip(entry.record_offset)?;
                log::warn!(
                    "Skipping {}-{}: empty country",
                    Ipv4Addr::from(entry.start_ip),
                    Ipv4Addr::from(end_ip)
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let location = record.location.decode_lossy(encoding);
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            record.start_ip, record.end_ip, location.country, location.area
        )?;
        count += 1;
    }
    Ok(count)
}
