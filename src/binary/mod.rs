//! Binary database format.
//!
//! All integers are little-endian. Offsets are absolute from the start of
//! the file.
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |     HEADER       |  8 bytes: index_begin (u32), index_end (u32)
//! +------------------+
//! |     RECORDS      |  end_ip (u32), flag/strings, shared strings
//! +------------------+
//! |      INDEX       |  7-byte entries: start_ip (u32), record offset (u24)
//! +------------------+
//! ```
//!
//! `index_end` is the offset of the last index entry, not the end of the
//! region, so a file holds `(index_end - index_begin) / 7 + 1` records.

mod format;
mod index;
mod reader;
mod resolver;
mod view;
pub mod writer;


pub use format::*;
pub use index::{IndexEntry, RecordHandle, RecordIndex};
pub use reader::{Database, DatabaseInfo, Record};
pub use resolver::RedirectResolver;
pub use view::ByteView;
pub use writer::{DatabaseWriter, RangeEntry, RecordLayout};
