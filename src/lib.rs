//! ipfinder - IPv4 geolocation over a memory-mapped range database.
//!
//! This crate resolves an IPv4 address to a location (a country or region
//! string and an area string) by searching a compact, sorted binary
//! database of IP ranges. The database is mapped read-only into memory
//! and every read is bounds-checked, so a corrupt file produces an error
//! instead of garbage.
//!
//! # Features
//!
//! - **Binary search** over fixed 7-byte index entries
//! - **Redirect decoding**: inline strings, country redirects and
//!   country+area redirects that share repeated strings
//! - **Zero-copy results**: lookups borrow strings straight from the mapping
//! - **Thread-safe**: any number of threads may look up concurrently
//! - **Hot reload**: swap in a new database without stopping readers
//! - **Writer**: build databases from a plain-text range dump
//!
//! # Quick Start
//!
//! ```ignore
//! use ipfinder::{Database, Encoding};
//! use std::path::Path;
//!
//! let db = Database::open(Path::new("qqwry.dat"))?;
//! let location = db.lookup("1.2.3.4")?;
//! println!("{}", location.decode(Encoding::Gbk)?);
//! ```
//!
//! # Global Database
//!
//! ```ignore
//! use ipfinder::{init_database, lookup};
//! use std::path::Path;
//!
//! init_database(Path::new("qqwry.dat"))?;
//! let location = lookup("8.8.8.8")?;
//! ```
//!
//! Strings are returned in the database's own encoding. Use the
//! [`encoding`] module or [`Location::decode`] to get UTF-8.

mod error;
mod global;
mod location;
mod shared;

pub mod binary;
pub mod config;
pub mod encoding;
pub mod text;

// Re-export core types
pub use error::{Error, LoadError, LookupError, Result};
pub use location::{DecodedLocation, Location, LocationBuf};

// Re-export database types
pub use binary::{Database, DatabaseInfo, DatabaseWriter, Record, RecordLayout};
pub use config::DatabaseConfig;
pub use encoding::Encoding;
pub use shared::SharedDatabase;
pub use text::TextParser;

// Re-export global API functions
pub use global::{
    database, init_database, init_database_with_config, is_initialized, lookup,
    lookup_province_city, reload_database, unload_database,
};

/// Open a database file.
///
/// Shorthand for [`Database::open`].
pub fn load(path: impl AsRef<std::path::Path>) -> std::result::Result<Database, LoadError> {
    Database::open(path.as_ref())
}
