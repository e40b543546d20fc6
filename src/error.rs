//! Error types for ipfinder.

use thiserror::Error;

/// Error raised while loading a database.
///
/// A load that fails leaves nothing behind; there is no partially
/// constructed [`Database`](crate::Database).
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be opened, read or mapped
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header offsets are inconsistent or the file is too small
    #[error("invalid database format: {0}")]
    InvalidFormat(String),

    /// A decode step failed while validating the file
    #[error("corrupt database: {0}")]
    Decode(#[from] LookupError),
}

/// Error raised by a single lookup.
///
/// Lookup errors are per call; the database stays usable afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The query text is not a dotted-quad IPv4 address
    #[error("invalid IPv4 address: {0}")]
    InvalidInput(String),

    /// The record has an empty country string, or the index is empty
    #[error("location not found")]
    NotFound,

    /// A read would run past the end of the buffer
    #[error("read of {width} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },
}

/// Error type for ipfinder operations outside the lookup path.
#[derive(Error, Debug)]
pub enum Error {
    /// Database load error
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Lookup error
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Text could not be converted between encodings
    #[error("encoding error: cannot represent text as {0}")]
    Encoding(&'static str),

    /// Range is inverted or overlaps another range
    #[error("invalid range {start}-{end}: {reason}")]
    InvalidRange {
        start: std::net::Ipv4Addr,
        end: std::net::Ipv4Addr,
        reason: String,
    },

    /// String cannot be stored in the database
    #[error("invalid location string: {0}")]
    InvalidString(String),

    /// Offset does not fit in a 3-byte redirect pointer
    #[error("offset {0} does not fit in 24 bits")]
    OffsetOverflow(usize),

    /// Text dump line could not be parsed
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A database needs at least one range
    #[error("no ranges to write")]
    EmptyDatabase,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Global database not initialized
    #[error("database not initialized")]
    NotInitialized,
}

/// Result type alias for ipfinder operations.
pub type Result<T> = std::result::Result<T, Error>;
