//! Shared database handle with hot reload support.
//!
//! Readers take an `Arc<Database>` snapshot for each lookup, so a reload
//! swaps in the new mapping while lookups already running keep the old
//! one alive until they finish.

use arc_swap::ArcSwap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

use crate::binary::Database;
use crate::location::LocationBuf;
use crate::{LoadError, LookupError};

/// Thread-safe database handle that can be replaced atomically.
///
/// # Example
///
/// ```ignore
/// use ipfinder::SharedDatabase;
/// use std::path::Path;
///
/// let db = SharedDatabase::open(Path::new("qqwry.dat"))?;
/// let location = db.lookup("1.2.3.4")?;
///
/// // Swap in a newer release without stopping readers
/// db.reload(Path::new("qqwry-new.dat"))?;
/// ```
pub struct SharedDatabase {
    inner: ArcSwap<Database>,
}

impl SharedDatabase {
    /// Wrap a loaded database.
    pub fn new(db: Database) -> Self {
        Self {
            inner: ArcSwap::from_pointee(db),
        }
    }

    /// Open a database file.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Load a database image from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        Ok(Self::new(Database::from_bytes(data)?))
    }

    /// Current database.
    pub fn snapshot(&self) -> Arc<Database> {
        self.inner.load_full()
    }

    /// Look up a dotted-quad IPv4 address.
    pub fn lookup(&self, ip: &str) -> Result<LocationBuf, LookupError> {
        let db = self.inner.load();
        db.lookup(ip).map(|loc| loc.to_buf())
    }

    /// Look up an IPv4 address.
    pub fn lookup_ip(&self, ip: Ipv4Addr) -> Result<LocationBuf, LookupError> {
        let db = self.inner.load();
        db.lookup_ip(ip).map(|loc| loc.to_buf())
    }

    /// Replace the database with the file at `path`.
    ///
    /// On failure the current database stays in place.
    pub fn reload(&self, path: &Path) -> Result<(), LoadError> {
        let db = Database::open(path)?;
        self.replace(db);
        Ok(())
    }

    /// Replace the database with a loaded one.
    pub fn replace(&self, db: Database) {
        log::debug!("Replacing database ({} records)", db.record_count());
        self.inner.store(Arc::new(db));
    }
}
