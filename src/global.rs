//! Process-wide database and public API.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::binary::Database;
use crate::config::DatabaseConfig;
use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::location::LocationBuf;

/// Global database
static GLOBAL_DATABASE: Lazy<RwLock<Option<Arc<Database>>>> = Lazy::new(|| RwLock::new(None));

/// Load the global database from `path`, replacing any previous one.
pub fn init_database(path: &Path) -> Result<()> {
    init_database_with_config(&DatabaseConfig::new(path))
}

/// Load the global database described by `config`.
pub fn init_database_with_config(config: &DatabaseConfig) -> Result<()> {
    let db = config.open()?;
    log::debug!(
        "Initialized global database from {:?} ({} records)",
        config.path,
        db.record_count()
    );
    *GLOBAL_DATABASE.write() = Some(Arc::new(db));
    Ok(())
}

/// Reload the global database, keeping the current one if loading fails.
pub fn reload_database(path: &Path) -> Result<()> {
    init_database(path).map_err(|e| {
        log::error!("Failed to reload database from {:?}: {}", path, e);
        e
    })
}

/// Drop the global database.
///
/// Lookups already holding the database finish against it; the mapping
/// is released once the last of them returns.
pub fn unload_database() {
    *GLOBAL_DATABASE.write() = None;
}

/// Check if the global database is loaded.
pub fn is_initialized() -> bool {
    GLOBAL_DATABASE.read().is_some()
}

/// The global database, if loaded.
pub fn database() -> Option<Arc<Database>> {
    GLOBAL_DATABASE.read().clone()
}

/// Look up a dotted-quad IPv4 address in the global database.
///
/// # Examples
/// ```ignore
/// use ipfinder::{init_database, lookup};
/// use std::path::Path;
///
/// init_database(Path::new("qqwry.dat"))?;
/// let location = lookup("1.2.3.4")?;
/// ```
pub fn lookup(ip: &str) -> Result<LocationBuf> {
    let db = database().ok_or(Error::NotInitialized)?;
    let location = db.lookup(ip)?;
    Ok(location.to_buf())
}

/// Look up the province and city of an address in the global database.
pub fn lookup_province_city(ip: &str, encoding: Encoding) -> Result<(String, String)> {
    let db = database().ok_or(Error::NotInitialized)?;
    db.lookup_province_city(ip, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::DatabaseWriter;
    use std::net::Ipv4Addr;

    // One test drives the whole lifecycle so parallel tests never race on
    // the shared state.
    #[test]
    fn test_global_lifecycle() {
        let mut writer = DatabaseWriter::new();
        writer
            .add_range(
                Ipv4Addr::new(1, 0, 0, 0),
                Ipv4Addr::new(1, 255, 255, 255),
                b"X",
                b"A",
            )
            .unwrap();
        writer
            .add_range(
                Ipv4Addr::new(2, 0, 0, 0),
                Ipv4Addr::new(2, 255, 255, 255),
                "福建省福州市".as_bytes(),
                "电信".as_bytes(),
            )
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.dat");
        std::fs::write(&path, writer.build().unwrap()).unwrap();

        unload_database();
        assert!(!is_initialized());
        assert!(matches!(lookup("1.2.3.4"), Err(Error::NotInitialized)));
        assert!(matches!(
            lookup_province_city("1.2.3.4", Encoding::Utf8),
            Err(Error::NotInitialized)
        ));

        init_database(&path).unwrap();
        assert!(is_initialized());
        let location = lookup("1.2.3.4").unwrap();
        assert_eq!(location.country, b"X");
        assert_eq!(location.area, b"A");
        assert!(matches!(lookup("nope"), Err(Error::Lookup(_))));
        assert_eq!(
            lookup_province_city("2.1.1.1", Encoding::Utf8).unwrap(),
            ("福建省".to_string(), "福州市".to_string())
        );
        assert_eq!(
            lookup_province_city("1.2.3.4", Encoding::Utf8).unwrap(),
            (String::new(), String::new())
        );

        let held = database().unwrap();
        assert!(reload_database(Path::new("/nonexistent/qqwry.dat")).is_err());
        assert!(is_initialized());

        unload_database();
        assert!(!is_initialized());
        // A handle taken before the unload still works
        assert_eq!(held.lookup("1.2.3.4").unwrap().country, b"X");
    }
}
