//! Handle bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or named in-memory SQLite handles from a `StoreConfig`.
//! - Configure pragmas required by core behavior.
//! - Reconcile the storage layout and schema version before returning a handle.
//!
//! # Invariants
//! - Returned handles have `foreign_keys=ON`.
//! - Returned handles have the layout present and the declared version stamped.
//! - A configured encryption key is applied before any other statement.

use super::migrations::apply_schema;
use super::{DbError, DbResult, StoreConfig, StoreLocation, DEFAULT_STORE_FILE_NAME};
use log::{error, info};
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Resolves the concrete file path or in-memory URI for a location.
pub fn resolve_location(location: &StoreLocation) -> DbResult<PathBuf> {
    match location {
        StoreLocation::File(path) => Ok(path.clone()),
        StoreLocation::InMemory(identifier) => Ok(PathBuf::from(format!(
            "file:{identifier}?mode=memory&cache=shared"
        ))),
        StoreLocation::Default => std::env::current_dir()
            .map(|dir| dir.join(DEFAULT_STORE_FILE_NAME))
            .map_err(|err| DbError::InvalidLocation(format!("current directory unavailable: {err}"))),
    }
}

/// Opens a store handle and brings it to the declared schema version.
///
/// `compact` requests a `VACUUM` after bootstrap; callers decide whether this
/// open is the one that honors `StoreConfig::compact_on_open`.
///
/// # Side effects
/// - May create the database file and its layout.
/// - May run the configured migration routine.
/// - Emits `db_open` logging events with duration and status.
pub fn open_store(config: &StoreConfig, compact: bool) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = mode_label(&config.location);
    info!("event=db_open module=db status=start mode={mode}");

    let path = resolve_location(&config.location)?;
    let mut conn = match Connection::open(&path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, config, compact) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={} compacted={}",
                mode,
                started_at.elapsed().as_millis(),
                compact
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, config: &StoreConfig, compact: bool) -> DbResult<()> {
    if let Some(key) = config.encryption_key.as_deref() {
        apply_encryption_key(conn, key)?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_schema(conn, config.schema_version, config.migration.as_ref())?;
    if compact {
        conn.execute_batch("VACUUM;")?;
    }
    Ok(())
}

fn apply_encryption_key(conn: &Connection, key: &[u8]) -> DbResult<()> {
    let hex_key: String = key.iter().map(|byte| format!("{byte:02x}")).collect();
    conn.execute_batch(&format!("PRAGMA key = \"x'{hex_key}'\";"))?;

    // Plain SQLite ignores unknown pragmas; only cipher builds answer this one.
    let cipher: Option<String> = conn
        .query_row("PRAGMA cipher_version;", [], |row| row.get(0))
        .optional()?;
    match cipher {
        Some(_) => Ok(()),
        None => Err(DbError::EncryptionUnavailable),
    }
}

fn mode_label(location: &StoreLocation) -> &'static str {
    match location {
        StoreLocation::Default => "default",
        StoreLocation::File(_) => "file",
        StoreLocation::InMemory(_) => "memory",
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_location;
    use crate::db::{StoreLocation, DEFAULT_STORE_FILE_NAME};

    #[test]
    fn default_location_resolves_under_current_dir() {
        let path = resolve_location(&StoreLocation::Default).unwrap();
        assert!(path.ends_with(DEFAULT_STORE_FILE_NAME));
        assert!(path.is_absolute());
    }

    #[test]
    fn in_memory_location_uses_shared_cache_uri() {
        let path = resolve_location(&StoreLocation::InMemory("alpha".to_string())).unwrap();
        assert_eq!(
            path.to_str().unwrap(),
            "file:alpha?mode=memory&cache=shared"
        );
    }
}
