//! Store configuration consumed by the open path.
//!
//! # Responsibility
//! - Describe where a store lives and which schema version it declares.
//! - Carry the opaque migration routine, encryption key and compaction flag.
//!
//! # Invariants
//! - Values are forwarded verbatim; the only interpretation is resolving
//!   `StoreLocation::Default` to a file under the current directory.

use rusqlite::Connection;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// File name used when no explicit location is configured.
pub const DEFAULT_STORE_FILE_NAME: &str = "default.entistore";

/// Migration routine invoked with `(handle, on_disk_version, declared_version)`.
///
/// Runs inside the transaction that stamps the declared version.
pub type MigrationFn = Arc<dyn Fn(&Connection, u32, u32) -> rusqlite::Result<()> + Send + Sync>;

/// Where the backing store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Resolve to `DEFAULT_STORE_FILE_NAME` in the current directory.
    Default,
    /// On-disk database file.
    File(PathBuf),
    /// Named in-memory database shared by all handles of this process.
    InMemory(String),
}

impl StoreLocation {
    /// In-memory location with a freshly generated identifier.
    pub fn unique_in_memory() -> Self {
        Self::InMemory(format!("entistore-{}", Uuid::new_v4()))
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }
}

/// Configuration forwarded to the store open call.
#[derive(Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub schema_version: u32,
    pub migration: Option<MigrationFn>,
    pub encryption_key: Option<Vec<u8>>,
    pub compact_on_open: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Default,
            schema_version: 0,
            migration: None,
            encryption_key: None,
            compact_on_open: false,
        }
    }
}

impl StoreConfig {
    /// Configuration for an on-disk store at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Configuration for a named in-memory store.
    pub fn in_memory(identifier: impl Into<String>) -> Self {
        Self {
            location: StoreLocation::InMemory(identifier.into()),
            ..Self::default()
        }
    }

    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_migration<F>(mut self, migration: F) -> Self
    where
        F: Fn(&Connection, u32, u32) -> rusqlite::Result<()> + Send + Sync + 'static,
    {
        self.migration = Some(Arc::new(migration));
        self
    }

    pub fn with_encryption_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn with_compact_on_open(mut self, compact: bool) -> Self {
        self.compact_on_open = compact;
        self
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Key material never reaches logs or panic messages.
        f.debug_struct("StoreConfig")
            .field("location", &self.location)
            .field("schema_version", &self.schema_version)
            .field("migration", &self.migration.as_ref().map(|_| "<fn>"))
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .field("compact_on_open", &self.compact_on_open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, StoreLocation};

    #[test]
    fn debug_output_redacts_encryption_key() {
        let config = StoreConfig::in_memory("debug").with_encryption_key(vec![7u8; 64]);
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("7, 7"));
    }

    #[test]
    fn unique_in_memory_locations_differ() {
        assert_ne!(
            StoreLocation::unique_in_memory(),
            StoreLocation::unique_in_memory()
        );
    }
}
