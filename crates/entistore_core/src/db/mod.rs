//! SQLite storage bootstrap and schema version entry points.
//!
//! # Responsibility
//! - Open and configure SQLite handles from a `StoreConfig`.
//! - Create the record storage layout and track the declared schema version.
//!
//! # Invariants
//! - The declared schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write records before bootstrap succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
pub mod migrations;
mod open;

pub use config::{MigrationFn, StoreConfig, StoreLocation, DEFAULT_STORE_FILE_NAME};
pub use open::{open_store, resolve_location};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        declared_version: u32,
    },
    /// An encryption key was configured but the linked engine has no cipher support.
    EncryptionUnavailable,
    /// The default location could not be resolved.
    InvalidLocation(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                declared_version,
            } => write!(
                f,
                "database schema version {db_version} is newer than declared {declared_version}"
            ),
            Self::EncryptionUnavailable => {
                write!(f, "encryption key configured but storage engine has no cipher support")
            }
            Self::InvalidLocation(message) => write!(f, "invalid store location: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::EncryptionUnavailable => None,
            Self::InvalidLocation(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
