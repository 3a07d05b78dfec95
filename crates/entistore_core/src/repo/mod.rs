//! Record persistence mechanics.
//!
//! # Responsibility
//! - Keep SQL details of the generic record layout inside one boundary.
//! - Scope handle acquisition and write transactions.
//! - Remove owned record graphs without dangling children.
//!
//! # Invariants
//! - Every mutation runs inside a write transaction opened by `TransactionRunner`.
//! - Faults are reported as `StorageFault` and never retried here.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod cascade;
pub mod query;
pub mod record_repo;
pub mod runner;

pub type StoreResult<T> = Result<T, StorageFault>;

/// Storage-level failure surfaced by write and delete paths.
#[derive(Debug)]
pub enum StorageFault {
    /// Handle could not be opened or bootstrapped.
    Open(DbError),
    /// Write transaction could not begin.
    Begin(rusqlite::Error),
    /// Write transaction could not commit.
    Commit(rusqlite::Error),
    /// Statement rejected by the engine (constraint violation, I/O, ...).
    Rejected(rusqlite::Error),
    /// Stored document could not be encoded or decoded.
    Codec {
        type_name: String,
        key: String,
        source: serde_json::Error,
    },
    /// Translator produced a record whose key differs from the entity id.
    IdentityMismatch {
        entity_id: String,
        primary_key: String,
    },
    /// Filter or sort key cannot be rendered for the engine.
    InvalidQuery(String),
}

impl Display for StorageFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "failed to open store: {err}"),
            Self::Begin(err) => write!(f, "failed to begin write transaction: {err}"),
            Self::Commit(err) => write!(f, "failed to commit write transaction: {err}"),
            Self::Rejected(err) => write!(f, "storage rejected operation: {err}"),
            Self::Codec {
                type_name,
                key,
                source,
            } => write!(f, "invalid document for {type_name}/{key}: {source}"),
            Self::IdentityMismatch {
                entity_id,
                primary_key,
            } => write!(
                f,
                "translated record key `{primary_key}` does not match entity id `{entity_id}`"
            ),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
        }
    }
}

impl Error for StorageFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) => Some(err),
            Self::Begin(err) => Some(err),
            Self::Commit(err) => Some(err),
            Self::Rejected(err) => Some(err),
            Self::Codec { source, .. } => Some(source),
            Self::IdentityMismatch { .. } => None,
            Self::InvalidQuery(_) => None,
        }
    }
}

impl From<DbError> for StorageFault {
    fn from(value: DbError) -> Self {
        Self::Open(value)
    }
}

impl From<rusqlite::Error> for StorageFault {
    fn from(value: rusqlite::Error) -> Self {
        Self::Rejected(value)
    }
}
