//! Entity persistence over an embedded, schema-versioned SQLite store.
//! Translates domain entities to stored records and back, with transactional
//! upserts and cascading deletion of owned record graphs.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{DbError, DbResult, MigrationFn, StoreConfig, StoreLocation};
pub use logging::{init_logging, logging_status, LogConfig, LogLevel, LoggingError};
pub use model::record::{Entity, Record};
pub use model::schema::{FieldKind, FieldReference, FieldSchema, Ownership, RecordSchema};
pub use model::translator::Translator;
pub use repo::cascade::CascadeOutcome;
pub use repo::query::{Comparison, Predicate, ReadQuery, SortKey};
pub use repo::record_repo::RecordKey;
pub use repo::{StorageFault, StoreResult};
pub use service::dao::GenericDao;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
