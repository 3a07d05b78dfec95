//! Storage layout and declared schema version handling.
//!
//! # Responsibility
//! - Create the generic `records` / `record_links` layout.
//! - Stamp, compare and migrate the declared schema version.
//!
//! # Invariants
//! - The declared version is mirrored to `PRAGMA user_version`.
//! - A brand-new store is stamped without running the migration routine.
//! - The migration routine and the version stamp commit in one transaction.

use crate::db::{DbError, DbResult, MigrationFn};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

const LAYOUT_SQL: &str = include_str!("0001_records.sql");

/// Tables every bootstrapped store must contain.
pub const REQUIRED_TABLES: &[&str] = &["records", "record_links"];

/// Creates the layout if needed and reconciles the declared schema version.
pub fn apply_schema(
    conn: &mut Connection,
    declared_version: u32,
    migration: Option<&MigrationFn>,
) -> DbResult<()> {
    if layout_present(conn)? && current_user_version(conn)? == declared_version {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let on_disk_version = current_user_version(&tx)?;
    let fresh = !layout_present(&tx)? && on_disk_version == 0;
    tx.execute_batch(LAYOUT_SQL)?;

    if fresh {
        set_user_version(&tx, declared_version)?;
        tx.commit()?;
        info!(
            "event=schema_stamp module=db status=ok version={}",
            declared_version
        );
        return Ok(());
    }

    if on_disk_version > declared_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: on_disk_version,
            declared_version,
        });
    }

    if on_disk_version < declared_version {
        if let Some(migration) = migration {
            migration(&*tx, on_disk_version, declared_version)?;
        }
        set_user_version(&tx, declared_version)?;
        info!(
            "event=schema_migrate module=db status=ok from={} to={} routine={}",
            on_disk_version,
            declared_version,
            migration.is_some()
        );
    }

    tx.commit()?;
    Ok(())
}

/// Reads the schema version currently stamped on the store.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Returns whether every layout table exists on this handle.
pub fn layout_present(conn: &Connection) -> DbResult<bool> {
    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn set_user_version(conn: &Connection, version: u32) -> DbResult<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
