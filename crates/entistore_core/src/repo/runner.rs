//! Scoped handle acquisition and write transactions.
//!
//! # Responsibility
//! - Open one handle per unit of work and release it on every exit path.
//! - Wrap mutations in an explicit begin/commit boundary.
//! - Keep in-memory stores alive for the runner's lifetime.
//!
//! # Invariants
//! - A faulting unit of work is rolled back explicitly, never committed.
//! - Units of work only see `&Transaction`, so they cannot begin a nested one.
//! - Compaction runs at most once per runner, on its first open.

use crate::db::{open_store, StoreConfig};
use crate::repo::{StorageFault, StoreResult};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Opens handles for one store configuration and runs units of work on them.
pub struct TransactionRunner {
    config: StoreConfig,
    // Named in-memory stores vanish when their last handle closes.
    _pinned: Option<Connection>,
    compaction_pending: AtomicBool,
}

impl TransactionRunner {
    /// Creates a runner; in-memory stores are opened and pinned immediately.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let mut runner = Self {
            compaction_pending: AtomicBool::new(config.compact_on_open),
            config,
            _pinned: None,
        };
        if runner.config.location.is_in_memory() {
            let handle = runner.acquire()?;
            runner._pinned = Some(handle);
        }
        Ok(runner)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Runs `work` on a freshly acquired handle, released before returning.
    pub fn with_handle<T>(&self, work: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.acquire()?;
        work(&conn)
    }

    /// Runs `work` inside one write transaction on a freshly acquired handle.
    ///
    /// Commits when `work` succeeds; rolls back and returns the fault otherwise.
    pub fn write<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let mut conn = self.acquire()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| {
                error!(
                    "event=write_tx module=runner status=error op={} error_code=begin_failed error={}",
                    operation, err
                );
                StorageFault::Begin(err)
            })?;

        match work(&tx) {
            Ok(value) => {
                tx.commit().map_err(|err| {
                    error!(
                        "event=write_tx module=runner status=error op={} duration_ms={} error_code=commit_failed error={}",
                        operation,
                        started_at.elapsed().as_millis(),
                        err
                    );
                    StorageFault::Commit(err)
                })?;
                info!(
                    "event=write_tx module=runner status=ok op={} duration_ms={}",
                    operation,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(fault) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=write_tx module=runner status=error op={} error_code=rollback_failed error={}",
                        operation, rollback_err
                    );
                }
                error!(
                    "event=write_tx module=runner status=rolled_back op={} duration_ms={} error={}",
                    operation,
                    started_at.elapsed().as_millis(),
                    fault
                );
                Err(fault)
            }
        }
    }

    fn acquire(&self) -> StoreResult<Connection> {
        // Cleared only after a successful open so a failed first open retries.
        let compact = self.compaction_pending.load(Ordering::SeqCst);
        let conn = open_store(&self.config, compact)?;
        if compact {
            self.compaction_pending.store(false, Ordering::SeqCst);
        }
        debug!("event=handle_acquire module=runner status=ok compact={compact}");
        Ok(conn)
    }
}
