//! Entity-shaped data access over one record type.
//!
//! # Responsibility
//! - Translate between entities and records at the API boundary.
//! - Delegate writes to `TransactionRunner` and deletes to the cascade engine.
//!
//! # Invariants
//! - `persist*` and `erase*` run in exactly one write transaction per call and
//!   surface `StorageFault`.
//! - `read*` never surface faults; they log and degrade to `None`/empty.
//! - An existing record is refilled in place, never recreated.

use crate::db::StoreConfig;
use crate::model::record::{Entity, Record};
use crate::model::translator::Translator;
use crate::repo::cascade::delete_cascade;
use crate::repo::query::{Predicate, ReadQuery, SortKey};
use crate::repo::record_repo::{RecordRepository, SqliteRecordRepository, StoredRecord};
use crate::repo::runner::TransactionRunner;
use crate::repo::{StorageFault, StoreResult};
use log::{info, warn};
use std::marker::PhantomData;

/// Generic DAO for the entity/record pair described by translator `T`.
pub struct GenericDao<T: Translator> {
    runner: TransactionRunner,
    _translator: PhantomData<fn() -> T>,
}

impl<T: Translator> GenericDao<T> {
    /// Creates a DAO for `config`.
    ///
    /// In-memory stores are opened here and stay alive as long as the DAO.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            runner: TransactionRunner::new(config)?,
            _translator: PhantomData,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        self.runner.config()
    }

    /// Creates or refills the record for `entity.entity_id()`.
    pub fn persist(&self, entity: &T::Entity) -> StoreResult<()> {
        self.runner.write("persist", |tx| {
            let store = SqliteRecordRepository::new(tx);
            let existing = store.fetch::<T::Record>(entity.entity_id())?;
            write_one::<T, _>(&store, entity, existing)
        })
    }

    /// Creates or refills records for every entity in one transaction.
    ///
    /// All existing records are resolved before any record is filled or
    /// written. Ids without a record, or whose record cannot be loaded, are
    /// created fresh.
    pub fn persist_all(&self, entities: &[T::Entity]) -> StoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        self.runner.write("persist_all", |tx| {
            let store = SqliteRecordRepository::new(tx);
            let mut resolved = Vec::with_capacity(entities.len());
            for entity in entities {
                let found = match store.fetch::<T::Record>(entity.entity_id()) {
                    Ok(found) => found,
                    Err(fault) => {
                        warn!(
                            "event=persist_batch_lookup module=dao status=degraded type={} key={} error={}",
                            T::Record::type_name(),
                            entity.entity_id(),
                            fault
                        );
                        None
                    }
                };
                resolved.push(found);
            }

            let mut previous = Vec::with_capacity(entities.len());
            let mut records = Vec::with_capacity(entities.len());
            for stored in resolved {
                match stored {
                    Some(StoredRecord { record, document }) => {
                        records.push(record);
                        previous.push(Some(document));
                    }
                    None => {
                        records.push(T::Record::default());
                        previous.push(None);
                    }
                }
            }

            T::fill_records(&mut records, entities);
            for ((record, entity), document) in records.iter().zip(entities).zip(&previous) {
                ensure_identity(entity, record)?;
                store.upsert(record, document.as_ref())?;
            }
            info!(
                "event=persist_batch module=dao status=ok type={} count={}",
                T::Record::type_name(),
                records.len()
            );
            Ok(())
        })
    }

    /// Reads one entity by id; `None` when absent or unreadable.
    pub fn read(&self, entity_id: &str) -> Option<T::Entity> {
        let result = self.runner.with_handle(|conn| {
            SqliteRecordRepository::new(conn).fetch::<T::Record>(entity_id)
        });
        match result {
            Ok(stored) => stored.map(|stored| T::to_entity(&stored.record)),
            Err(fault) => {
                warn!(
                    "event=read module=dao status=degraded type={} error={}",
                    T::Record::type_name(),
                    fault
                );
                None
            }
        }
    }

    /// Reads every entity of this type in insertion order.
    pub fn read_all(&self) -> Vec<T::Entity> {
        self.read_query(&ReadQuery::default())
    }

    /// Reads entities whose records match `predicate`.
    pub fn read_filtered(&self, predicate: Predicate) -> Vec<T::Entity> {
        self.read_query(&ReadQuery::filtered(predicate))
    }

    /// Reads every entity ordered by record field `order_by`.
    pub fn read_sorted(&self, order_by: &str, ascending: bool) -> Vec<T::Entity> {
        self.read_query(&ReadQuery::sorted(SortKey::new(order_by, ascending)))
    }

    /// Reads entities matching `predicate`, ordered by `order_by`.
    pub fn read_filtered_sorted(
        &self,
        predicate: Predicate,
        order_by: &str,
        ascending: bool,
    ) -> Vec<T::Entity> {
        self.read_query(&ReadQuery::filtered(predicate).with_order(SortKey::new(order_by, ascending)))
    }

    /// Reads entities for an arbitrary query; filtering precedes sorting.
    pub fn read_query(&self, query: &ReadQuery) -> Vec<T::Entity> {
        let result = self
            .runner
            .with_handle(|conn| SqliteRecordRepository::new(conn).list::<T::Record>(query));
        match result {
            Ok(records) => T::to_entities(&records),
            Err(fault) => {
                warn!(
                    "event=read_query module=dao status=degraded type={} error={}",
                    T::Record::type_name(),
                    fault
                );
                Vec::new()
            }
        }
    }

    /// Deletes the record for `entity_id` and its owned subgraph; no-op if absent.
    pub fn erase(&self, entity_id: &str) -> StoreResult<()> {
        self.runner.write("erase", |tx| {
            if !SqliteRecordRepository::new(tx).exists(T::Record::type_name(), entity_id)? {
                info!(
                    "event=erase module=dao status=skipped type={} reason=absent",
                    T::Record::type_name()
                );
                return Ok(());
            }
            let outcome = delete_cascade(tx, T::Record::schema(), &[entity_id.to_string()])?;
            info!(
                "event=erase module=dao status=ok type={} deleted={} retained={}",
                T::Record::type_name(),
                outcome.deleted.len(),
                outcome.retained.len()
            );
            Ok(())
        })
    }

    /// Deletes every record of this type and their owned subgraphs.
    pub fn erase_all(&self) -> StoreResult<()> {
        self.runner.write("erase_all", |tx| {
            let keys = SqliteRecordRepository::new(tx).list_keys(T::Record::type_name())?;
            let outcome = delete_cascade(tx, T::Record::schema(), &keys)?;
            info!(
                "event=erase_all module=dao status=ok type={} roots={} deleted={} retained={}",
                T::Record::type_name(),
                keys.len(),
                outcome.deleted.len(),
                outcome.retained.len()
            );
            Ok(())
        })
    }
}

fn write_one<T: Translator, S: RecordRepository>(
    store: &S,
    entity: &T::Entity,
    existing: Option<StoredRecord<T::Record>>,
) -> StoreResult<()> {
    match existing {
        Some(StoredRecord {
            mut record,
            document,
        }) => {
            T::fill_record(&mut record, entity);
            ensure_identity(entity, &record)?;
            store.upsert(&record, Some(&document))
        }
        None => {
            let record = T::to_record(entity);
            ensure_identity(entity, &record)?;
            store.upsert(&record, None)
        }
    }
}

fn ensure_identity<E: Entity, R: Record>(entity: &E, record: &R) -> StoreResult<()> {
    if entity.entity_id() == record.primary_key() {
        return Ok(());
    }
    Err(StorageFault::IdentityMismatch {
        entity_id: entity.entity_id().to_string(),
        primary_key: record.primary_key().to_string(),
    })
}
