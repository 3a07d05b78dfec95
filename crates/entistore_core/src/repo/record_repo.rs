//! Generic record store over the `records` / `record_links` layout.
//!
//! # Responsibility
//! - Fetch, create-or-replace, list and delete JSON documents by type and key.
//! - Mirror every reference field into `record_links` on each write.
//!
//! # Invariants
//! - Create-or-replace keeps the existing row (rowid, `created_at`) for a key.
//! - A replacement document is overlaid on the stored one. Only keys the
//!   record schema does not declare survive from the stored document; declared
//!   fields always come from the new record, absent or not.
//! - `record_links` rows of an owner always match its latest document; they
//!   are dropped with the owner through the foreign key.

use crate::model::record::Record;
use crate::model::schema::RecordSchema;
use crate::repo::query::ReadQuery;
use crate::repo::{StorageFault, StoreResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value as Document;

/// Stable identity of one stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub type_name: String,
    pub key: String,
}

impl RecordKey {
    pub fn new(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

/// A decoded record together with the raw document it was read from.
#[derive(Debug, Clone)]
pub struct StoredRecord<R> {
    pub record: R,
    pub document: Document,
}

/// Repository interface over stored records of any type.
pub trait RecordRepository {
    /// Loads the raw document for `type_name/key`, if present.
    fn fetch_document(&self, type_name: &str, key: &str) -> StoreResult<Option<Document>>;
    /// Loads and decodes one typed record by primary key.
    fn fetch<R: Record>(&self, key: &str) -> StoreResult<Option<StoredRecord<R>>>;
    fn exists(&self, type_name: &str, key: &str) -> StoreResult<bool>;
    /// Creates or replaces the record under its primary key.
    ///
    /// `previous` is the document currently stored for the key, when known.
    fn upsert<R: Record>(&self, record: &R, previous: Option<&Document>) -> StoreResult<()>;
    /// Deletes one record. Returns `false` when it was already absent.
    fn delete(&self, type_name: &str, key: &str) -> StoreResult<bool>;
    fn list_keys(&self, type_name: &str) -> StoreResult<Vec<String>>;
    fn list<R: Record>(&self, query: &ReadQuery) -> StoreResult<Vec<R>>;
    /// Records holding an owned reference to `type_name/key`.
    fn owners_of(&self, type_name: &str, key: &str) -> StoreResult<Vec<RecordKey>>;
}

/// SQLite-backed record repository bound to one handle or transaction.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn replace_links(
        &self,
        schema: &'static RecordSchema,
        key: &str,
        document: &Document,
    ) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM record_links
             WHERE owner_type = ?1
               AND owner_key = ?2;",
            params![schema.type_name, key],
        )?;

        let references = schema.references_in(document);
        if references.is_empty() {
            return Ok(());
        }

        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO record_links (
                owner_type,
                owner_key,
                field_name,
                position,
                target_type,
                target_key,
                owned
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        )?;
        for reference in references {
            stmt.execute(params![
                schema.type_name,
                key,
                reference.field,
                reference.position as i64,
                reference.target.type_name,
                reference.key,
                bool_to_int(reference.ownership.is_owned()),
            ])?;
        }
        Ok(())
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn fetch_document(&self, type_name: &str, key: &str) -> StoreResult<Option<Document>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body
                 FROM records
                 WHERE type_name = ?1
                   AND record_key = ?2;",
                params![type_name, key],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|text| {
            serde_json::from_str(&text).map_err(|source| StorageFault::Codec {
                type_name: type_name.to_string(),
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn fetch<R: Record>(&self, key: &str) -> StoreResult<Option<StoredRecord<R>>> {
        let Some(document) = self.fetch_document(R::type_name(), key)? else {
            return Ok(None);
        };
        let record = serde_json::from_value(document.clone()).map_err(|source| {
            StorageFault::Codec {
                type_name: R::type_name().to_string(),
                key: key.to_string(),
                source,
            }
        })?;
        Ok(Some(StoredRecord { record, document }))
    }

    fn exists(&self, type_name: &str, key: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM records
                WHERE type_name = ?1
                  AND record_key = ?2
            );",
            params![type_name, key],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn upsert<R: Record>(&self, record: &R, previous: Option<&Document>) -> StoreResult<()> {
        let schema = R::schema();
        let key = record.primary_key();
        let encoded = serde_json::to_value(record).map_err(|source| StorageFault::Codec {
            type_name: schema.type_name.to_string(),
            key: key.to_string(),
            source,
        })?;
        let document = match previous {
            Some(previous) => overlay_document(schema, previous, encoded),
            None => encoded,
        };

        self.conn.execute(
            "INSERT INTO records (type_name, record_key, body)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (type_name, record_key) DO UPDATE
             SET
                body = excluded.body,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![schema.type_name, key, document.to_string()],
        )?;

        self.replace_links(schema, key, &document)
    }

    fn delete(&self, type_name: &str, key: &str) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM records
             WHERE type_name = ?1
               AND record_key = ?2;",
            params![type_name, key],
        )?;
        Ok(changed > 0)
    }

    /// Insertion order.
    fn list_keys(&self, type_name: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT record_key
             FROM records
             WHERE type_name = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([type_name])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }

    /// Filtered first, then sorted; insertion order without a sort key.
    fn list<R: Record>(&self, query: &ReadQuery) -> StoreResult<Vec<R>> {
        let mut sql = String::from(
            "SELECT record_key, body
             FROM records
             WHERE type_name = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(R::type_name().to_string())];

        if let Some(predicate) = &query.predicate {
            sql.push_str(" AND ");
            predicate.render(&mut sql, &mut bind_values)?;
        }

        sql.push_str(" ORDER BY ");
        if let Some(order_by) = &query.order_by {
            sql.push_str(&order_by.render()?);
            sql.push_str(", ");
        }
        sql.push_str("rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let body: String = row.get(1)?;
            let record = serde_json::from_str(&body).map_err(|source| StorageFault::Codec {
                type_name: R::type_name().to_string(),
                key,
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn owners_of(&self, type_name: &str, key: &str) -> StoreResult<Vec<RecordKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT owner_type, owner_key
             FROM record_links
             WHERE target_type = ?1
               AND target_key = ?2
               AND owned = 1
             ORDER BY owner_type ASC, owner_key ASC;",
        )?;
        let mut rows = stmt.query(params![type_name, key])?;
        let mut owners = Vec::new();
        while let Some(row) = rows.next()? {
            owners.push(RecordKey {
                type_name: row.get(0)?,
                key: row.get(1)?,
            });
        }
        Ok(owners)
    }
}

/// Overlays `next` onto `previous`.
///
/// Keys `schema` declares are taken from `next` only, so a declared field that
/// `next` leaves out is dropped. Undeclared keys of `previous` are kept.
pub fn overlay_document(schema: &RecordSchema, previous: &Document, next: Document) -> Document {
    match (previous, next) {
        (Document::Object(previous), Document::Object(next)) => {
            let mut merged: serde_json::Map<String, Document> = previous
                .iter()
                .filter(|(key, _)| schema.field(key).is_none())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            merged.extend(next);
            Document::Object(merged)
        }
        (_, next) => next,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
