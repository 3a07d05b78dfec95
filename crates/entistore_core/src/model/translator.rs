//! Entity/record translator contract.
//!
//! # Responsibility
//! - Map every translated field between one entity type and one record type.
//!
//! # Invariants
//! - Translation is total and never touches storage.
//! - Fields a translator does not map are left untouched on the target value.
//! - Collection fills pair elements positionally and require equal lengths.

use crate::model::record::{Entity, Record};

/// Stateless bidirectional mapping between `Self::Entity` and `Self::Record`.
///
/// Implementors provide the two single-value fills; collection variants and
/// constructors are derived from them.
pub trait Translator {
    type Entity: Entity;
    type Record: Record;

    /// Writes every mapped field of `entity` into `record`, including the
    /// primary key.
    fn fill_record(record: &mut Self::Record, entity: &Self::Entity);

    /// Writes every mapped field of `record` into `entity`.
    fn fill_entity(entity: &mut Self::Entity, record: &Self::Record);

    /// # Panics
    /// - When `records` and `entities` differ in length.
    fn fill_records(records: &mut [Self::Record], entities: &[Self::Entity]) {
        assert_eq!(
            records.len(),
            entities.len(),
            "translator collections must have equal length"
        );
        for (record, entity) in records.iter_mut().zip(entities) {
            Self::fill_record(record, entity);
        }
    }

    /// # Panics
    /// - When `entities` and `records` differ in length.
    fn fill_entities(entities: &mut [Self::Entity], records: &[Self::Record]) {
        assert_eq!(
            entities.len(),
            records.len(),
            "translator collections must have equal length"
        );
        for (entity, record) in entities.iter_mut().zip(records) {
            Self::fill_entity(entity, record);
        }
    }

    fn to_record(entity: &Self::Entity) -> Self::Record {
        let mut record = Self::Record::default();
        Self::fill_record(&mut record, entity);
        record
    }

    fn to_entity(record: &Self::Record) -> Self::Entity {
        let mut entity = Self::Entity::default();
        Self::fill_entity(&mut entity, record);
        entity
    }

    fn to_entities(records: &[Self::Record]) -> Vec<Self::Entity> {
        let mut entities: Vec<Self::Entity> =
            std::iter::repeat_with(Self::Entity::default)
                .take(records.len())
                .collect();
        Self::fill_entities(&mut entities, records);
        entities
    }
}
