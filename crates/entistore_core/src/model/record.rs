//! Entity and record contracts.
//!
//! # Responsibility
//! - Define the identity contract shared by domain entities and stored records.
//!
//! # Invariants
//! - `Record::primary_key` equals the `Entity::entity_id` it was filled from.
//! - Both sides are default-constructible so translators can fill fresh values.

use crate::model::schema::RecordSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Domain-facing value with a stable string identity.
pub trait Entity: Default {
    fn entity_id(&self) -> &str;
}

/// Storage-facing value persisted as one document of `schema().type_name`.
///
/// Reference fields hold the primary keys of their referents: `Option<String>`
/// for single references and `Vec<String>` for ordered lists. Their kind and
/// ownership are declared in `schema()`.
///
/// `schema()` must declare every field the record serializes: on refill,
/// stored keys the schema does not declare are kept, declared ones are always
/// replaced. Fields not mapped by any translator survive refills, so records
/// should use `#[serde(default)]` to read documents written before such a
/// field existed.
pub trait Record: Default + Serialize + DeserializeOwned {
    /// Statically declared schema of this record type.
    fn schema() -> &'static RecordSchema;

    fn primary_key(&self) -> &str;

    fn type_name() -> &'static str {
        Self::schema().type_name
    }
}
