//! Entity/record contracts and their static schema descriptors.
//!
//! # Responsibility
//! - Define what a domain entity and a stored record must provide.
//! - Describe record shape and ownership without runtime type inspection.
//! - Define the translator contract between the two sides.
//!
//! # Invariants
//! - Every record is identified by a primary key equal to its entity id.
//! - Ownership of referenced records is declared per field, at compile time.

pub mod record;
pub mod schema;
pub mod translator;
