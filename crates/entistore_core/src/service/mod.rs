//! Entity-facing services.
//!
//! # Responsibility
//! - Expose entity-shaped CRUD over the record persistence layer.
//! - Keep callers decoupled from documents, SQL and transactions.

pub mod dao;
