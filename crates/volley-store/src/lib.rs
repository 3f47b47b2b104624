//! # volley-store
//!
//! SQLite-backed implementations of the `EntityStore` and `HistoryStore`
//! collaborator traits, plus the explicit lifecycle operations on history
//! records: idempotent success recording and routing-confidence evolution.
//!
//! Layering follows a repository/adapter split: [`repository`] holds
//! stateless functions over `&Connection` (pure SQL ↔ type translation),
//! and [`SqliteStores`] bridges them onto the async traits via a connection
//! pool and `spawn_blocking`.

#![deny(unsafe_code)]

pub mod errors;
pub mod repository;
pub mod schema;
pub mod sqlite;

pub use errors::StorageError;
pub use sqlite::SqliteStores;
