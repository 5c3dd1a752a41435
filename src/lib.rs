//! Type-preserving SQLite storage for nested document stores.
//!
//! A document store is a two-level mapping: table name → (document key →
//! value). This library persists it in SQLite, one SQL table per document
//! table, and writes back only the tables that changed since they were read.
//!
//! # Quick Start
//!
//! ```ignore
//! use docstore_sqlite::prelude::*;
//!
//! let mut storage = SqliteStorage::open("db.sqlite")?;
//!
//! // Read a tracked snapshot, touch one table, write it back.
//! let mut snapshot = storage.read()?;
//! if let Some(users) = snapshot.table_mut("users") {
//!     users.insert("1".to_string(), Value::from(true));
//! }
//! storage.write(snapshot)?;
//!
//! // Or use the document front end.
//! let db = DocumentDb::new(storage);
//! let id = db.collection("people").insert(serde_json::Map::new())?;
//! ```
//!
//! # Modules
//!
//! - [`codec`] - `(type-tag, raw)` encoding of values
//! - [`tracked`] - Snapshots that record which tables were touched
//! - [`store`] - Per-table store and the snapshot-reconciling [`SqliteStorage`]
//! - [`db`] - A small document database over any [`Storage`]
//! - [`dump`] - Tagged JSON export and import of a whole store
//! - [`config`] - Store and logging settings
//!
//! # Feature Flags
//!
//! - `config` - Load [`Config`] from TOML files (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the `docstore` command-line binary
//! - `full` - Enable all features

pub mod codec;
pub mod config;
pub mod db;
pub mod dump;
mod logging;
pub mod prelude;
pub mod store;
pub mod tracked;

mod error;

// Re-export the unified error type
pub use error::{Error, Result};

pub use codec::{CodecError, RawValue, TypeTag, Value, decode, encode};
pub use config::{Config, StoreConfig};
pub use db::{Collection, DocId, Document, DocumentDb};
pub use dump::DumpError;
pub use store::{
    ReconcilePath, SqliteStorage, Storage, StoreError, TableName, TableStore, WriteReport,
};
pub use tracked::{ChangeHistory, ChangeSet, Event, Operation, Snapshot, Table, TrackingError};

#[cfg(feature = "config")]
pub use config::ConfigError;
