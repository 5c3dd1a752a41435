//! Convenient re-exports for common usage patterns.
//!
//! This module provides a single import to bring all commonly used types
//! into scope.
//!
//! # Example
//!
//! ```ignore
//! use docstore_sqlite::prelude::*;
//!
//! let mut storage = SqliteStorage::open("db.sqlite")?;
//! let snapshot = storage.read()?;
//! storage.write(snapshot)?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Values and codec
pub use crate::codec::{TypeTag, Value};

// Snapshots and change tracking
pub use crate::tracked::{ChangeHistory, Operation, Snapshot, Table};

// Storage
pub use crate::store::{SqliteStorage, Storage, StoreError, TableStore};

// Document front end
pub use crate::db::{Collection, DocId, Document, DocumentDb};

// Configuration
pub use crate::config::{Config, StoreConfig};
