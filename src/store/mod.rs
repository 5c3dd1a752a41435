//! SQLite-backed storage for document stores.
//!
//! Each document table becomes one SQLite table of `(key, type, value)`
//! rows. [`TableStore`] is the per-table key-value view; [`SqliteStorage`]
//! implements the [`Storage`] boundary and reconciles whole snapshots.

mod error;
mod name;
mod storage;
mod table;

pub use error::StoreError;
pub use name::TableName;
pub use storage::{ReconcilePath, SqliteStorage, Storage, WriteReport};
pub use table::{DEFAULT_PAGE_SIZE, OverwriteStats, Rows, TableStore};
