//! The storage boundary and its SQLite implementation.

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::logging::{debug, error, info};
use crate::tracked::{ChangeSet, Snapshot};

use super::error::StoreError;
use super::name::TableName;
use super::table::{DEFAULT_PAGE_SIZE, TableStore};

/// Persistence backend consumed by a document engine.
///
/// The engine calls [`read`](Storage::read) to get a snapshot, mutates it,
/// and hands it back to [`write`](Storage::write). `write` takes the
/// snapshot by value: its change history is consumed exactly once.
pub trait Storage {
    fn read(&mut self) -> Result<Snapshot, StoreError>;

    fn write(&mut self, data: Snapshot) -> Result<(), StoreError>;

    fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// Which diff a write used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePath {
    /// Replayed the snapshot's change history.
    Tracked,
    /// Compared the snapshot against the tables already stored.
    Full,
}

/// What one write did, in the order it did it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: ReconcilePath,
    /// Tables that did not exist before this write.
    pub created: Vec<String>,
    pub overwritten: Vec<String>,
    pub dropped: Vec<String>,
}

impl WriteReport {
    fn new(path: ReconcilePath) -> Self {
        Self {
            path,
            created: Vec::new(),
            overwritten: Vec::new(),
            dropped: Vec::new(),
        }
    }
}

/// A document store persisted as one SQLite table per document table.
///
/// Every [`write`](Storage::write) runs in a single transaction: either all
/// table creations, overwrites and drops become visible, or none do.
///
/// # Example
///
/// ```ignore
/// use docstore_sqlite::prelude::*;
///
/// let mut storage = SqliteStorage::open("db.sqlite")?;
/// let mut snapshot = storage.read()?;
/// snapshot.insert("users", Table::new());
/// storage.write(snapshot)?;
/// ```
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    page_size: usize,
}

impl SqliteStorage {
    /// Open (or create) a database file with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_config(&StoreConfig::new(path.as_ref()))
    }

    /// Open (or create) a database file, applying the configured pragmas.
    pub fn with_config(config: &StoreConfig) -> Result<Self, StoreError> {
        info!(path = %config.path.display(), "opening SQLite storage");
        let conn = match Connection::open(&config.path) {
            Ok(conn) => conn,
            Err(e) => {
                error!(path = %config.path.display(), error = %e, "failed to open database");
                return Err(e.into());
            }
        };

        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {}; PRAGMA synchronous = {};",
            config.journal_mode.pragma_value(),
            config.synchronous.pragma_value()
        ))?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        Ok(Self {
            conn,
            page_size: config.page_size.max(1),
        })
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("opening in-memory SQLite storage");
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Names of all stored tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>, StoreError> {
        list_tables(&self.conn)
    }

    /// Direct access to one table outside a read/write cycle.
    pub fn table(&self, name: &str) -> Result<TableStore<'_>, StoreError> {
        Ok(TableStore::new(&self.conn, TableName::new(name)?).with_page_size(self.page_size))
    }

    /// Apply a snapshot and report what changed.
    ///
    /// A tracked snapshot rewrites the tables its history read or wrote and
    /// drops the ones it deleted; tables it never touched are left alone.
    /// An untracked snapshot is taken as the complete store: every table in
    /// it is rewritten and every stored table missing from it is dropped.
    pub fn write_report(&mut self, data: Snapshot) -> Result<WriteReport, StoreError> {
        let page_size = self.page_size;
        let tx = self.conn.transaction()?;
        let (tables, history) = data.into_parts();

        let (path, changes) = match history {
            Some(history) => (ReconcilePath::Tracked, history.change_set()),
            None => {
                let existing = list_tables(&tx)?;
                let changes = ChangeSet::from_full(
                    existing.iter().map(String::as_str),
                    tables.keys().map(String::as_str),
                );
                (ReconcilePath::Full, changes)
            }
        };

        let mut report = WriteReport::new(path);
        for name in &changes.updated {
            let Some(table) = tables.get(name) else {
                error!(table = %name, "history names a table the snapshot lacks, write rolled back");
                return Err(StoreError::MissingTable {
                    table: name.clone(),
                });
            };
            let store = TableStore::new(&tx, TableName::new(name.as_str())?)
                .with_page_size(page_size);
            if !store.exists()? {
                store.create_table()?;
                report.created.push(name.clone());
            }
            store.overwrite(table)?;
            report.overwritten.push(name.clone());
        }
        for name in &changes.deleted {
            TableStore::new(&tx, TableName::new(name.as_str())?).drop_table()?;
            report.dropped.push(name.clone());
        }

        tx.commit().map_err(|e| {
            error!(error = %e, "commit failed, write rolled back");
            StoreError::TransactionFailure(e)
        })?;

        debug!(
            path = ?report.path,
            created = report.created.len(),
            overwritten = report.overwritten.len(),
            dropped = report.dropped.len(),
            "write committed"
        );
        Ok(report)
    }
}

impl Storage for SqliteStorage {
    fn read(&mut self) -> Result<Snapshot, StoreError> {
        let mut tables = IndexMap::new();
        for name in self.table_names()? {
            let table = self.table(&name)?.load()?;
            tables.insert(name, table);
        }
        debug!(tables = tables.len(), "read snapshot");
        Ok(Snapshot::tracked(tables))
    }

    fn write(&mut self, data: Snapshot) -> Result<(), StoreError> {
        self.write_report(data).map(|_| ())
    }

    fn close(self) -> Result<(), StoreError> {
        info!("closing SQLite storage");
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}

/// Catalog query: user tables, sorted by name.
fn list_tables(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}
