//! Per-table key-value view over tagged rows.

use std::vec;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::codec::{self, RawValue, Value};
use crate::logging::{debug, trace};
use crate::tracked::Table;

use super::error::StoreError;
use super::name::TableName;

/// Rows fetched per page while iterating.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// SQL text for one table, built once per view.
#[derive(Debug, Clone)]
struct TableSql {
    create: String,
    drop: String,
    upsert: String,
    delete: String,
    select: String,
    count: String,
    page_keys: String,
    page_entries: String,
}

impl TableSql {
    fn new(name: &TableName) -> Self {
        let t = name.quoted();
        Self {
            create: format!(
                "CREATE TABLE IF NOT EXISTS {t} (key TEXT PRIMARY KEY, type TEXT NOT NULL, value BLOB)"
            ),
            drop: format!("DROP TABLE IF EXISTS {t}"),
            upsert: format!(
                "INSERT INTO {t} (key, type, value) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET type = excluded.type, value = excluded.value"
            ),
            delete: format!("DELETE FROM {t} WHERE key = ?1"),
            select: format!("SELECT type, value FROM {t} WHERE key = ?1"),
            count: format!("SELECT COUNT(*) FROM {t}"),
            page_keys: format!(
                "SELECT rowid, key FROM {t} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
            ),
            page_entries: format!(
                "SELECT rowid, key, type, value FROM {t} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
            ),
        }
    }
}

/// Counts from one [`TableStore::overwrite`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwriteStats {
    pub deleted: usize,
    pub upserted: usize,
}

/// A key-value view of one table, bound to a live connection.
///
/// Each row is `(key, type, value)`: the record key, the [`TypeTag`] text
/// and the raw payload. The view holds no state of its own beyond the
/// table name; every call goes to the database.
///
/// Works on a plain [`Connection`] or, through deref, on a
/// [`Transaction`](rusqlite::Transaction).
///
/// [`TypeTag`]: crate::codec::TypeTag
#[derive(Debug)]
pub struct TableStore<'conn> {
    conn: &'conn Connection,
    name: TableName,
    sql: TableSql,
    page_size: usize,
}

impl<'conn> TableStore<'conn> {
    pub fn new(conn: &'conn Connection, name: TableName) -> Self {
        let sql = TableSql::new(&name);
        Self {
            conn,
            name,
            sql,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set how many rows each iteration page fetches (at least one).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// Create the table if it does not exist yet.
    pub fn create_table(&self) -> Result<(), StoreError> {
        self.conn.execute(&self.sql.create, [])?;
        Ok(())
    }

    /// Drop the table if it exists.
    pub fn drop_table(&self) -> Result<(), StoreError> {
        self.conn.execute(&self.sql.drop, [])?;
        Ok(())
    }

    /// Whether the table is present in the catalog.
    pub fn exists(&self) -> Result<bool, StoreError> {
        let found = self
            .conn
            .prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?
            .query_row([self.name.as_str()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Look up a key; absence is [`StoreError::KeyNotFound`].
    pub fn get(&self, key: &str) -> Result<Value, StoreError> {
        let row = self
            .conn
            .prepare_cached(&self.sql.select)?
            .query_row([key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, RawValue>(1)?))
            })
            .optional()?;

        match row {
            Some((tag, raw)) => Ok(codec::decode_tagged(&tag, raw)?),
            None => Err(self.key_not_found(key)),
        }
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .prepare_cached(&self.sql.select)?
            .query_row([key], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert or replace the row for `key`.
    pub fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let (tag, raw) = codec::encode(value);
        trace!(table = %self.name, key = key, tag = %tag, "upserting row");
        self.conn
            .prepare_cached(&self.sql.upsert)?
            .execute(params![key, tag.as_str(), raw])?;
        Ok(())
    }

    /// Delete the row for `key`, reporting whether one existed.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        trace!(table = %self.name, key = key, "deleting row");
        let removed = self
            .conn
            .prepare_cached(&self.sql.delete)?
            .execute([key])?;
        Ok(removed > 0)
    }

    /// Remove `key` and return its value; absence is
    /// [`StoreError::KeyNotFound`].
    pub fn remove(&self, key: &str) -> Result<Value, StoreError> {
        let value = self.get(key)?;
        self.delete(key)?;
        Ok(value)
    }

    /// Number of rows.
    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .prepare_cached(&self.sql.count)?
            .query_row([], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Keys in insertion order, fetched lazily page by page.
    ///
    /// Each call starts a fresh pass.
    pub fn keys(&self) -> Rows<'conn, String> {
        Rows::new(self.conn, self.sql.page_keys.clone(), self.page_size, |row| {
            row.get(1)
        })
    }

    /// `(key, value)` pairs in insertion order, fetched lazily.
    pub fn entries(&self) -> impl Iterator<Item = Result<(String, Value), StoreError>> + 'conn {
        Rows::new(
            self.conn,
            self.sql.page_entries.clone(),
            self.page_size,
            |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, RawValue>(3)?,
                ))
            },
        )
        .map(|row| -> Result<(String, Value), StoreError> {
            let (key, tag, raw) = row?;
            Ok((key, codec::decode_tagged(&tag, raw)?))
        })
    }

    /// Values in insertion order, fetched lazily.
    pub fn values(&self) -> impl Iterator<Item = Result<Value, StoreError>> + 'conn {
        self.entries().map(|entry| entry.map(|(_, value)| value))
    }

    /// Read the whole table into memory.
    pub fn load(&self) -> Result<Table, StoreError> {
        self.entries().collect()
    }

    /// Make the table hold exactly `data`.
    ///
    /// Rows whose key is not in `data` are deleted; every key in `data` is
    /// upserted whether or not its value changed.
    pub fn overwrite(&self, data: &Table) -> Result<OverwriteStats, StoreError> {
        let existing = self.keys().collect::<Result<Vec<_>, _>>()?;

        let mut stats = OverwriteStats::default();
        {
            let mut delete = self.conn.prepare_cached(&self.sql.delete)?;
            for key in existing.iter().filter(|key| !data.contains_key(*key)) {
                stats.deleted += delete.execute([key])?;
            }
        }
        {
            let mut upsert = self.conn.prepare_cached(&self.sql.upsert)?;
            for (key, value) in data {
                let (tag, raw) = codec::encode(value);
                upsert.execute(params![key, tag.as_str(), raw])?;
                stats.upserted += 1;
            }
        }

        debug!(
            table = %self.name,
            deleted = stats.deleted,
            upserted = stats.upserted,
            "overwrote table"
        );
        Ok(stats)
    }

    fn key_not_found(&self, key: &str) -> StoreError {
        StoreError::KeyNotFound {
            table: self.name.to_string(),
            key: key.to_string(),
        }
    }
}

/// Lazy, finite iterator over table rows.
///
/// Rows are fetched in pages with keyset pagination on `rowid`; no
/// statement stays open between pages. A failed page fetch is yielded once
/// and ends the iteration.
pub struct Rows<'conn, T> {
    conn: &'conn Connection,
    sql: String,
    page_size: usize,
    after: i64,
    buffered: vec::IntoIter<T>,
    exhausted: bool,
    read: fn(&Row<'_>) -> rusqlite::Result<T>,
}

impl<'conn, T> Rows<'conn, T> {
    fn new(
        conn: &'conn Connection,
        sql: String,
        page_size: usize,
        read: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Self {
        Self {
            conn,
            sql,
            page_size: page_size.max(1),
            after: i64::MIN,
            buffered: Vec::new().into_iter(),
            exhausted: false,
            read,
        }
    }

    fn fetch_page(&mut self) -> Result<(), StoreError> {
        let conn = self.conn;
        let read = self.read;
        let after = self.after;
        let limit = i64::try_from(self.page_size).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare_cached(&self.sql)?;
        let rows = stmt.query_map(params![after, limit], |row| {
            Ok((row.get::<_, i64>(0)?, read(row)?))
        })?;

        let mut page = Vec::with_capacity(self.page_size);
        for row in rows {
            let (rowid, item) = row?;
            self.after = rowid;
            page.push(item);
        }

        self.exhausted = page.len() < self.page_size;
        self.buffered = page.into_iter();
        Ok(())
    }
}

impl<T> Iterator for Rows<'_, T> {
    type Item = Result<T, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.buffered.next() {
            return Some(Ok(item));
        }
        if self.exhausted {
            return None;
        }
        if let Err(err) = self.fetch_page() {
            self.exhausted = true;
            return Some(Err(err));
        }
        self.buffered.next().map(Ok)
    }
}
