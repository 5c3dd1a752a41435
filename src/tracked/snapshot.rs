//! Change-tracked document store snapshot.

use indexmap::IndexMap;

use crate::codec::Value;

use super::history::{ChangeHistory, Operation};

/// One table: record key to value, in insertion order.
pub type Table = IndexMap<String, Value>;

/// A document store snapshot handed to a caller for one read-modify-write
/// cycle.
///
/// A tracked snapshot logs every top-level access so that the following
/// write only touches the tables that may have changed. Handing out a
/// table mutably is logged as a read, because the caller can change it
/// in place and nothing here can see that.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    tables: IndexMap<String, Table>,
    history: Option<ChangeHistory>,
}

impl Snapshot {
    /// A snapshot that records accesses.
    pub fn tracked(tables: IndexMap<String, Table>) -> Self {
        Self {
            tables,
            history: Some(ChangeHistory::new()),
        }
    }

    /// A full snapshot with no history; writing it replaces the whole store.
    pub fn untracked(tables: IndexMap<String, Table>) -> Self {
        Self {
            tables,
            history: None,
        }
    }

    /// Reassemble a snapshot from [`into_parts`](Self::into_parts), e.g.
    /// to replay an exported history.
    pub fn from_parts(tables: IndexMap<String, Table>, history: Option<ChangeHistory>) -> Self {
        Self { tables, history }
    }

    pub fn is_tracked(&self) -> bool {
        self.history.is_some()
    }

    pub fn history(&self) -> Option<&ChangeHistory> {
        self.history.as_ref()
    }

    /// Borrow a table for modification. Logged as a read when present.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        let table = self.tables.get_mut(name)?;
        if let Some(history) = self.history.as_mut() {
            history.record(Operation::Read, name);
        }
        Some(table)
    }

    /// Replace (or add) a table. Logged as a write.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) -> Option<Table> {
        let name = name.into();
        if let Some(history) = self.history.as_mut() {
            history.record(Operation::Write, &name);
        }
        self.tables.insert(name, table)
    }

    /// Remove a table. Logged as a delete when present.
    pub fn remove(&mut self, name: &str) -> Option<Table> {
        let removed = self.tables.shift_remove(name)?;
        if let Some(history) = self.history.as_mut() {
            history.record(Operation::Delete, name);
        }
        Some(removed)
    }

    /// Shared view of a table. Not logged: the table cannot change
    /// through this borrow.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn tables(&self) -> &IndexMap<String, Table> {
        &self.tables
    }

    pub fn into_parts(self) -> (IndexMap<String, Table>, Option<ChangeHistory>) {
        (self.tables, self.history)
    }
}

impl FromIterator<(String, Table)> for Snapshot {
    /// Collects into an untracked snapshot.
    fn from_iter<I: IntoIterator<Item = (String, Table)>>(iter: I) -> Self {
        Self::untracked(iter.into_iter().collect())
    }
}
