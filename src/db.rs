//! A minimal document database on top of any [`Storage`].
//!
//! Documents are JSON objects stored under decimal ids in named
//! collections. Every mutating call is one read-modify-write cycle against
//! the storage, so only the touched collection is rewritten.

use std::cell::RefCell;
use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::codec::Value;
use crate::store::{Storage, StoreError};
use crate::tracked::{Snapshot, Table};

/// A stored document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Document identifier, unique within a collection.
pub type DocId = u64;

/// Document database front end.
///
/// Holds its storage in a `RefCell` so several [`Collection`] handles can
/// be alive at once; all access is single-threaded.
pub struct DocumentDb<S: Storage> {
    storage: RefCell<S>,
}

impl<S: Storage> DocumentDb<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: RefCell::new(storage),
        }
    }

    /// Names of all collections that hold a stored table.
    pub fn tables(&self) -> Result<BTreeSet<String>, StoreError> {
        let snapshot = self.storage.borrow_mut().read()?;
        Ok(snapshot.table_names().map(str::to_string).collect())
    }

    /// A handle to a collection. Nothing is stored until the first write.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'_, S> {
        Collection {
            db: self,
            name: name.into(),
        }
    }

    /// Drop one collection; returns whether it existed.
    pub fn drop_table(&self, name: &str) -> Result<bool, StoreError> {
        let mut storage = self.storage.borrow_mut();
        let mut snapshot = storage.read()?;
        if snapshot.remove(name).is_none() {
            return Ok(false);
        }
        storage.write(snapshot)?;
        Ok(true)
    }

    /// Drop every collection.
    pub fn drop_tables(&self) -> Result<(), StoreError> {
        self.storage
            .borrow_mut()
            .write(Snapshot::untracked(IndexMap::new()))
    }

    pub fn storage(&self) -> std::cell::Ref<'_, S> {
        self.storage.borrow()
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.storage.into_inner().close()
    }
}

/// A named collection of documents.
pub struct Collection<'db, S: Storage> {
    db: &'db DocumentDb<S>,
    name: String,
}

impl<S: Storage> Collection<'_, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a document under the next free id.
    pub fn insert(&self, doc: Document) -> Result<DocId, StoreError> {
        self.update_table(|table| {
            let id = self.next_id(table)?;
            table.insert(id.to_string(), Value::Json(doc.into()));
            Ok(id)
        })
    }

    pub fn insert_multiple(
        &self,
        docs: impl IntoIterator<Item = Document>,
    ) -> Result<Vec<DocId>, StoreError> {
        self.update_table(|table| {
            let mut ids = Vec::new();
            for doc in docs {
                let id = self.next_id(table)?;
                table.insert(id.to_string(), Value::Json(doc.into()));
                ids.push(id);
            }
            Ok(ids)
        })
    }

    /// All documents, in insertion order.
    pub fn all(&self) -> Result<Vec<Document>, StoreError> {
        self.read_table(|table| {
            table.map_or_else(
                || Ok(Vec::new()),
                |table| {
                    table
                        .iter()
                        .map(|(key, value)| self.document(key, value))
                        .collect()
                },
            )
        })
    }

    pub fn get(&self, id: DocId) -> Result<Option<Document>, StoreError> {
        let key = id.to_string();
        self.read_table(|table| {
            table
                .and_then(|table| table.get(&key))
                .map(|value| self.document(&key, value))
                .transpose()
        })
    }

    pub fn contains(&self, id: DocId) -> Result<bool, StoreError> {
        let key = id.to_string();
        self.read_table(|table| Ok(table.is_some_and(|table| table.contains_key(&key))))
    }

    /// Merge `fields` into a document; returns whether it existed.
    pub fn update(&self, id: DocId, fields: Document) -> Result<bool, StoreError> {
        let key = id.to_string();
        self.update_table(|table| {
            let Some(value) = table.get(&key) else {
                return Ok(false);
            };
            let mut doc = self.document(&key, value)?;
            doc.extend(fields);
            table.insert(key, Value::Json(doc.into()));
            Ok(true)
        })
    }

    /// Remove a document; returns whether it existed.
    pub fn remove(&self, id: DocId) -> Result<bool, StoreError> {
        let key = id.to_string();
        self.update_table(|table| Ok(table.shift_remove(&key).is_some()))
    }

    /// Remove every document but keep the collection.
    pub fn truncate(&self) -> Result<(), StoreError> {
        self.update_table(|table| {
            table.clear();
            Ok(())
        })
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.read_table(|table| Ok(table.map_or(0, Table::len)))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read_table<R>(
        &self,
        f: impl FnOnce(Option<&Table>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let snapshot = self.db.storage.borrow_mut().read()?;
        f(snapshot.get(&self.name))
    }

    fn update_table<R>(
        &self,
        f: impl FnOnce(&mut Table) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut storage = self.db.storage.borrow_mut();
        let mut snapshot = storage.read()?;
        let result = match snapshot.table_mut(&self.name) {
            Some(table) => f(table)?,
            None => {
                let mut table = Table::new();
                let result = f(&mut table)?;
                snapshot.insert(self.name.clone(), table);
                result
            }
        };
        storage.write(snapshot)?;
        Ok(result)
    }

    /// One past the highest numeric key; non-numeric keys are ignored.
    fn next_id(&self, table: &Table) -> Result<DocId, StoreError> {
        let next = table
            .keys()
            .filter_map(|key| key.parse::<DocId>().ok())
            .max()
            .map_or(Some(1), |max| max.checked_add(1));
        next.ok_or_else(|| StoreError::IdsExhausted {
            table: self.name.clone(),
        })
    }

    fn document(&self, key: &str, value: &Value) -> Result<Document, StoreError> {
        match value {
            Value::Json(serde_json::Value::Object(doc)) => Ok(doc.clone()),
            _ => Err(StoreError::NotADocument {
                table: self.name.clone(),
                key: key.to_string(),
            }),
        }
    }
}
