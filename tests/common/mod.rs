//! Common test utilities and fixtures.
//!
//! This module provides shared helpers for building tables, snapshots and
//! storages so the integration tests can stay focused on behavior.

#![allow(dead_code, clippy::panic)]

use docstore_sqlite::{Document, Snapshot, SqliteStorage, Storage, Table, Value};
use tempfile::TempDir;

// =============================================================================
// Sample Values
// =============================================================================

/// One value of every supported shape.
pub fn sample_values() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(1),
        Value::Float(1.5),
        Value::from("sss"),
        Value::Bytes(b"fff".to_vec()),
        Value::Json(serde_json::json!({"a": 2, "b": {"c": 3, "d": [4, 5]}})),
    ]
}

// =============================================================================
// Builders
// =============================================================================

/// Build a table from `(key, value)` pairs, keeping their order.
pub fn table<V: Into<Value> + Clone>(pairs: &[(&str, V)]) -> Table {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone().into()))
        .collect()
}

/// Build an untracked snapshot from `(name, table)` pairs.
pub fn full_snapshot(tables: Vec<(&str, Table)>) -> Snapshot {
    tables
        .into_iter()
        .map(|(name, table)| (name.to_string(), table))
        .collect()
}

/// Turn a `json!` object literal into a [`Document`].
pub fn doc(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// =============================================================================
// Storages
// =============================================================================

/// An in-memory storage holding tables `a` and `b`.
pub fn seeded_storage() -> anyhow::Result<SqliteStorage> {
    let mut storage = SqliteStorage::open_in_memory()?;
    storage.write(full_snapshot(vec![
        ("a", table(&[("1", 1), ("2", 2)])),
        ("b", table(&[("x", "y")])),
    ]))?;
    Ok(storage)
}

/// A file-backed storage in a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the storage is used.
pub fn file_storage() -> anyhow::Result<(TempDir, SqliteStorage)> {
    let dir = TempDir::new()?;
    let storage = SqliteStorage::open(dir.path().join("db.sqlite"))?;
    Ok((dir, storage))
}
