//! Integration tests for the SQLite storage and its reconciliation.
//!
//! These exercise the public API end to end: values through real rows,
//! snapshots through `read`/`write`, and the document front end on top.

mod common;

use std::collections::BTreeSet;

use common::{doc, file_storage, full_snapshot, sample_values, seeded_storage, table};
use docstore_sqlite::{
    DocumentDb, ReconcilePath, SqliteStorage, Storage, StoreConfig, Table, TypeTag, Value,
    decode, dump, encode,
};
use serde_json::json;

// =============================================================================
// Codec
// =============================================================================

#[test]
fn codec_round_trip_preserves_type() -> anyhow::Result<()> {
    for value in sample_values() {
        let (tag, raw) = encode(&value);
        let decoded = decode(tag, raw)?;
        assert_eq!(decoded.type_tag(), value.type_tag());
        assert_eq!(decoded, value);
    }
    Ok(())
}

#[test]
fn stored_values_keep_their_type() -> anyhow::Result<()> {
    let storage = SqliteStorage::open_in_memory()?;
    let store = storage.table("values")?;
    store.create_table()?;
    for (i, value) in sample_values().iter().enumerate() {
        store.set(&i.to_string(), value)?;
    }

    let loaded: Vec<Value> = store.values().collect::<Result<_, _>>()?;
    assert_eq!(loaded, sample_values());
    assert_eq!(loaded.get(1), Some(&Value::Bool(true)));
    assert_ne!(loaded.get(1), Some(&Value::Int(1)));
    assert_eq!(loaded.get(1).map(Value::type_tag), Some(TypeTag::Bool));
    Ok(())
}

#[test]
fn nan_float_does_not_break_reads() -> anyhow::Result<()> {
    let mut storage = SqliteStorage::open_in_memory()?;
    storage.write(full_snapshot(vec![("a", table(&[("k", f64::NAN)]))]))?;

    let snapshot = storage.read()?;
    let value = snapshot.get("a").and_then(|a| a.get("k"));
    assert!(matches!(value, Some(Value::Float(f)) if f.is_nan()));
    Ok(())
}

// =============================================================================
// Dump and load
// =============================================================================

#[test]
fn dump_then_load_keeps_every_type() -> anyhow::Result<()> {
    let mut values = sample_values();
    values.push(Value::Json(json!("s")));
    values.push(Value::Json(json!([1, 2])));
    values.push(Value::Json(json!({"f": 0.1, "g": 1.0715660391465826e-75})));
    let original: Table = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| (i.to_string(), value))
        .collect();

    let mut source = SqliteStorage::open_in_memory()?;
    source.write(full_snapshot(vec![("values", original.clone())]))?;
    let text = serde_json::to_string_pretty(&dump::dump(&source.read()?))?;

    let mut target = seeded_storage()?;
    let report = target.write_report(dump::load(serde_json::from_str(&text)?)?)?;
    assert_eq!(report.dropped, ["a", "b"]);

    let loaded = target.table("values")?.load()?;
    assert_eq!(loaded, original);
    for (key, value) in &original {
        assert_eq!(loaded.get(key).map(Value::type_tag), Some(value.type_tag()));
    }
    Ok(())
}

// =============================================================================
// Table Store
// =============================================================================

#[test]
fn empty_table() -> anyhow::Result<()> {
    let storage = SqliteStorage::open_in_memory()?;
    let store = storage.table("t")?;
    store.create_table()?;

    assert_eq!(store.len()?, 0);
    assert_eq!(store.keys().count(), 0);
    assert_eq!(store.values().count(), 0);
    assert_eq!(store.entries().count(), 0);
    Ok(())
}

#[test]
fn single_insert() -> anyhow::Result<()> {
    let storage = SqliteStorage::open_in_memory()?;
    let store = storage.table("t")?;
    store.create_table()?;
    store.set("aaa", &Value::Int(2))?;

    assert_eq!(store.len()?, 1);
    assert_eq!(store.keys().collect::<Result<Vec<_>, _>>()?, ["aaa"]);
    assert_eq!(store.values().collect::<Result<Vec<_>, _>>()?, [Value::Int(2)]);
    assert_eq!(
        store.entries().collect::<Result<Vec<_>, _>>()?,
        [("aaa".to_string(), Value::Int(2))]
    );
    Ok(())
}

#[test]
fn idempotent_overwrite() -> anyhow::Result<()> {
    let storage = SqliteStorage::open_in_memory()?;
    let store = storage.table("t")?;
    store.create_table()?;
    let data = table(&[("k1", Value::from("v1")), ("k2", Value::Float(0.25))]);

    store.overwrite(&data)?;
    let first = store.load()?;
    store.overwrite(&data)?;
    let second = store.load()?;

    assert_eq!(first, data);
    assert_eq!(second, first);
    assert_eq!(
        second.keys().collect::<Vec<_>>(),
        first.keys().collect::<Vec<_>>()
    );
    Ok(())
}

// =============================================================================
// Reconciliation
// =============================================================================

#[test]
fn full_snapshot_drops_missing_tables() -> anyhow::Result<()> {
    let mut storage = seeded_storage()?;
    let new_a = table(&[("2", 20), ("3", 30)]);

    let report = storage.write_report(full_snapshot(vec![("a", new_a.clone())]))?;

    assert_eq!(report.path, ReconcilePath::Full);
    assert_eq!(report.dropped, ["b"]);
    assert_eq!(storage.table_names()?, ["a"]);
    assert_eq!(storage.table("a")?.load()?, new_a);
    Ok(())
}

#[test]
fn tracked_read_forces_rewrite() -> anyhow::Result<()> {
    let mut storage = seeded_storage()?;
    let before = storage.table("a")?.load()?;

    let mut snapshot = storage.read()?;
    assert!(snapshot.table_mut("a").is_some());
    let report = storage.write_report(snapshot)?;

    assert_eq!(report.path, ReconcilePath::Tracked);
    assert_eq!(report.overwritten, ["a"]);
    assert!(report.dropped.is_empty());
    assert_eq!(storage.table_names()?, ["a", "b"]);
    assert_eq!(storage.table("a")?.load()?, before);
    Ok(())
}

#[test]
fn tracked_write_and_delete() -> anyhow::Result<()> {
    let mut storage = seeded_storage()?;

    let mut snapshot = storage.read()?;
    snapshot.remove("b");
    snapshot.insert("c", table(&[("k", true)]));
    let report = storage.write_report(snapshot)?;

    assert_eq!(report.created, ["c"]);
    assert_eq!(report.dropped, ["b"]);
    assert_eq!(storage.table_names()?, ["a", "c"]);
    assert_eq!(storage.table("c")?.get("k")?, Value::Bool(true));
    Ok(())
}

// =============================================================================
// Document front end
// =============================================================================

#[test]
fn document_store_round_trip() -> anyhow::Result<()> {
    let db = DocumentDb::new(SqliteStorage::open_in_memory()?);
    db.collection("a").insert(doc(json!({"b": 1})))?;

    assert_eq!(db.tables()?, BTreeSet::from(["a".to_string()]));
    assert_eq!(db.collection("a").all()?, [doc(json!({"b": 1}))]);
    Ok(())
}

#[test]
fn document_store_survives_reopen() -> anyhow::Result<()> {
    let (dir, storage) = file_storage()?;
    let path = dir.path().join("db.sqlite");

    let db = DocumentDb::new(storage);
    let people = db.collection("people");
    let id = people.insert(doc(json!({"name": "Grace", "langs": ["COBOL"]})))?;
    people.update(id, doc(json!({"retired": true})))?;
    db.close()?;

    let mut config = StoreConfig::new(&path);
    config.page_size = 1;
    let db = DocumentDb::new(SqliteStorage::with_config(&config)?);
    assert_eq!(
        db.collection("people").get(id)?,
        Some(doc(json!({"name": "Grace", "langs": ["COBOL"], "retired": true})))
    );
    Ok(())
}
