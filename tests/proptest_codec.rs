//! Property-based tests for the value codec and the change-history fold.
//!
//! These tests verify that decode(encode(x)) == x for random values, both in
//! memory and through a real SQLite row, and that folding any history yields
//! disjoint update and delete sets decided by each key's last event.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use docstore_sqlite::{ChangeHistory, Event, Operation, SqliteStorage, Value, decode, encode};
use proptest::prelude::*;

/// Arbitrary JSON; numbers include every finite `f64`.
fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(serde_json::Value::from),
        any::<f64>()
            .prop_filter("JSON numbers are finite", |f| f.is_finite())
            .prop_map(serde_json::Value::from),
        "[a-z日本 ]{0,8}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|pairs| serde_json::Value::Object(pairs.into_iter().collect())),
        ]
    })
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>()
            .prop_filter("NaN never equals itself", |f| !f.is_nan())
            .prop_map(Value::Float),
        ".*".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        json_strategy().prop_map(Value::Json),
    ]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        Just(Operation::Read),
        Just(Operation::Write),
        Just(Operation::Delete),
    ]
}

proptest! {
    #[test]
    fn roundtrip_in_memory(value in value_strategy()) {
        let (tag, raw) = encode(&value);
        let decoded = decode(tag, raw).unwrap();
        prop_assert_eq!(decoded.type_tag(), value.type_tag());
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn roundtrip_through_sqlite(value in value_strategy()) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let store = storage.table("t").unwrap();
        store.create_table().unwrap();
        store.set("k", &value).unwrap();
        prop_assert_eq!(store.get("k").unwrap(), value);
    }

    #[test]
    fn history_fold_is_decided_by_last_event(
        events in prop::collection::vec((operation_strategy(), "[abc]"), 0..32)
    ) {
        let history: ChangeHistory = events
            .iter()
            .map(|(op, key)| Event::new(*op, key.as_str()))
            .collect();
        let changes = history.change_set();

        prop_assert!(changes.updated.is_disjoint(&changes.deleted));

        let mut last: HashMap<&str, Operation> = HashMap::new();
        for (op, key) in &events {
            last.insert(key.as_str(), *op);
        }
        for (key, op) in last {
            if op == Operation::Delete {
                prop_assert!(changes.deleted.contains(key));
            } else {
                prop_assert!(changes.updated.contains(key));
            }
        }
        prop_assert_eq!(
            changes.updated.len() + changes.deleted.len(),
            events.iter().map(|(_, key)| key).collect::<std::collections::BTreeSet<_>>().len()
        );
    }
}
