//! Tagged JSON export and import of a whole store.
//!
//! A dump is `{"table": {"key": {"type": <tag>, "value": <payload>}}}`.
//! Carrying the tag next to each payload is what lets a dump load back with
//! every value's type intact: bytes stay bytes, and a JSON string stays
//! distinct from a plain string.

use thiserror::Error;

use crate::codec::{CodecError, TypeTag, Value};
use crate::tracked::{Snapshot, Table};

const TYPE_FIELD: &str = "type";
const VALUE_FIELD: &str = "value";

/// Errors raised while loading a dump.
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Invalid dump: {0}")]
    Shape(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Render every table of a snapshot as a tagged JSON object.
pub fn dump(snapshot: &Snapshot) -> serde_json::Value {
    snapshot
        .tables()
        .iter()
        .map(|(name, table)| {
            let rows = table
                .iter()
                .map(|(key, value)| (key.clone(), to_tagged(value)))
                .collect();
            (name.clone(), serde_json::Value::Object(rows))
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Parse a tagged dump into an untracked snapshot.
///
/// Writing the result replaces the whole store, so tables missing from the
/// dump are dropped.
pub fn load(dump: serde_json::Value) -> Result<Snapshot, DumpError> {
    let serde_json::Value::Object(tables) = dump else {
        return Err(DumpError::Shape("top level must be an object".to_string()));
    };
    tables
        .into_iter()
        .map(|(name, rows)| {
            let serde_json::Value::Object(rows) = rows else {
                return Err(DumpError::Shape(format!("table '{}' must be an object", name)));
            };
            let table = rows
                .into_iter()
                .map(|(key, entry)| Ok((key, from_tagged(entry)?)))
                .collect::<Result<Table, DumpError>>()?;
            Ok((name, table))
        })
        .collect()
}

/// One value as `{"type": <tag>, "value": <payload>}`.
///
/// Bytes become an array of numbers; non-finite floats become the strings
/// `"NaN"`, `"inf"` and `"-inf"`.
pub fn to_tagged(value: &Value) -> serde_json::Value {
    let payload = match value {
        Value::Float(f) if f.is_nan() => serde_json::Value::from("NaN"),
        Value::Float(f) if f.is_infinite() => {
            serde_json::Value::from(if *f > 0.0 { "inf" } else { "-inf" })
        }
        other => other.to_json(),
    };
    let mut entry = serde_json::Map::new();
    entry.insert(TYPE_FIELD.to_string(), value.type_tag().as_str().into());
    entry.insert(VALUE_FIELD.to_string(), payload);
    serde_json::Value::Object(entry)
}

/// Inverse of [`to_tagged`].
pub fn from_tagged(entry: serde_json::Value) -> Result<Value, DumpError> {
    let serde_json::Value::Object(mut entry) = entry else {
        return Err(DumpError::Shape("entry must be an object".to_string()));
    };
    let tag: TypeTag = match entry.get(TYPE_FIELD) {
        Some(serde_json::Value::String(tag)) => tag.parse()?,
        _ => return Err(DumpError::Shape(format!("entry needs a string '{TYPE_FIELD}'"))),
    };
    let payload = entry
        .remove(VALUE_FIELD)
        .ok_or_else(|| DumpError::Shape(format!("entry needs a '{VALUE_FIELD}'")))?;

    let value = match (tag, payload) {
        (TypeTag::Null, serde_json::Value::Null) => Some(Value::Null),
        (TypeTag::Bool, serde_json::Value::Bool(b)) => Some(Value::Bool(b)),
        (TypeTag::Int, serde_json::Value::Number(n)) => n.as_i64().map(Value::Int),
        (TypeTag::Float, serde_json::Value::Number(n)) => n.as_f64().map(Value::Float),
        (TypeTag::Float, serde_json::Value::String(s)) => match s.as_str() {
            "NaN" => Some(Value::Float(f64::NAN)),
            "inf" => Some(Value::Float(f64::INFINITY)),
            "-inf" => Some(Value::Float(f64::NEG_INFINITY)),
            _ => None,
        },
        (TypeTag::Str, serde_json::Value::String(s)) => Some(Value::Str(s)),
        (TypeTag::Bytes, serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Value::Bytes),
        (TypeTag::Json, json) => Some(Value::Json(json)),
        _ => None,
    };
    value.ok_or_else(|| DumpError::Shape(format!("payload does not fit type '{tag}'")))
}
