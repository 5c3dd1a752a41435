//! The application-level value model and its row encoding.

use rusqlite::types::Value as RawValue;

use super::error::CodecError;
use super::tag::TypeTag;

/// A value stored under a record key.
///
/// Primitives get their own variants so they round-trip with their exact
/// type; `Json` carries structured data (sequences and string-keyed
/// mappings) which is stored as JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    /// The tag this value is stored under.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::Json(_) => TypeTag::Json,
        }
    }

    /// Borrow the structured payload, if this is a `Json` value.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    /// Render as JSON for display or export.
    ///
    /// Lossy: bytes become an array of numbers and non-finite floats become
    /// `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
            Value::Json(json) => json.clone(),
        }
    }
}

/// Encode a value into its `(tag, raw)` row representation.
///
/// Never fails: structured values are serialized with `serde_json`, which
/// keeps non-ASCII text unescaped and preserves key order.
pub fn encode(value: &Value) -> (TypeTag, RawValue) {
    let raw = match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Integer(i64::from(*b)),
        Value::Int(i) => RawValue::Integer(*i),
        Value::Float(f) => RawValue::Real(*f),
        Value::Str(s) => RawValue::Text(s.clone()),
        Value::Bytes(b) => RawValue::Blob(b.clone()),
        Value::Json(json) => RawValue::Text(json.to_string()),
    };
    (value.type_tag(), raw)
}

/// Decode a row back into the value it was encoded from.
///
/// Fails with [`CodecError::RawMismatch`] when the stored payload's storage
/// class cannot hold a value of `tag`. Integral `float` payloads are
/// accepted because SQLite may hand back a real with no fractional part as
/// an integer, and a NULL `float` payload decodes as NaN because SQLite
/// binds NaN as NULL.
pub fn decode(tag: TypeTag, raw: RawValue) -> Result<Value, CodecError> {
    match (tag, raw) {
        (TypeTag::Null, RawValue::Null) => Ok(Value::Null),
        (TypeTag::Bool, RawValue::Integer(i)) => Ok(Value::Bool(i != 0)),
        (TypeTag::Int, RawValue::Integer(i)) => Ok(Value::Int(i)),
        (TypeTag::Float, RawValue::Real(f)) => Ok(Value::Float(f)),
        #[allow(clippy::cast_precision_loss)]
        (TypeTag::Float, RawValue::Integer(i)) => Ok(Value::Float(i as f64)),
        (TypeTag::Float, RawValue::Null) => Ok(Value::Float(f64::NAN)),
        (TypeTag::Str, RawValue::Text(s)) => Ok(Value::Str(s)),
        (TypeTag::Bytes, RawValue::Blob(b)) => Ok(Value::Bytes(b)),
        (TypeTag::Json, RawValue::Text(s)) => Ok(Value::Json(serde_json::from_str(&s)?)),
        (TypeTag::Json, RawValue::Blob(b)) => Ok(Value::Json(serde_json::from_slice(&b)?)),
        (tag, raw) => Err(CodecError::RawMismatch {
            tag,
            found: raw.data_type(),
        }),
    }
}

/// Decode a row whose tag is still in its stored text form.
pub fn decode_tagged(tag: &str, raw: RawValue) -> Result<Value, CodecError> {
    decode(tag.parse()?, raw)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// JSON scalars map onto the primitive variants; arrays, objects and
/// integers outside the `i64` range stay structured.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_f64() {
                    n.as_f64()
                        .map_or(Value::Json(serde_json::Value::Number(n)), Value::Float)
                } else {
                    Value::Json(serde_json::Value::Number(n))
                }
            }
            structured => Value::Json(structured),
        }
    }
}
