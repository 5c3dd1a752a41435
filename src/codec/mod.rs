//! Type-preserving value codec.
//!
//! Converts a [`Value`] to the `(type-tag, raw)` pair stored in a row and
//! back. SQLite only knows null, integer, real, text and blob; the tag is
//! what keeps `true` distinct from `1` and a JSON document distinct from a
//! plain string.

mod error;
mod tag;
mod value;

pub use error::CodecError;
pub use rusqlite::types::Value as RawValue;
pub use tag::TypeTag;
pub use value::{Value, decode, decode_tagged, encode};
