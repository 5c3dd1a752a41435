//! Error types for the value codec.

use rusqlite::types::Type as StorageClass;
use thiserror::Error;

use super::tag::TypeTag;

/// Errors raised while decoding a stored row back into a [`Value`](super::Value).
///
/// Every variant signals a corrupted or foreign row: the codec never guesses
/// a type from the raw payload alone.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unsupported type tag: {0:?}")]
    UnsupportedTag(String),

    #[error("Stored {found} payload cannot hold a value tagged '{tag}'")]
    RawMismatch { tag: TypeTag, found: StorageClass },

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}
