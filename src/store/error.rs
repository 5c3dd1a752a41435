//! Error types for the SQLite store.

use thiserror::Error;

use crate::codec::CodecError;
use crate::tracked::TrackingError;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("Key not found in table '{table}': {key}")]
    KeyNotFound { table: String, key: String },

    #[error("Invalid table name {name:?}: {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    #[error("Transaction failed to commit: {0}")]
    TransactionFailure(#[source] rusqlite::Error),

    #[error("Record '{key}' in table '{table}' is not a document")]
    NotADocument { table: String, key: String },

    #[error("No document ids left in table '{table}'")]
    IdsExhausted { table: String },

    #[error("Change history names table '{table}' but the snapshot does not hold it")]
    MissingTable { table: String },
}

impl StoreError {
    /// Returns `true` for an absent key, the one error callers routinely
    /// handle.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    /// Returns `true` when stored data could not be decoded.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Codec(_) | Self::NotADocument { .. })
    }
}
