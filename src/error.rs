//! Unified error type for the docstore-sqlite library.
//!
//! This module provides a single [`Error`] type that encompasses all errors
//! that can occur in the library, making it easier to handle errors in
//! application code.

use thiserror::Error;

use crate::codec::CodecError;
#[cfg(feature = "config")]
use crate::config::ConfigError;
use crate::dump::DumpError;
use crate::store::StoreError;
use crate::tracked::TrackingError;

/// Unified error type for all docstore-sqlite operations.
///
/// # Example
///
/// ```ignore
/// use docstore_sqlite::{Result, SqliteStorage, Storage};
///
/// fn count_tables(path: &str) -> Result<usize> {
///     let mut storage = SqliteStorage::open(path)?;
///     Ok(storage.read()?.len())
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Error converting between values and their stored representation.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Error from the SQLite storage layer.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error interpreting a change history.
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    /// Error loading a store dump.
    #[error(transparent)]
    Dump(#[from] DumpError),

    /// Error loading configuration.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a codec error, including one raised while
    /// reading a stored row.
    pub fn is_codec(&self) -> bool {
        matches!(
            self,
            Self::Codec(_) | Self::Store(StoreError::Codec(_)) | Self::Dump(DumpError::Codec(_))
        )
    }

    /// Returns `true` if this is a storage error.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if a lookup missed.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_key_not_found())
    }

    /// Returns `true` if this is a configuration error.
    #[cfg(feature = "config")]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
