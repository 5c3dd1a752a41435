//! Error types for change tracking.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackingError {
    /// A history event named an operation other than read, write or delete.
    #[error("Unreachable history operation: {0:?}")]
    UnreachableOperation(String),
}
