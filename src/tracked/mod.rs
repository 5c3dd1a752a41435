//! Change tracking for document store snapshots.
//!
//! A [`Snapshot`] records which top-level tables were read, written or
//! deleted. The resulting [`ChangeHistory`] is a plain event list; folding
//! it into a [`ChangeSet`] tells the storage layer which tables to rewrite
//! and which to drop.

mod error;
mod history;
mod snapshot;

pub use error::TrackingError;
pub use history::{ChangeHistory, ChangeSet, Event, Operation};
pub use snapshot::{Snapshot, Table};
