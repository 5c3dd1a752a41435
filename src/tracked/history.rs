//! Access events recorded against top-level tables.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TrackingError;

/// Kind of top-level access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Operation {
    /// The table was handed out mutably and may have been changed in place.
    Read,
    /// The table was replaced wholesale.
    Write,
    /// The table was removed.
    Delete,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Operation::Read),
            "write" => Ok(Operation::Write),
            "delete" => Ok(Operation::Delete),
            other => Err(TrackingError::UnreachableOperation(other.to_string())),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.as_str().to_string()
    }
}

impl TryFrom<String> for Operation {
    type Error = TrackingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One recorded access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub op: Operation,
    pub key: String,
}

impl Event {
    pub fn new(op: Operation, key: impl Into<String>) -> Self {
        Self {
            op,
            key: key.into(),
        }
    }
}

/// Append-only log of top-level accesses, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeHistory {
    events: Vec<Event>,
}

impl ChangeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, op: Operation, key: &str) {
        self.events.push(Event::new(op, key));
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fold the log into the tables that must be rewritten and dropped.
    ///
    /// The last event for a key decides where it lands, so the two sets
    /// are always disjoint.
    pub fn change_set(&self) -> ChangeSet {
        self.events
            .iter()
            .fold(ChangeSet::default(), |mut set, event| {
                match event.op {
                    Operation::Read | Operation::Write => {
                        set.deleted.remove(&event.key);
                        set.updated.insert(event.key.clone());
                    }
                    Operation::Delete => {
                        set.updated.remove(&event.key);
                        set.deleted.insert(event.key.clone());
                    }
                }
                set
            })
    }
}

impl FromIterator<Event> for ChangeHistory {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// Tables to rewrite and tables to drop on the next write.
///
/// `updated` and `deleted` never share a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub updated: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
}

impl ChangeSet {
    /// Full-snapshot diff: everything incoming is rewritten, everything that
    /// exists but is not incoming is dropped.
    pub fn from_full<'a>(
        existing: impl IntoIterator<Item = &'a str>,
        incoming: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let updated: BTreeSet<String> = incoming.into_iter().map(str::to_string).collect();
        let deleted = existing
            .into_iter()
            .filter(|name| !updated.contains(*name))
            .map(str::to_string)
            .collect();
        Self { updated, deleted }
    }

    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn history(events: &[(Operation, &str)]) -> ChangeHistory {
        events.iter().map(|(op, key)| Event::new(*op, *key)).collect()
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_read_counts_as_update() {
        let set = history(&[(Operation::Read, "a")]).change_set();
        assert_eq!(names(&set.updated), ["a"]);
        assert!(set.deleted.is_empty());
    }

    #[test]
    fn test_delete_cancels_earlier_access() {
        let set = history(&[
            (Operation::Read, "a"),
            (Operation::Write, "a"),
            (Operation::Write, "b"),
            (Operation::Delete, "a"),
        ])
        .change_set();
        assert_eq!(names(&set.updated), ["b"]);
        assert_eq!(names(&set.deleted), ["a"]);
    }

    #[test]
    fn test_write_after_delete_revives() {
        let set = history(&[(Operation::Delete, "a"), (Operation::Write, "a")]).change_set();
        assert_eq!(names(&set.updated), ["a"]);
        assert!(set.deleted.is_empty());
    }

    #[test]
    fn test_empty_history_changes_nothing() {
        assert!(ChangeHistory::new().change_set().is_empty());
    }

    #[test]
    fn test_full_diff() {
        let set = ChangeSet::from_full(["a", "b"], ["a", "c"]);
        assert_eq!(names(&set.updated), ["a", "c"]);
        assert_eq!(names(&set.deleted), ["b"]);
    }

    #[test]
    fn test_history_serializes_as_event_list() {
        let log = history(&[(Operation::Read, "a"), (Operation::Delete, "b")]);
        let text = serde_json::to_string(&log).unwrap();
        assert_eq!(
            text,
            r#"[{"op":"read","key":"a"},{"op":"delete","key":"b"}]"#
        );
        let back: ChangeHistory = serde_json::from_str(&text).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let err = "append".parse::<Operation>().unwrap_err();
        assert!(matches!(err, TrackingError::UnreachableOperation(ref op) if op == "append"));

        let parsed: Result<ChangeHistory, _> =
            serde_json::from_str(r#"[{"op":"append","key":"a"}]"#);
        assert!(parsed.is_err());
    }
}
