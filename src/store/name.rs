//! Validated table identifiers.

use std::fmt;

use super::error::StoreError;

/// Prefix SQLite reserves for its own tables.
const RESERVED_PREFIX: &str = "sqlite_";

/// A table name that is safe to splice into SQL as a quoted identifier.
///
/// Values are always bound as parameters; table names cannot be, so they
/// are validated here and only ever emitted through [`quoted`](Self::quoted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.contains('\0') {
            Some("name contains a NUL character")
        } else if name
            .get(..RESERVED_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(RESERVED_PREFIX))
        {
            Some("names starting with 'sqlite_' are reserved")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StoreError::InvalidTableName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a double-quoted SQL identifier.
    pub(crate) fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TableName {
    type Error = StoreError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}
