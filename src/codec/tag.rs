//! Type tags stored alongside every row.

use std::fmt;
use std::str::FromStr;

use super::error::CodecError;

/// Label identifying which of the seven value shapes a row holds.
///
/// The tag is stored as text in the `type` column and fully determines how
/// the `value` column is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Json,
}

impl TypeTag {
    /// All tags, in declaration order.
    pub const ALL: [TypeTag; 7] = [
        TypeTag::Null,
        TypeTag::Bool,
        TypeTag::Int,
        TypeTag::Float,
        TypeTag::Str,
        TypeTag::Bytes,
        TypeTag::Json,
    ];

    /// The text stored in the `type` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
            TypeTag::Bytes => "bytes",
            TypeTag::Json => "json",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| CodecError::UnsupportedTag(s.to_string()))
    }
}
