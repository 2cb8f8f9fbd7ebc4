//! Type tags and loading policies.
//!
//! A [`TypeTag`] names the on-disk representation of one schema key. The set is
//! closed: every tag has a built-in codec in the default
//! [`Registry`](crate::Registry), and custom registries can only
//! replace the implementation behind a tag, not invent new tags.
//!
//! | Tag          | On disk                                   | In memory                      |
//! |--------------|-------------------------------------------|--------------------------------|
//! | `boolean`    | file exists or not                        | `Bool`                         |
//! | `string`     | file content, one trailing newline        | `Str`                          |
//! | `integer`    | file content as integer                   | `Int`                          |
//! | `datetime`   | file content as Unix timestamp            | `DateTime`                     |
//! | `list`       | one element per line                      | `StringList`                   |
//! | `listdir`    | names of the entries in a directory       | `StringList` (read-only)       |
//! | `dict`       | directory with schema-declared entries    | `Object`                       |
//! | `mapping`    | directory with arbitrary entry names      | `Object`                       |
//! | `collection` | directory of items named by discriminator | `Objects`                      |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CconfigError;

/// Selects the codec used for one schema key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeTag {
    Boolean,
    String,
    Integer,
    DateTime,
    List,
    ListDir,
    Dict,
    Mapping,
    Collection,
}

impl TypeTag {
    /// Every tag, in the order the built-in registry registers them.
    pub const ALL: [TypeTag; 9] = [
        TypeTag::Boolean,
        TypeTag::String,
        TypeTag::Integer,
        TypeTag::DateTime,
        TypeTag::List,
        TypeTag::ListDir,
        TypeTag::Dict,
        TypeTag::Mapping,
        TypeTag::Collection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::DateTime => "datetime",
            TypeTag::List => "list",
            TypeTag::ListDir => "listdir",
            TypeTag::Dict => "dict",
            TypeTag::Mapping => "mapping",
            TypeTag::Collection => "collection",
        }
    }

    /// Structural tags own a nested schema; scalar tags must not carry one.
    pub fn is_structural(self) -> bool {
        matches!(self, TypeTag::Dict | TypeTag::Mapping | TypeTag::Collection)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = CconfigError;

    /// Parses the lowercase tag name. `bool`, `str` and `int` are accepted as
    /// aliases for older declarations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s {
            "boolean" | "bool" => TypeTag::Boolean,
            "string" | "str" => TypeTag::String,
            "integer" | "int" => TypeTag::Integer,
            "datetime" => TypeTag::DateTime,
            "list" => TypeTag::List,
            "listdir" => TypeTag::ListDir,
            "dict" => TypeTag::Dict,
            "mapping" => TypeTag::Mapping,
            "collection" => TypeTag::Collection,
            other => return Err(CconfigError::UnknownTypeTag(other.to_string())),
        };
        Ok(tag)
    }
}

impl TryFrom<String> for TypeTag {
    type Error = CconfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What to do with directory entries that the schema does not declare.
///
/// The tree walker itself never visits undeclared entries; this policy is
/// applied on top of it by [`CconfigBuilder`](crate::CconfigBuilder).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Skip undeclared entries silently.
    Ignore,
    /// Load undeclared entries as plain strings (directories as schema-less
    /// objects).
    #[default]
    Permissive,
    /// Fail with [`CconfigError::UnknownKeys`].
    Strict,
}

/// An inspection request against a config directory, handled by
/// [`CconfigBuilder::handle`](crate::CconfigBuilder::handle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Every leaf value as `path = value` lines.
    List,
    /// One value by slash-separated path.
    Get { key: String },
    /// Every declared schema path with its type tag.
    Describe,
}
