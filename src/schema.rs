//! Schema declarations and the resolved [`Schema`].
//!
//! A declaration is an ordered list of `(key, tag[, subschema])` entries. It
//! can be written in code:
//!
//! ```ignore
//! let definition = SchemaDefinition::from(vec![
//!     SchemaEntry::new("changed", TypeTag::Boolean),
//!     SchemaEntry::nested("explorer", TypeTag::Dict, vec![("state", TypeTag::String)]),
//! ]);
//! ```
//!
//! or loaded from JSON (a top-level array) or TOML (the same array under a
//! `schema` key):
//!
//! ```toml
//! schema = [
//!     ["changed", "boolean"],
//!     ["explorer", "dict", [["state", "string"]]],
//! ]
//! ```
//!
//! Building a [`Schema`] resolves every tag through a
//! [`Registry`](crate::Registry). The resulting schema is immutable
//! and iterates in declaration order, which is also the order keys are written
//! to disk.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::codec::{self, Codec};
use crate::error::CconfigError;
use crate::registry::Registry;
use crate::types::TypeTag;
use crate::value::Object;

/// One declared key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub key: String,
    pub tag: TypeTag,
    /// Only structural tags may carry a subschema.
    pub subschema: Option<SchemaDefinition>,
    /// Collection only: the item key whose value names each item on disk.
    pub discriminator: Option<String>,
}

impl SchemaEntry {
    pub fn new(key: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            key: key.into(),
            tag,
            subschema: None,
            discriminator: None,
        }
    }

    pub fn nested(
        key: impl Into<String>,
        tag: TypeTag,
        subschema: impl Into<SchemaDefinition>,
    ) -> Self {
        Self {
            subschema: Some(subschema.into()),
            ..Self::new(key, tag)
        }
    }

    pub fn with_discriminator(mut self, key: impl Into<String>) -> Self {
        self.discriminator = Some(key.into());
        self
    }
}

impl From<(&str, TypeTag)> for SchemaEntry {
    fn from((key, tag): (&str, TypeTag)) -> Self {
        SchemaEntry::new(key, tag)
    }
}

impl From<(&str, TypeTag, Vec<SchemaEntry>)> for SchemaEntry {
    fn from((key, tag, subschema): (&str, TypeTag, Vec<SchemaEntry>)) -> Self {
        SchemaEntry::nested(key, tag, subschema)
    }
}

/// An ordered sequence of [`SchemaEntry`] declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition(Vec<SchemaEntry>);

impl SchemaDefinition {
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON declaration: `[["key", "tag"], ["key", "dict", [...]], ...]`.
    pub fn from_json_str(s: &str) -> Result<Self, CconfigError> {
        let raw: Vec<RawEntry> = serde_json::from_str(s)?;
        Self::from_raw(raw)
    }

    /// Parse a TOML document whose `schema` key holds the declaration array.
    pub fn from_toml_str(s: &str) -> Result<Self, CconfigError> {
        #[derive(Deserialize)]
        struct Document {
            schema: Vec<RawEntry>,
        }

        let doc: Document = toml::from_str(s)?;
        Self::from_raw(doc.schema)
    }

    fn from_raw(raw: Vec<RawEntry>) -> Result<Self, CconfigError> {
        raw.into_iter()
            .map(SchemaEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(SchemaDefinition)
    }
}

impl<E: Into<SchemaEntry>> From<Vec<E>> for SchemaDefinition {
    fn from(entries: Vec<E>) -> Self {
        SchemaDefinition(entries.into_iter().map(Into::into).collect())
    }
}

impl<E: Into<SchemaEntry>> FromIterator<E> for SchemaDefinition {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        SchemaDefinition(iter.into_iter().map(Into::into).collect())
    }
}

/// Textual declaration before tag names are resolved. A third element of
/// `null` is the same as no subschema.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Leaf(String, String),
    Nested(String, String, Option<Vec<RawEntry>>),
}

impl TryFrom<RawEntry> for SchemaEntry {
    type Error = CconfigError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        match raw {
            RawEntry::Leaf(key, tag) | RawEntry::Nested(key, tag, None) => {
                Ok(SchemaEntry::new(key, tag.parse()?))
            }
            RawEntry::Nested(key, tag, Some(sub)) => Ok(SchemaEntry {
                subschema: Some(SchemaDefinition::from_raw(sub)?),
                ..SchemaEntry::new(key, tag.parse()?)
            }),
        }
    }
}

/// Resolved schema: key → codec, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    codecs: IndexMap<String, Arc<dyn Codec>>,
}

impl Schema {
    /// Build a schema with the process-wide built-in registry.
    pub fn new(definition: &SchemaDefinition) -> Result<Self, CconfigError> {
        Self::with_registry(definition, Registry::global())
    }

    pub fn with_registry(
        definition: &SchemaDefinition,
        registry: &Registry,
    ) -> Result<Self, CconfigError> {
        let mut codecs = IndexMap::with_capacity(definition.entries().len());
        for entry in definition.entries() {
            if let Some(reason) = codec::entry_name_problem(&entry.key) {
                return Err(CconfigError::InvalidSchema {
                    key: entry.key.clone(),
                    reason: reason.into(),
                });
            }
            if codecs.contains_key(&entry.key) {
                return Err(CconfigError::DuplicateSchemaKey(entry.key.clone()));
            }
            codecs.insert(entry.key.clone(), registry.build(entry)?);
        }
        Ok(Self { codecs })
    }

    pub fn from_json_str(s: &str) -> Result<Self, CconfigError> {
        Self::new(&SchemaDefinition::from_json_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CconfigError> {
        Self::new(&SchemaDefinition::from_toml_str(s)?)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &dyn Codec)> {
        self.codecs.iter().map(|(k, c)| (k.as_str(), c.as_ref()))
    }

    pub fn get(&self, key: &str) -> Option<&dyn Codec> {
        self.codecs.get(key).map(|c| c.as_ref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.codecs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// An object with every key set to its codec's empty value. No disk access.
    pub fn from_schema(&self) -> Object {
        self.items()
            .map(|(key, codec)| (key.to_string(), codec.from_schema()))
            .collect()
    }

    /// Every declared path (slash-joined) with its tag, depth-first in
    /// declaration order. Entries of mappings and collections appear under a
    /// `*` segment.
    pub fn describe(&self) -> Vec<(String, TypeTag)> {
        let mut out = Vec::new();
        self.describe_into("", &mut out);
        out
    }

    fn describe_into(&self, prefix: &str, out: &mut Vec<(String, TypeTag)>) {
        for (key, codec) in self.items() {
            let path = format!("{prefix}{key}");
            out.push((path.clone(), codec.tag()));
            if let Some(sub) = codec.subschema() {
                let child_prefix = match codec.tag() {
                    TypeTag::Mapping | TypeTag::Collection => format!("{path}/*/"),
                    _ => format!("{path}/"),
                };
                sub.describe_into(&child_prefix, out);
            }
        }
    }
}
