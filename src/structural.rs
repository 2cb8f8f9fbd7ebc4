//! Codecs for values stored as directories.
//!
//! - [`DictCodec`]: a directory whose entries are the keys of its subschema.
//! - [`MappingCodec`]: a directory whose entry names are data; every entry is
//!   decoded with the same codec.
//! - [`CollectionCodec`]: a directory of items, each a dict, named on disk by
//!   the value of the item's discriminator key.
//! - [`InferredCodec`]: the schema-less fallback used when a dict or mapping
//!   declares no subschema. Files are strings, directories are nested objects.
//!
//! Encoding never removes entries that are not part of the value being
//! written.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::codec::{self, Codec};
use crate::error::CconfigError;
use crate::registry::Registry;
use crate::scalar::{BooleanCodec, ListCodec, StringCodec};
use crate::schema::{Schema, SchemaEntry};
use crate::types::TypeTag;
use crate::value::{ConfigValue, Object};
use crate::walk;

/// Build the nested schema of a structural entry. A missing subschema is an
/// empty one.
fn nested_schema(entry: &SchemaEntry, registry: &Registry) -> Result<Schema, CconfigError> {
    match &entry.subschema {
        Some(definition) => Schema::with_registry(definition, registry),
        None => Ok(Schema::default()),
    }
}

fn reject_discriminator(entry: &SchemaEntry) -> Result<(), CconfigError> {
    match entry.discriminator {
        Some(_) => Err(CconfigError::InvalidSchema {
            key: entry.key.clone(),
            reason: "only collections take a discriminator".into(),
        }),
        None => Ok(()),
    }
}

fn check_entry_name(parent: &Path, name: &str) -> Result<(), CconfigError> {
    match codec::entry_name_problem(name) {
        Some(reason) => Err(CconfigError::InvalidEntryName {
            path: parent.join(name),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}

fn coercion_error(path: &Path, expected: TypeTag, value: &ConfigValue) -> CconfigError {
    CconfigError::TypeCoercion {
        path: path.to_path_buf(),
        expected,
        content: format!("<{}>", value.kind()),
    }
}

// ---------------------------------------------------------------------------
// Dict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DictCodec {
    schema: Schema,
}

impl DictCodec {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub(crate) fn factory(
        entry: &SchemaEntry,
        registry: &Registry,
    ) -> Result<Arc<dyn Codec>, CconfigError> {
        reject_discriminator(entry)?;
        Ok(Arc::new(Self::new(nested_schema(entry, registry)?)))
    }

    pub(crate) fn decode_object(&self, path: &Path) -> Result<Object, CconfigError> {
        if self.schema.is_empty() {
            Ok(InferredCodec::decode_dir(path))
        } else {
            walk::from_dir(path, &self.schema)
        }
    }

    pub(crate) fn encode_object(&self, path: &Path, value: &Object) -> Result<(), CconfigError> {
        if self.schema.is_empty() {
            InferredCodec::encode_dir(path, value)
        } else {
            walk::to_dir(path, value, &self.schema)
        }
    }
}

impl Codec for DictCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::Dict
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        self.decode_object(path).map(ConfigValue::Object)
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        match value {
            Some(ConfigValue::Object(obj)) => self.encode_object(path, obj),
            None => self.encode_object(path, &Object::new()),
            Some(other) => Err(coercion_error(path, TypeTag::Dict, other)),
        }
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::Object(self.schema.from_schema())
    }

    fn subschema(&self) -> Option<&Schema> {
        Some(&self.schema)
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Directory entries keyed by name. With a subschema every entry is a dict of
/// that shape; without one every entry is decoded by [`InferredCodec`].
#[derive(Debug, Clone)]
pub struct MappingCodec {
    entry: DictCodec,
}

impl MappingCodec {
    pub fn new(schema: Schema) -> Self {
        Self {
            entry: DictCodec::new(schema),
        }
    }

    pub(crate) fn factory(
        entry: &SchemaEntry,
        registry: &Registry,
    ) -> Result<Arc<dyn Codec>, CconfigError> {
        reject_discriminator(entry)?;
        Ok(Arc::new(Self::new(nested_schema(entry, registry)?)))
    }

    fn decode_entry(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        if self.entry.schema.is_empty() {
            InferredCodec.decode(path)
        } else {
            self.entry.decode(path)
        }
    }

    fn encode_entry(&self, path: &Path, value: &ConfigValue) -> Result<(), CconfigError> {
        if self.entry.schema.is_empty() {
            InferredCodec.encode(path, Some(value))
        } else {
            self.entry.encode(path, Some(value))
        }
    }
}

impl Codec for MappingCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::Mapping
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        let mut out = Object::new();
        for name in codec::list_entries(path) {
            let value = self.decode_entry(&path.join(&name))?;
            out.insert(name, value);
        }
        Ok(ConfigValue::Object(out))
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        let entries = match value {
            Some(ConfigValue::Object(obj)) => obj,
            None => return codec::ensure_dir(path),
            Some(other) => return Err(coercion_error(path, TypeTag::Mapping, other)),
        };
        for name in entries.keys() {
            check_entry_name(path, name)?;
        }
        codec::ensure_dir(path)?;
        for (name, value) in entries {
            self.encode_entry(&path.join(name), value)?;
        }
        Ok(())
    }

    fn from_schema(&self) -> ConfigValue {
        // The subschema is the shape of every entry, not a set of keys of the
        // mapping itself. Entry names only exist once there is data.
        ConfigValue::Object(Object::new())
    }

    fn subschema(&self) -> Option<&Schema> {
        Some(&self.entry.schema)
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// An ordered list of dicts. Each item is stored in a subdirectory named by
/// the item's discriminator value.
#[derive(Debug, Clone)]
pub struct CollectionCodec {
    item: DictCodec,
    discriminator: String,
}

impl CollectionCodec {
    pub fn new(schema: Schema, discriminator: impl Into<String>) -> Self {
        Self {
            item: DictCodec::new(schema),
            discriminator: discriminator.into(),
        }
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// The discriminator defaults to the first declared subschema key, which
    /// must be a string or integer.
    pub(crate) fn factory(
        entry: &SchemaEntry,
        registry: &Registry,
    ) -> Result<Arc<dyn Codec>, CconfigError> {
        let schema = nested_schema(entry, registry)?;
        let discriminator = match (&entry.discriminator, schema.keys().next()) {
            (Some(key), _) => key.clone(),
            (None, Some(first)) => first.to_string(),
            (None, None) => {
                return Err(CconfigError::InvalidSchema {
                    key: entry.key.clone(),
                    reason: "a collection needs a subschema or an explicit discriminator".into(),
                });
            }
        };

        if !schema.is_empty() {
            match schema.get(&discriminator).map(|c| c.tag()) {
                Some(TypeTag::String | TypeTag::Integer) => {}
                Some(tag) => {
                    return Err(CconfigError::InvalidSchema {
                        key: entry.key.clone(),
                        reason: format!("discriminator '{discriminator}' has type {tag}"),
                    });
                }
                None => {
                    return Err(CconfigError::InvalidSchema {
                        key: entry.key.clone(),
                        reason: format!("discriminator '{discriminator}' is not in the subschema"),
                    });
                }
            }
        }

        Ok(Arc::new(Self::new(schema, discriminator)))
    }

    /// An item whose discriminator file is missing or empty takes its
    /// directory name, as an integer when the key is declared as one.
    fn fill_discriminator(&self, item: &mut Object, name: String) {
        let present = item
            .get(&self.discriminator)
            .and_then(ConfigValue::to_text)
            .is_some_and(|text| !text.is_empty());
        if present {
            return;
        }
        let value = match self.item.schema.get(&self.discriminator).map(|c| c.tag()) {
            Some(TypeTag::Integer) => match name.parse::<i64>() {
                Ok(number) => ConfigValue::Int(Some(number)),
                Err(_) => ConfigValue::Str(Some(name)),
            },
            _ => ConfigValue::Str(Some(name)),
        };
        item.insert(self.discriminator.clone(), value);
    }

    /// Directory names for every item, validated before anything is written.
    fn item_names(&self, path: &Path, items: &[Object]) -> Result<Vec<String>, CconfigError> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut names = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let name = item
                .get(&self.discriminator)
                .and_then(ConfigValue::to_text)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| CconfigError::InvalidEntryName {
                    path: path.to_path_buf(),
                    reason: format!(
                        "item {index} has no value for discriminator '{}'",
                        self.discriminator
                    ),
                })?;
            check_entry_name(path, &name)?;
            if !seen.insert(name.clone()) {
                return Err(CconfigError::InvalidEntryName {
                    path: path.join(&name),
                    reason: "more than one item has this name".into(),
                });
            }
            names.push(name);
        }
        Ok(names)
    }
}

impl Codec for CollectionCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::Collection
    }

    /// Only subdirectories are items. Plain files next to them are skipped.
    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        let names = codec::list_dirs(path);
        let mut items = Vec::with_capacity(names.len());
        for name in names {
            let mut item = self.item.decode_object(&path.join(&name))?;
            self.fill_discriminator(&mut item, name);
            items.push(item);
        }
        debug!(path = %path.display(), items = items.len(), "decoded collection");
        Ok(ConfigValue::Objects(items))
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        let items = match value {
            Some(ConfigValue::Objects(items)) => items.as_slice(),
            None => &[],
            Some(other) => return Err(coercion_error(path, TypeTag::Collection, other)),
        };
        let names = self.item_names(path, items)?;
        codec::ensure_dir(path)?;
        for (name, item) in names.iter().zip(items) {
            self.item.encode_object(&path.join(name), item)?;
        }
        Ok(())
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::Objects(Vec::new())
    }

    fn subschema(&self) -> Option<&Schema> {
        Some(&self.item.schema)
    }
}

// ---------------------------------------------------------------------------
// Schema-less
// ---------------------------------------------------------------------------

/// Decodes whatever is on disk without a schema, and encodes a value in the
/// form its variant implies.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferredCodec;

impl InferredCodec {
    pub(crate) fn decode_dir(path: &Path) -> Object {
        codec::list_entries(path)
            .into_iter()
            .map(|name| {
                let value = Self::decode_any(&path.join(&name));
                (name, value)
            })
            .collect()
    }

    pub(crate) fn decode_any(path: &Path) -> ConfigValue {
        if path.is_dir() {
            ConfigValue::Object(Self::decode_dir(path))
        } else {
            ConfigValue::Str(StringCodec::read(path))
        }
    }

    pub(crate) fn encode_dir(path: &Path, value: &Object) -> Result<(), CconfigError> {
        for name in value.keys() {
            check_entry_name(path, name)?;
        }
        codec::ensure_dir(path)?;
        for (name, child) in value {
            InferredCodec.encode(&path.join(name), Some(child))?;
        }
        Ok(())
    }
}

impl Codec for InferredCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        Ok(Self::decode_any(path))
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        match value {
            None => Ok(()),
            Some(v @ ConfigValue::Bool(_)) => BooleanCodec.encode(path, Some(v)),
            Some(v @ (ConfigValue::Str(_) | ConfigValue::Int(_) | ConfigValue::DateTime(_))) => {
                StringCodec.encode(path, Some(v))
            }
            Some(v @ ConfigValue::StringList(_)) => ListCodec.encode(path, Some(v)),
            Some(ConfigValue::Object(obj)) => Self::encode_dir(path, obj),
            Some(other) => Err(coercion_error(path, TypeTag::Mapping, other)),
        }
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::Str(None)
    }
}
