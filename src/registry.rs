//! Type registry: maps each [`TypeTag`] to the factory that builds its codec.
//!
//! The process-wide registry ([`Registry::global`]) is built once, on first
//! use, from [`Registry::builtin`] and is read-only afterwards. Callers that
//! need a different implementation behind a tag build their own registry and
//! pass it to [`Schema::with_registry`](crate::Schema::with_registry).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::codec::Codec;
use crate::error::CconfigError;
use crate::scalar::{
    BooleanCodec, DateTimeCodec, IntegerCodec, ListCodec, ListDirCodec, StringCodec,
};
use crate::schema::SchemaEntry;
use crate::structural::{CollectionCodec, DictCodec, MappingCodec};
use crate::types::TypeTag;

/// Builds the codec for one schema entry. Structural factories use the
/// registry to build their nested schema.
pub type CodecFactory = fn(&SchemaEntry, &Registry) -> Result<Arc<dyn Codec>, CconfigError>;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    factories: HashMap<TypeTag, CodecFactory>,
}

impl Registry {
    /// A registry with no tags registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with a codec for every [`TypeTag`].
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry
            .register(TypeTag::Boolean, scalar::<BooleanCodec>)
            .register(TypeTag::String, scalar::<StringCodec>)
            .register(TypeTag::Integer, scalar::<IntegerCodec>)
            .register(TypeTag::DateTime, scalar::<DateTimeCodec>)
            .register(TypeTag::List, scalar::<ListCodec>)
            .register(TypeTag::ListDir, scalar::<ListDirCodec>)
            .register(TypeTag::Dict, DictCodec::factory)
            .register(TypeTag::Mapping, MappingCodec::factory)
            .register(TypeTag::Collection, CollectionCodec::factory);
        registry
    }

    /// The shared built-in registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::builtin)
    }

    /// Register (or replace) the factory for `tag`.
    pub fn register(&mut self, tag: TypeTag, factory: CodecFactory) -> &mut Self {
        self.factories.insert(tag, factory);
        self
    }

    pub fn resolve(&self, tag: TypeTag) -> Result<CodecFactory, CconfigError> {
        self.factories
            .get(&tag)
            .copied()
            .ok_or_else(|| CconfigError::UnknownTypeTag(tag.to_string()))
    }

    /// Resolve the entry's tag and build its codec.
    pub fn build(&self, entry: &SchemaEntry) -> Result<Arc<dyn Codec>, CconfigError> {
        let factory = self.resolve(entry.tag)?;
        factory(entry, self)
    }
}

/// Factory for codecs that take no configuration.
fn scalar<C: Codec + Default + 'static>(
    entry: &SchemaEntry,
    _registry: &Registry,
) -> Result<Arc<dyn Codec>, CconfigError> {
    if entry.subschema.is_some() {
        return Err(CconfigError::UnexpectedSubschema {
            key: entry.key.clone(),
            tag: entry.tag,
        });
    }
    if entry.discriminator.is_some() {
        return Err(CconfigError::InvalidSchema {
            key: entry.key.clone(),
            reason: "only collections take a discriminator".into(),
        });
    }
    Ok(Arc::new(C::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registers_every_tag() {
        let registry = Registry::builtin();
        for tag in TypeTag::ALL {
            assert!(registry.resolve(tag).is_ok(), "missing {tag}");
        }
    }

    #[test]
    fn empty_registry_rejects_tags() {
        let registry = Registry::empty();
        let err = registry.resolve(TypeTag::String).unwrap_err();
        assert!(matches!(err, CconfigError::UnknownTypeTag(t) if t == "string"));
    }

    #[test]
    fn built_codec_matches_tag() {
        let registry = Registry::builtin();
        for tag in [TypeTag::Boolean, TypeTag::Integer, TypeTag::ListDir] {
            let codec = registry.build(&SchemaEntry::new("k", tag)).unwrap();
            assert_eq!(codec.tag(), tag);
        }
    }

    #[test]
    fn scalar_rejects_subschema() {
        let entry = SchemaEntry::nested("name", TypeTag::String, vec![("x", TypeTag::String)]);
        let err = Registry::builtin().build(&entry).unwrap_err();
        assert!(matches!(
            err,
            CconfigError::UnexpectedSubschema { tag: TypeTag::String, .. }
        ));
    }

    #[test]
    fn register_replaces_factory() {
        fn always_list(
            _entry: &SchemaEntry,
            _registry: &Registry,
        ) -> Result<Arc<dyn Codec>, CconfigError> {
            Ok(Arc::new(ListCodec))
        }

        let mut registry = Registry::builtin();
        registry.register(TypeTag::String, always_list);
        let codec = registry.build(&SchemaEntry::new("k", TypeTag::String)).unwrap();
        assert_eq!(codec.tag(), TypeTag::List);
    }

    #[test]
    fn global_is_shared() {
        assert!(std::ptr::eq(Registry::global(), Registry::global()));
    }
}
