//! Unknown-key handling: find directory entries the schema does not declare.
//!
//! The walk descends wherever the schema fixes the shape of a subtree: dicts
//! with a subschema, every entry of a mapping with a subschema, and every item
//! of a collection. Schema-less dicts and mappings accept anything, so nothing
//! below them is ever unknown.

use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::CconfigError;
use crate::schema::Schema;
use crate::structural::InferredCodec;
use crate::types::{TypeTag, UnknownKeyPolicy};
use crate::value::{ConfigValue, Object};

/// An entry on disk with no matching schema key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntry {
    /// Slash-separated path relative to the loaded directory.
    pub key: String,
    pub path: PathBuf,
}

/// Every undeclared entry under `base`, depth-first in schema order.
pub fn unknown_entries(base: &Path, schema: &Schema) -> Vec<UnknownEntry> {
    let mut out = Vec::new();
    scan(base, schema, "", None, &mut out);
    out
}

/// Apply `policy` to an object freshly decoded from `base`.
///
/// `Permissive` adds each undeclared entry to `value` under its own name;
/// `Strict` fails listing all of them.
pub fn apply_policy(
    base: &Path,
    schema: &Schema,
    value: &mut Object,
    policy: UnknownKeyPolicy,
) -> Result<(), CconfigError> {
    match policy {
        UnknownKeyPolicy::Ignore => Ok(()),
        UnknownKeyPolicy::Permissive => {
            let mut found = Vec::new();
            scan(base, schema, "", Some(value), &mut found);
            if !found.is_empty() {
                tracing::debug!(path = %base.display(), count = found.len(), "absorbed undeclared entries");
            }
            Ok(())
        }
        UnknownKeyPolicy::Strict => {
            let found = unknown_entries(base, schema);
            if found.is_empty() {
                return Ok(());
            }
            let errors = found
                .into_iter()
                .map(|entry| CconfigError::UnknownKey {
                    key: entry.key,
                    path: entry.path,
                })
                .collect();
            Err(CconfigError::UnknownKeys(errors))
        }
    }
}

fn scan(
    dir: &Path,
    schema: &Schema,
    prefix: &str,
    mut target: Option<&mut Object>,
    out: &mut Vec<UnknownEntry>,
) {
    for name in codec::list_entries(dir) {
        if schema.contains(&name) {
            continue;
        }
        let path = dir.join(&name);
        if let Some(obj) = target.as_deref_mut() {
            obj.insert(name.clone(), InferredCodec::decode_any(&path));
        }
        out.push(UnknownEntry {
            key: format!("{prefix}{name}"),
            path,
        });
    }

    for (key, codec) in schema.items() {
        let Some(sub) = codec.subschema().filter(|s| !s.is_empty()) else {
            continue;
        };
        let child_dir = dir.join(key);
        let child_prefix = format!("{prefix}{key}/");
        let mut child = target.as_deref_mut().and_then(|obj| obj.get_mut(key));

        match codec.tag() {
            TypeTag::Dict => {
                let child = child.and_then(ConfigValue::as_object_mut);
                scan(&child_dir, sub, &child_prefix, child, out);
            }
            TypeTag::Mapping => {
                for name in codec::list_entries(&child_dir) {
                    let entry = child
                        .as_deref_mut()
                        .and_then(ConfigValue::as_object_mut)
                        .and_then(|entries| entries.get_mut(&name))
                        .and_then(ConfigValue::as_object_mut);
                    let entry_prefix = format!("{child_prefix}{name}/");
                    scan(&child_dir.join(&name), sub, &entry_prefix, entry, out);
                }
            }
            TypeTag::Collection => {
                // Files beside the items are not items and have nowhere to
                // be absorbed, so they are only reported.
                for name in codec::list_entries(&child_dir) {
                    let path = child_dir.join(&name);
                    if !path.is_dir() {
                        out.push(UnknownEntry {
                            key: format!("{child_prefix}{name}"),
                            path,
                        });
                    }
                }
                // Items decode in sorted directory order, so the index lines up.
                for (index, name) in codec::list_dirs(&child_dir).into_iter().enumerate() {
                    let item = child.as_deref_mut().and_then(|value| match value {
                        ConfigValue::Objects(items) => items.get_mut(index),
                        _ => None,
                    });
                    let item_prefix = format!("{child_prefix}{name}/");
                    scan(&child_dir.join(&name), sub, &item_prefix, item, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::object_schema;
    use crate::schema::{SchemaDefinition, SchemaEntry};
    use crate::walk;
    use std::fs;
    use tempfile::TempDir;

    fn seeded() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("state"), "present\n").unwrap();
        fs::write(dir.path().join("typo"), "oops\n").unwrap();
        fs::create_dir(dir.path().join("explorer")).unwrap();
        fs::write(dir.path().join("explorer/state"), "absent\n").unwrap();
        fs::write(dir.path().join("explorer/stray"), "x\n").unwrap();
        dir
    }

    fn load(dir: &Path, policy: UnknownKeyPolicy) -> Result<Object, CconfigError> {
        let schema = object_schema();
        let mut value = walk::from_dir(dir, &schema)?;
        apply_policy(dir, &schema, &mut value, policy)?;
        Ok(value)
    }

    #[test]
    fn clean_directory_has_no_unknowns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("state"), "present\n").unwrap();
        assert!(unknown_entries(dir.path(), &object_schema()).is_empty());
    }

    #[test]
    fn finds_top_level_and_nested_entries() {
        let dir = seeded();
        let found = unknown_entries(dir.path(), &object_schema());
        let keys: Vec<&str> = found.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["typo", "explorer/stray"]);
        assert_eq!(found[1].path, dir.path().join("explorer/stray"));
    }

    #[test]
    fn ignore_leaves_value_untouched() {
        let dir = seeded();
        let value = load(dir.path(), UnknownKeyPolicy::Ignore).unwrap();
        assert!(!value.contains_key("typo"));
    }

    #[test]
    fn permissive_absorbs_entries_as_strings() {
        let dir = seeded();
        let value = load(dir.path(), UnknownKeyPolicy::Permissive).unwrap();
        assert_eq!(value["typo"], ConfigValue::from("oops"));
        let explorer = value["explorer"].as_object().unwrap();
        assert_eq!(explorer["stray"], ConfigValue::from("x"));
        assert_eq!(explorer["state"], ConfigValue::from("absent"));
    }

    #[test]
    fn strict_reports_every_unknown_entry() {
        let dir = seeded();
        let err = load(dir.path(), UnknownKeyPolicy::Strict).unwrap_err();
        match err {
            CconfigError::UnknownKeys(errors) => {
                assert_eq!(errors.len(), 2);
                match &errors[0] {
                    CconfigError::UnknownKey { key, .. } => assert_eq!(key, "typo"),
                    other => panic!("Expected UnknownKey, got: {other:?}"),
                }
            }
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn schema_less_dicts_accept_anything() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(&SchemaDefinition::from(vec![SchemaEntry::new(
            "conf",
            TypeTag::Dict,
        )]))
        .unwrap();
        fs::create_dir(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("conf/anything"), "x\n").unwrap();
        assert!(unknown_entries(dir.path(), &schema).is_empty());
    }

    #[test]
    fn collection_items_are_checked() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(&SchemaDefinition::from(vec![SchemaEntry::nested(
            "hosts",
            TypeTag::Collection,
            vec![("name", TypeTag::String)],
        )]))
        .unwrap();
        for name in ["alpha", "beta"] {
            fs::create_dir_all(dir.path().join("hosts").join(name)).unwrap();
            fs::write(dir.path().join("hosts").join(name).join("name"), format!("{name}\n")).unwrap();
        }
        fs::write(dir.path().join("hosts/beta/extra"), "e\n").unwrap();

        let found = unknown_entries(dir.path(), &schema);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "hosts/beta/extra");

        let mut value = walk::from_dir(dir.path(), &schema).unwrap();
        apply_policy(dir.path(), &schema, &mut value, UnknownKeyPolicy::Permissive).unwrap();
        let items = value["hosts"].as_objects().unwrap();
        assert!(!items[0].contains_key("extra"));
        assert_eq!(items[1]["extra"], ConfigValue::from("e"));
    }

    #[test]
    fn collection_stray_file_keeps_items_aligned() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(&SchemaDefinition::from(vec![SchemaEntry::nested(
            "hosts",
            TypeTag::Collection,
            vec![("name", TypeTag::String)],
        )]))
        .unwrap();
        fs::create_dir_all(dir.path().join("hosts/beta")).unwrap();
        fs::write(dir.path().join("hosts/beta/extra"), "e\n").unwrap();
        fs::write(dir.path().join("hosts/README"), "notes\n").unwrap();

        let found = unknown_entries(dir.path(), &schema);
        let keys: Vec<&str> = found.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["hosts/README", "hosts/beta/extra"]);

        let mut value = walk::from_dir(dir.path(), &schema).unwrap();
        apply_policy(dir.path(), &schema, &mut value, UnknownKeyPolicy::Permissive).unwrap();
        let items = value["hosts"].as_objects().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], ConfigValue::from("beta"));
        assert_eq!(items[0]["extra"], ConfigValue::from("e"));
    }

    #[test]
    fn mapping_entries_are_checked() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(&SchemaDefinition::from(vec![SchemaEntry::nested(
            "users",
            TypeTag::Mapping,
            vec![("label", TypeTag::String)],
        )]))
        .unwrap();
        fs::create_dir_all(dir.path().join("users/alice")).unwrap();
        fs::write(dir.path().join("users/alice/label"), "A\n").unwrap();
        fs::write(dir.path().join("users/alice/shell"), "zsh\n").unwrap();

        let mut value = walk::from_dir(dir.path(), &schema).unwrap();
        apply_policy(dir.path(), &schema, &mut value, UnknownKeyPolicy::Permissive).unwrap();
        let alice = value["users"].as_object().unwrap()["alice"].as_object().unwrap();
        assert_eq!(alice["shell"], ConfigValue::from("zsh"));
    }
}
