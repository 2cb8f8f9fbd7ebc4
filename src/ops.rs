//! Inspection operations: path lookup, listing, schema description.
//!
//! Provides the logic behind [`ConfigAction`](crate::types::ConfigAction) and
//! the `ConfigResult` enum that callers use to display results.

use std::fmt;

use crate::error::CconfigError;
use crate::schema::Schema;
use crate::types::TypeTag;
use crate::value::{ConfigValue, Object};

/// Result of an inspection. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// One value, by path.
    KeyValue { key: String, value: String },
    /// Every leaf value, flattened to slash paths.
    Listing { entries: Vec<(String, String)> },
    /// Declared paths and their tags.
    SchemaListing { entries: Vec<(String, TypeTag)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::KeyValue { key, value } => write!(f, "{key} = {value}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            ConfigResult::SchemaListing { entries } => {
                for (i, (path, tag)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{path} {tag}")?;
                }
                Ok(())
            }
        }
    }
}

/// Resolve a slash-separated path. Inside a collection the segment after
/// the collection key is an item index, e.g. `hosts/0/name`.
pub fn get_path<'a>(object: &'a Object, path: &str) -> Result<&'a ConfigValue, CconfigError> {
    let not_found = || CconfigError::KeyNotFound(path.to_string());
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next().ok_or_else(not_found)?;
    let mut current = object.get(first).ok_or_else(not_found)?;

    while let Some(segment) = segments.next() {
        current = match current {
            ConfigValue::Object(obj) => obj.get(segment),
            ConfigValue::Objects(items) => {
                let item = segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(not_found)?;
                let key = segments.next().ok_or_else(not_found)?;
                item.get(key)
            }
            _ => None,
        }
        .ok_or_else(not_found)?;
    }
    Ok(current)
}

/// Get a value by path, rendered for display.
pub fn get_value(object: &Object, key: &str) -> Result<ConfigResult, CconfigError> {
    let value = get_path(object, key)?;
    Ok(ConfigResult::KeyValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Flatten an object into `(path, value)` pairs, in order.
pub fn list_values(object: &Object) -> ConfigResult {
    let mut entries = Vec::new();
    flatten_into("", object, &mut entries);
    ConfigResult::Listing { entries }
}

fn flatten_into(prefix: &str, object: &Object, out: &mut Vec<(String, String)>) {
    for (key, value) in object {
        let path = format!("{prefix}{key}");
        match value {
            ConfigValue::Object(inner) if !inner.is_empty() => {
                flatten_into(&format!("{path}/"), inner, out);
            }
            ConfigValue::Objects(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    flatten_into(&format!("{path}/{index}/"), item, out);
                }
            }
            leaf => out.push((path, leaf.to_string())),
        }
    }
}

pub fn describe(schema: &Schema) -> ConfigResult {
    ConfigResult::SchemaListing {
        entries: schema.describe(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::object_schema;

    fn sample() -> Object {
        let mut obj = object_schema().from_schema();
        obj.insert("state".into(), "present".into());
        obj.insert("changed".into(), true.into());
        if let Some(explorer) = obj.get_mut("explorer").and_then(ConfigValue::as_object_mut) {
            explorer.insert("state".into(), "absent".into());
        }
        let mut host = Object::new();
        host.insert("name".into(), "alpha".into());
        obj.insert("hosts".into(), ConfigValue::Objects(vec![host]));
        obj
    }

    #[test]
    fn get_top_level() {
        let obj = sample();
        assert_eq!(get_path(&obj, "state").unwrap(), &ConfigValue::from("present"));
    }

    #[test]
    fn get_nested() {
        let obj = sample();
        assert_eq!(
            get_path(&obj, "explorer/state").unwrap(),
            &ConfigValue::from("absent")
        );
    }

    #[test]
    fn get_collection_item() {
        let obj = sample();
        assert_eq!(
            get_path(&obj, "hosts/0/name").unwrap(),
            &ConfigValue::from("alpha")
        );
        assert!(get_path(&obj, "hosts/1/name").is_err());
    }

    #[test]
    fn get_missing_key_errors() {
        let obj = sample();
        let err = get_path(&obj, "explorer/nope").unwrap_err();
        assert!(matches!(err, CconfigError::KeyNotFound(k) if k == "explorer/nope"));
        assert!(get_path(&obj, "").is_err());
        assert!(get_path(&obj, "state/deeper").is_err());
    }

    #[test]
    fn get_value_renders_unset() {
        let obj = sample();
        let result = get_value(&obj, "source").unwrap();
        assert_eq!(result.to_string(), "source = <not set>");
    }

    #[test]
    fn listing_flattens_in_order() {
        let obj = sample();
        let ConfigResult::Listing { entries } = list_values(&obj) else {
            panic!("expected a listing");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "changed",
                "code-remote",
                "source",
                "explorer/state",
                "parameter/state",
                "state",
                "hosts/0/name",
            ]
        );
        assert_eq!(entries[0].1, "true");
        assert_eq!(entries[1].1, "<not set>");
    }

    #[test]
    fn listing_display() {
        let mut obj = Object::new();
        obj.insert("a".into(), "1".into());
        obj.insert("b".into(), ConfigValue::Int(None));
        assert_eq!(list_values(&obj).to_string(), "a = 1\nb = <not set>");
    }

    #[test]
    fn describe_lists_nested_paths() {
        let result = describe(&object_schema());
        let text = result.to_string();
        assert!(text.contains("explorer dict"));
        assert!(text.contains("explorer/state string"));
    }
}
