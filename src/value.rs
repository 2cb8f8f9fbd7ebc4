//! In-memory values produced by decoding and consumed by encoding.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// A decoded directory: entry name → value, in schema declaration order (or
/// sorted directory order for dynamically keyed mappings).
pub type Object = IndexMap<String, ConfigValue>;

/// A tagged configuration value.
///
/// `None` inside `Str`, `Int` and `DateTime` means "no file on disk", which is
/// distinct from an empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Str(Option<String>),
    Int(Option<i64>),
    DateTime(Option<DateTime<Utc>>),
    StringList(Vec<String>),
    Object(Object),
    /// Items of a collection, each decoded with the collection's subschema.
    Objects(Vec<Object>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(Some(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ConfigValue::DateTime(Some(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringList(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            ConfigValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            ConfigValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&[Object]> {
        match self {
            ConfigValue::Objects(items) => Some(items),
            _ => None,
        }
    }

    /// True for the "absent" state of optional scalars.
    pub fn is_unset(&self) -> bool {
        matches!(
            self,
            ConfigValue::Str(None) | ConfigValue::Int(None) | ConfigValue::DateTime(None)
        )
    }

    /// Text form of a scalar, as it would be written to a file (without the
    /// trailing newline). `None` for unset scalars and structural values.
    pub fn to_text(&self) -> Option<String> {
        match self {
            ConfigValue::Bool(b) => Some(b.to_string()),
            ConfigValue::Str(s) => s.clone(),
            ConfigValue::Int(i) => i.map(|i| i.to_string()),
            ConfigValue::DateTime(t) => t.as_ref().map(timestamp_text),
            ConfigValue::StringList(_) | ConfigValue::Object(_) | ConfigValue::Objects(_) => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Str(_) => "string",
            ConfigValue::Int(_) => "integer",
            ConfigValue::DateTime(_) => "datetime",
            ConfigValue::StringList(_) => "list",
            ConfigValue::Object(_) => "object",
            ConfigValue::Objects(_) => "collection",
        }
    }
}

/// Unix timestamp text: whole seconds, or `seconds.fraction` with trailing
/// zeros trimmed when sub-second precision is present.
pub(crate) fn timestamp_text(t: &DateTime<Utc>) -> String {
    let nanos = t.timestamp_subsec_nanos();
    if nanos == 0 {
        return t.timestamp().to_string();
    }
    // timestamp() floors, so recombine before splitting to keep the sign right.
    let total = i128::from(t.timestamp()) * 1_000_000_000 + i128::from(nanos);
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    let frac = format!("{:09}", abs % 1_000_000_000);
    format!("{sign}{}.{}", abs / 1_000_000_000, frac.trim_end_matches('0'))
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Str(None) | ConfigValue::Int(None) | ConfigValue::DateTime(None) => {
                write!(f, "<not set>")
            }
            ConfigValue::Str(Some(s)) => write!(f, "{s}"),
            ConfigValue::Int(Some(i)) => write!(f, "{i}"),
            ConfigValue::DateTime(Some(t)) => write!(f, "{}", timestamp_text(t)),
            ConfigValue::StringList(items) => write!(f, "[{}]", items.join(", ")),
            ConfigValue::Object(_) | ConfigValue::Objects(_) => {
                let json = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
                write!(f, "{json}")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(Some(s.to_string()))
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(Some(s))
    }
}

impl From<Option<String>> for ConfigValue {
    fn from(s: Option<String>) -> Self {
        ConfigValue::Str(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(Some(i))
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Int(Some(i64::from(i)))
    }
}

impl From<Option<i64>> for ConfigValue {
    fn from(i: Option<i64>) -> Self {
        ConfigValue::Int(i)
    }
}

impl From<DateTime<Utc>> for ConfigValue {
    fn from(t: DateTime<Utc>) -> Self {
        ConfigValue::DateTime(Some(t))
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        ConfigValue::StringList(items)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(items: Vec<&str>) -> Self {
        ConfigValue::StringList(items.into_iter().map(String::from).collect())
    }
}

impl From<Object> for ConfigValue {
    fn from(obj: Object) -> Self {
        ConfigValue::Object(obj)
    }
}

impl From<Vec<Object>> for ConfigValue {
    fn from(items: Vec<Object>) -> Self {
        ConfigValue::Objects(items)
    }
}

/// Keyed access shared by plain objects and [`BoundDict`](crate::BoundDict).
///
/// Iteration follows the map's order, which for decoded values is the schema's
/// declaration order.
pub trait ConfigMap {
    fn get(&self, key: &str) -> Option<&ConfigValue>;
    fn set(&mut self, key: &str, value: ConfigValue);
    fn contains(&self, key: &str) -> bool;
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &ConfigValue)> + '_>;
}

impl ConfigMap for Object {
    fn get(&self, key: &str) -> Option<&ConfigValue> {
        IndexMap::get(self, key)
    }

    fn set(&mut self, key: &str, value: ConfigValue) {
        self.insert(key.to_string(), value);
    }

    fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &ConfigValue)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}
