//! Codecs for values stored in a single file (or, for `listdir`, read from a
//! directory listing).
//!
//! | Tag        | Missing on disk | Encoding "nothing"                        |
//! |------------|-----------------|-------------------------------------------|
//! | `boolean`  | `false`         | `false` removes the file                  |
//! | `string`   | `None`          | `None` or `""` leaves the file alone      |
//! | `integer`  | `None`          | `None` leaves the file alone              |
//! | `datetime` | `None`          | `None` leaves the file alone              |
//! | `list`     | `[]`            | `[]` removes the file, `None` leaves it   |
//! | `listdir`  | `[]`            | read-only, encoding always fails          |

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::codec::{self, Codec};
use crate::error::CconfigError;
use crate::types::TypeTag;
use crate::value::{ConfigValue, timestamp_text};

/// `true` iff the path is a regular file.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl Codec for BooleanCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::Boolean
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        Ok(ConfigValue::Bool(path.is_file()))
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        if value.is_some_and(is_truthy) {
            if !path.is_file() {
                codec::write_text(path, "")?;
            }
            Ok(())
        } else {
            codec::remove_file(path)
        }
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::Bool(false)
    }
}

fn is_truthy(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Bool(b) => *b,
        ConfigValue::Str(s) => s.as_deref().is_some_and(|s| !s.is_empty()),
        ConfigValue::Int(i) => i.is_some_and(|i| i != 0),
        ConfigValue::DateTime(t) => t.is_some(),
        ConfigValue::StringList(items) => !items.is_empty(),
        ConfigValue::Object(obj) => !obj.is_empty(),
        ConfigValue::Objects(items) => !items.is_empty(),
    }
}

/// File content without its trailing line terminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl StringCodec {
    pub(crate) fn read(path: &Path) -> Option<String> {
        codec::read_text(path).map(|mut content| {
            if content.ends_with('\n') {
                content.pop();
                if content.ends_with('\r') {
                    content.pop();
                }
            }
            content
        })
    }

    /// Write `text` plus a newline. Without text nothing is written and an
    /// existing file is left as it is, so a file that could not be read
    /// survives a load and save.
    fn write(path: &Path, text: Option<&str>) -> Result<(), CconfigError> {
        match text {
            Some(text) if !text.is_empty() => codec::write_text(path, &format!("{text}\n")),
            _ => Ok(()),
        }
    }
}

impl Codec for StringCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        Ok(ConfigValue::Str(Self::read(path)))
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        match value {
            None => Self::write(path, None),
            Some(v @ (ConfigValue::StringList(_) | ConfigValue::Object(_) | ConfigValue::Objects(_))) => {
                Err(coercion_error(path, TypeTag::String, v))
            }
            Some(v) => Self::write(path, v.to_text().as_deref()),
        }
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::Str(None)
    }
}

/// String content parsed as a signed 64-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl IntegerCodec {
    fn parse(path: &Path, text: &str) -> Result<Option<i64>, CconfigError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<i64>()
            .map(Some)
            .map_err(|_| CconfigError::TypeCoercion {
                path: path.to_path_buf(),
                expected: TypeTag::Integer,
                content: text.to_string(),
            })
    }
}

impl Codec for IntegerCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::Integer
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        match StringCodec::read(path) {
            Some(text) => Ok(ConfigValue::Int(Self::parse(path, &text)?)),
            None => Ok(ConfigValue::Int(None)),
        }
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        let number = match value {
            None | Some(ConfigValue::Int(None) | ConfigValue::Str(None)) => None,
            Some(ConfigValue::Int(Some(i))) => Some(*i),
            Some(ConfigValue::Str(Some(s))) => Self::parse(path, s)?,
            Some(other) => return Err(coercion_error(path, TypeTag::Integer, other)),
        };
        StringCodec::write(path, number.map(|i| i.to_string()).as_deref())
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::Int(None)
    }
}

/// String content interpreted as a Unix timestamp in seconds, optionally with
/// a fractional part.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl DateTimeCodec {
    fn parse(path: &Path, text: &str) -> Result<Option<DateTime<Utc>>, CconfigError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        parse_timestamp(trimmed)
            .map(Some)
            .ok_or_else(|| CconfigError::TypeCoercion {
                path: path.to_path_buf(),
                expected: TypeTag::DateTime,
                content: text.to_string(),
            })
    }
}

impl Codec for DateTimeCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::DateTime
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        match StringCodec::read(path) {
            Some(text) => Ok(ConfigValue::DateTime(Self::parse(path, &text)?)),
            None => Ok(ConfigValue::DateTime(None)),
        }
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        let text = match value {
            None
            | Some(ConfigValue::DateTime(None) | ConfigValue::Int(None) | ConfigValue::Str(None)) => {
                None
            }
            Some(ConfigValue::DateTime(Some(t))) => Some(timestamp_text(t)),
            Some(ConfigValue::Int(Some(secs))) => Some(secs.to_string()),
            Some(ConfigValue::Str(Some(s))) => Self::parse(path, s)?.as_ref().map(timestamp_text),
            Some(other) => return Err(coercion_error(path, TypeTag::DateTime, other)),
        };
        StringCodec::write(path, text.as_deref())
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::DateTime(None)
    }
}

/// Parse `[-]seconds[.fraction]` into a UTC timestamp. Fractions beyond
/// nanosecond precision are truncated.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    const NANOS: i128 = 1_000_000_000;

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let whole: i128 = whole.parse().ok()?;
    let frac = &frac[..frac.len().min(9)];
    let nanos: i128 = if frac.is_empty() {
        0
    } else {
        frac.parse::<i128>().ok()? * 10_i128.pow(9 - frac.len() as u32)
    };

    let mut total = whole.checked_mul(NANOS)?.checked_add(nanos)?;
    if negative {
        total = -total;
    }
    let secs = i64::try_from(total.div_euclid(NANOS)).ok()?;
    let nsecs = u32::try_from(total.rem_euclid(NANOS)).ok()?;
    DateTime::from_timestamp(secs, nsecs)
}

/// One element per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec;

impl Codec for ListCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::List
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        let items = codec::read_text(path)
            .map(|content| content.lines().map(String::from).collect())
            .unwrap_or_default();
        Ok(ConfigValue::StringList(items))
    }

    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        let items: &[String] = match value {
            Some(ConfigValue::StringList(items)) => items,
            None => return Ok(()),
            Some(other) => {
                debug!(path = %path.display(), kind = other.kind(), "non-list value written as empty list");
                &[]
            }
        };
        if items.is_empty() {
            return codec::remove_file(path);
        }
        let mut content = items.join("\n");
        content.push('\n');
        codec::write_text(path, &content)
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::StringList(Vec::new())
    }
}

/// Names of the entries in a directory. Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDirCodec;

impl Codec for ListDirCodec {
    fn tag(&self) -> TypeTag {
        TypeTag::ListDir
    }

    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError> {
        Ok(ConfigValue::StringList(codec::list_entries(path)))
    }

    fn encode(&self, path: &Path, _value: Option<&ConfigValue>) -> Result<(), CconfigError> {
        Err(CconfigError::UnsupportedOperation {
            tag: TypeTag::ListDir,
            operation: "encode",
            path: path.to_path_buf(),
        })
    }

    fn from_schema(&self) -> ConfigValue {
        ConfigValue::StringList(Vec::new())
    }
}

fn coercion_error(path: &Path, expected: TypeTag, value: &ConfigValue) -> CconfigError {
    CconfigError::TypeCoercion {
        path: path.to_path_buf(),
        expected,
        content: format!("<{}>", value.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    // --- boolean ---

    #[test]
    fn boolean_true_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changed");
        BooleanCodec.encode(&path, Some(&true.into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(BooleanCodec.decode(&path).unwrap(), ConfigValue::Bool(true));
    }

    #[test]
    fn boolean_false_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changed");
        fs::write(&path, "").unwrap();
        BooleanCodec.encode(&path, Some(&false.into())).unwrap();
        assert!(!path.exists());
        assert_eq!(BooleanCodec.decode(&path).unwrap(), ConfigValue::Bool(false));
    }

    #[test]
    fn boolean_true_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changed");
        fs::write(&path, "marker\n").unwrap();
        BooleanCodec.encode(&path, Some(&true.into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "marker\n");
    }

    #[test]
    fn boolean_directory_is_false() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub");
        fs::create_dir(&path).unwrap();
        assert_eq!(BooleanCodec.decode(&path).unwrap(), ConfigValue::Bool(false));
    }

    // --- string ---

    #[test]
    fn string_round_trip_adds_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        StringCodec.encode(&path, Some(&"hello".into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(StringCodec.decode(&path).unwrap(), ConfigValue::from("hello"));
    }

    #[test]
    fn string_strips_only_one_line_terminator() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, "two\n\n").unwrap();
        assert_eq!(StringCodec.decode(&path).unwrap(), ConfigValue::from("two\n"));
        fs::write(&path, "crlf\r\n").unwrap();
        assert_eq!(StringCodec.decode(&path).unwrap(), ConfigValue::from("crlf"));
    }

    #[test]
    fn string_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let value = StringCodec.decode(&dir.path().join("state")).unwrap();
        assert_eq!(value, ConfigValue::Str(None));
    }

    #[test]
    fn string_none_and_empty_leave_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, "old\n").unwrap();
        StringCodec.encode(&path, None).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");

        StringCodec.encode(&path, Some(&"".into())).unwrap();
        StringCodec.encode(&path, Some(&ConfigValue::Str(None))).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
    }

    #[test]
    fn string_none_writes_nothing_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        StringCodec.encode(&path, None).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn string_unreadable_file_survives_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, [0xff, 0xfe, b'x', b'\n']).unwrap();
        let value = StringCodec.decode(&path).unwrap();
        assert_eq!(value, ConfigValue::Str(None));
        StringCodec.encode(&path, Some(&value)).unwrap();
        assert_eq!(fs::read(&path).unwrap(), [0xff, 0xfe, b'x', b'\n']);
    }

    #[test]
    fn string_empty_file_is_empty_string() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, "").unwrap();
        assert_eq!(StringCodec.decode(&path).unwrap(), ConfigValue::from(""));
    }

    #[test]
    fn string_accepts_integer_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("port");
        StringCodec.encode(&path, Some(&8080.into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "8080\n");
    }

    #[test]
    fn string_rejects_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        let err = StringCodec
            .encode(&path, Some(&ConfigValue::Object(Default::default())))
            .unwrap_err();
        assert!(matches!(err, CconfigError::TypeCoercion { expected: TypeTag::String, .. }));
    }

    // --- integer ---

    #[test]
    fn integer_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("age");
        IntegerCodec.encode(&path, Some(&42.into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "42\n");
        assert_eq!(IntegerCodec.decode(&path).unwrap(), ConfigValue::Int(Some(42)));
    }

    #[test]
    fn integer_negative() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("offset");
        fs::write(&path, "-17\n").unwrap();
        assert_eq!(IntegerCodec.decode(&path).unwrap(), ConfigValue::Int(Some(-17)));
    }

    #[test]
    fn integer_not_a_number_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("age");
        fs::write(&path, "not-a-number\n").unwrap();
        let err = IntegerCodec.decode(&path).unwrap_err();
        match err {
            CconfigError::TypeCoercion {
                expected, content, ..
            } => {
                assert_eq!(expected, TypeTag::Integer);
                assert_eq!(content, "not-a-number");
            }
            other => panic!("Expected TypeCoercion, got: {other:?}"),
        }
    }

    #[test]
    fn integer_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let value = IntegerCodec.decode(&dir.path().join("age")).unwrap();
        assert_eq!(value, ConfigValue::Int(None));
    }

    #[test]
    fn integer_encode_coerces_numeric_string() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("age");
        IntegerCodec.encode(&path, Some(&" 7 ".into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "7\n");
    }

    #[test]
    fn integer_none_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("age");
        fs::write(&path, "30\n").unwrap();
        IntegerCodec.encode(&path, None).unwrap();
        IntegerCodec.encode(&path, Some(&ConfigValue::Int(None))).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "30\n");
    }

    #[test]
    fn integer_encode_rejects_bad_string() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("age");
        let err = IntegerCodec.encode(&path, Some(&"seven".into())).unwrap_err();
        assert!(matches!(err, CconfigError::TypeCoercion { .. }));
        assert!(!path.exists());
    }

    // --- datetime ---

    #[test]
    fn datetime_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("created");
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        DateTimeCodec.encode(&path, Some(&t.into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1700000000\n");
        assert_eq!(DateTimeCodec.decode(&path).unwrap(), ConfigValue::DateTime(Some(t)));
    }

    #[test]
    fn datetime_fractional_seconds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("created");
        fs::write(&path, "1700000000.5\n").unwrap();
        let expected = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(
            DateTimeCodec.decode(&path).unwrap(),
            ConfigValue::DateTime(Some(expected))
        );
    }

    #[test]
    fn datetime_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("created");
        fs::write(&path, "yesterday\n").unwrap();
        let err = DateTimeCodec.decode(&path).unwrap_err();
        assert!(matches!(err, CconfigError::TypeCoercion { expected: TypeTag::DateTime, .. }));
    }

    #[test]
    fn datetime_none_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("created");
        fs::write(&path, "1700000000\n").unwrap();
        DateTimeCodec.encode(&path, None).unwrap();
        DateTimeCodec.encode(&path, Some(&ConfigValue::DateTime(None))).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1700000000\n");
    }

    #[test]
    fn parse_timestamp_forms() {
        assert_eq!(parse_timestamp("0"), DateTime::from_timestamp(0, 0));
        assert_eq!(parse_timestamp("-0.5"), DateTime::from_timestamp(-1, 500_000_000));
        assert_eq!(parse_timestamp("12.000000001"), DateTime::from_timestamp(12, 1));
        assert_eq!(parse_timestamp(".5"), None);
        assert_eq!(parse_timestamp("1e9"), None);
    }

    // --- list ---

    #[test]
    fn list_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups");
        ListCodec.encode(&path, Some(&vec!["a", "b"].into())).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
        assert_eq!(ListCodec.decode(&path).unwrap(), ConfigValue::from(vec!["a", "b"]));
    }

    #[test]
    fn list_empty_round_trips_to_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups");
        fs::write(&path, "stale\n").unwrap();
        ListCodec.encode(&path, Some(&ConfigValue::StringList(vec![]))).unwrap();
        assert!(!path.exists());
        assert_eq!(ListCodec.decode(&path).unwrap(), ConfigValue::StringList(vec![]));
    }

    #[test]
    fn list_none_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups");
        fs::write(&path, "kept\n").unwrap();
        ListCodec.encode(&path, None).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept\n");
    }

    #[test]
    fn list_empty_file_is_empty_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups");
        fs::write(&path, "").unwrap();
        assert_eq!(ListCodec.decode(&path).unwrap(), ConfigValue::StringList(vec![]));
    }

    #[test]
    fn list_non_list_value_coerced_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups");
        fs::write(&path, "stale\n").unwrap();
        ListCodec.encode(&path, Some(&"scalar".into())).unwrap();
        assert!(!path.exists());
    }

    // --- listdir ---

    #[test]
    fn listdir_lists_entry_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("children");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("zeta"), "").unwrap();
        fs::create_dir(path.join("alpha")).unwrap();
        assert_eq!(
            ListDirCodec.decode(&path).unwrap(),
            ConfigValue::from(vec!["alpha", "zeta"])
        );
    }

    #[test]
    fn listdir_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let value = ListDirCodec.decode(&dir.path().join("children")).unwrap();
        assert_eq!(value, ConfigValue::StringList(vec![]));
    }

    #[test]
    fn listdir_encode_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let err = ListDirCodec
            .encode(&dir.path().join("children"), Some(&vec!["a"].into()))
            .unwrap_err();
        assert!(matches!(
            err,
            CconfigError::UnsupportedOperation { tag: TypeTag::ListDir, .. }
        ));
    }

    #[test]
    fn empty_values() {
        assert_eq!(BooleanCodec.from_schema(), ConfigValue::Bool(false));
        assert_eq!(StringCodec.from_schema(), ConfigValue::Str(None));
        assert_eq!(IntegerCodec.from_schema(), ConfigValue::Int(None));
        assert_eq!(DateTimeCodec.from_schema(), ConfigValue::DateTime(None));
        assert_eq!(ListCodec.from_schema(), ConfigValue::StringList(vec![]));
        assert_eq!(ListDirCodec.from_schema(), ConfigValue::StringList(vec![]));
    }
}
