//! Schema-driven traversal between a directory tree and an [`Object`].
//!
//! `from_dir` asks each declared key's codec to decode `base/<key>`; `to_dir`
//! asks each codec to encode the object's value (or its absence) back to the
//! same path. Keys are always visited in schema declaration order. Entries on
//! disk that the schema does not declare are left alone; see the `validate`
//! module for the unknown-key policies built on top.

use std::path::Path;

use tracing::{debug, trace};

use crate::codec;
use crate::error::CconfigError;
use crate::schema::Schema;
use crate::value::Object;

/// Decode every key of `schema` from the directory at `base`.
pub fn from_dir(base: &Path, schema: &Schema) -> Result<Object, CconfigError> {
    debug!(path = %base.display(), keys = schema.len(), "loading config directory");
    let mut out = Object::with_capacity(schema.len());
    for (key, codec) in schema.items() {
        trace!(key, "decode");
        out.insert(key.to_string(), codec.decode(&base.join(key))?);
    }
    Ok(out)
}

/// Decode only `keys`. The result still follows schema order.
pub fn from_dir_keys(base: &Path, schema: &Schema, keys: &[&str]) -> Result<Object, CconfigError> {
    check_keys(schema, keys)?;
    debug!(path = %base.display(), ?keys, "loading config keys");
    let mut out = Object::with_capacity(keys.len());
    for (key, codec) in schema.items().filter(|(k, _)| keys.contains(k)) {
        trace!(key, "decode");
        out.insert(key.to_string(), codec.decode(&base.join(key))?);
    }
    Ok(out)
}

/// Encode every key of `schema` into the directory at `base`, creating it if
/// needed. Keys missing from `value` are encoded as absent: scalar files are
/// left as they are and a boolean is cleared.
pub fn to_dir(base: &Path, value: &Object, schema: &Schema) -> Result<(), CconfigError> {
    debug!(path = %base.display(), keys = schema.len(), "saving config directory");
    codec::ensure_dir(base)?;
    for (key, codec) in schema.items() {
        trace!(key, present = value.contains_key(key), "encode");
        codec.encode(&base.join(key), value.get(key))?;
    }
    Ok(())
}

/// Encode only `keys`, in schema order. Other entries on disk are untouched.
pub fn to_dir_keys(
    base: &Path,
    value: &Object,
    schema: &Schema,
    keys: &[&str],
) -> Result<(), CconfigError> {
    check_keys(schema, keys)?;
    debug!(path = %base.display(), ?keys, "saving config keys");
    codec::ensure_dir(base)?;
    for (key, codec) in schema.items().filter(|(k, _)| keys.contains(k)) {
        trace!(key, present = value.contains_key(key), "encode");
        codec.encode(&base.join(key), value.get(key))?;
    }
    Ok(())
}

/// The empty object for `schema`, built without touching the disk.
pub fn from_schema(schema: &Schema) -> Object {
    schema.from_schema()
}

fn check_keys(schema: &Schema, keys: &[&str]) -> Result<(), CconfigError> {
    match keys.iter().find(|k| !schema.contains(k)) {
        Some(missing) => Err(CconfigError::KeyNotFound((*missing).to_string())),
        None => Ok(()),
    }
}
