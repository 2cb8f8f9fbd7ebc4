//! The codec interface and the file helpers every codec shares.
//!
//! Codecs are lenient when reading and strict when writing:
//!
//! - A file that cannot be read (missing, permission denied, a directory where
//!   a file was expected) decodes as absent. Only "not found" is silent; other
//!   read failures are logged at `warn` level and then swallowed.
//! - Failures to create, write or remove anything are returned as
//!   [`CconfigError::IoError`] or [`CconfigError::DirectoryCreation`].
//!
//! All paths are passed in explicitly. No codec caches paths or depends on the
//! process working directory.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;

use crate::error::CconfigError;
use crate::schema::Schema;
use crate::types::TypeTag;
use crate::value::ConfigValue;

/// Paired decode/encode strategy for one [`TypeTag`].
pub trait Codec: fmt::Debug + Send + Sync {
    fn tag(&self) -> TypeTag;

    /// Read the value stored at `path`.
    fn decode(&self, path: &Path) -> Result<ConfigValue, CconfigError>;

    /// Write `value` to `path`. `None` means the key is absent from the
    /// in-memory object.
    fn encode(&self, path: &Path, value: Option<&ConfigValue>) -> Result<(), CconfigError>;

    /// The empty value for this codec, built without touching the disk.
    fn from_schema(&self) -> ConfigValue;

    /// The nested schema of a structural codec.
    fn subschema(&self) -> Option<&Schema> {
        None
    }
}

/// Read a whole file as text. Unreadable files are `None`.
pub(crate) fn read_text(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to read value; treating as absent");
            None
        }
    }
}

/// Names of the entries in a directory, sorted. A missing or unreadable
/// directory has no entries.
pub(crate) fn list_entries(path: &Path) -> Vec<String> {
    let reader = match std::fs::read_dir(path) {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to list directory; treating as empty");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = reader
        .filter_map(|entry| match entry {
            Ok(entry) => match entry.file_name().into_string() {
                Ok(name) => Some(name),
                Err(name) => {
                    warn!(path = %path.display(), name = ?name, "skipping entry with non-UTF-8 name");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to read directory entry");
                None
            }
        })
        .collect();
    names.sort();
    names
}

/// Like [`list_entries`], keeping only subdirectories.
pub(crate) fn list_dirs(path: &Path) -> Vec<String> {
    let mut names = list_entries(path);
    names.retain(|name| path.join(name).is_dir());
    names
}

pub(crate) fn write_text(path: &Path, content: &str) -> Result<(), CconfigError> {
    std::fs::write(path, content).map_err(|e| CconfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Remove a file if it exists. Directories are left alone.
pub(crate) fn remove_file(path: &Path) -> Result<(), CconfigError> {
    if !path.is_file() {
        return Ok(());
    }
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CconfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Make sure `path` is a directory, creating it (and its parents) if absent.
pub(crate) fn ensure_dir(path: &Path) -> Result<(), CconfigError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(CconfigError::DirectoryCreation {
            path: path.to_path_buf(),
        });
    }
    std::fs::create_dir_all(path).map_err(|e| CconfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Why `name` cannot be used as a single directory entry name, if it cannot.
pub(crate) fn entry_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains('/') {
        Some("name contains a path separator")
    } else if name.contains('\0') {
        Some("name contains a NUL byte")
    } else {
        None
    }
}
