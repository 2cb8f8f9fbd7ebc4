use std::path::PathBuf;

use thiserror::Error;

use crate::types::TypeTag;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum CconfigError {
    #[error("Unknown type tag '{0}'")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(cconfig::unknown_type_tag),
            help("register a codec for this tag, or use one of: boolean, string, integer, datetime, list, listdir, dict, mapping, collection")
        )
    )]
    UnknownTypeTag(String),

    #[error("Duplicate schema key '{0}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cconfig::duplicate_key)))]
    DuplicateSchemaKey(String),

    #[error("Schema key '{key}' has type {tag}, which does not take a subschema")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cconfig::unexpected_subschema)))]
    UnexpectedSubschema { key: String, tag: TypeTag },

    #[error("Invalid schema entry '{key}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cconfig::invalid_schema)))]
    InvalidSchema { key: String, reason: String },

    #[error("Failed to parse TOML schema declaration: {0}")]
    TomlSchema(#[from] toml::de::Error),

    #[error("Failed to parse JSON schema declaration: {0}")]
    JsonSchema(#[from] serde_json::Error),

    #[error("Cannot read {path} as {expected}: {content:?}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cconfig::type_coercion)))]
    TypeCoercion {
        path: PathBuf,
        expected: TypeTag,
        content: String,
    },

    #[error("Type {tag} does not support {operation} (at {path})")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(cconfig::unsupported_operation),
            help("save only the keys that are writable, e.g. with save_keys()")
        )
    )]
    UnsupportedOperation {
        tag: TypeTag,
        operation: &'static str,
        path: PathBuf,
    },

    #[error("Cannot create directory {path}: a non-directory file is in the way")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cconfig::directory_creation)))]
    DirectoryCreation { path: PathBuf },

    #[error("Unknown key '{key}' in {path}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(cconfig::unknown_key),
            help("declare the key in the schema, or load with UnknownKeyPolicy::Ignore")
        )
    )]
    UnknownKey { key: String, path: PathBuf },

    #[error("Unknown keys in config directory")]
    UnknownKeys(Vec<CconfigError>),

    #[error("Invalid entry name at {path}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(cconfig::invalid_entry_name)))]
    InvalidEntryName { path: PathBuf, reason: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to write {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Schema is required: call .schema() on the builder")]
    SchemaRequired,

    #[error("Path is required: call .path() on the builder")]
    PathRequired,
}
