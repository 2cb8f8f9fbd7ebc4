//! Schema-typed configuration stored as a directory tree. Declare the shape,
//! point at a directory, and go.
//!
//! Cconfig maps a nested configuration value onto files and directories: one
//! file per scalar, one directory per nested structure. Every key's on-disk
//! form is chosen by its [`TypeTag`], so a directory edited by hand, by shell
//! scripts, or by another program stays readable by all of them.
//!
//! ```ignore
//! let schema = Schema::from_json_str(r#"[
//!     ["changed", "boolean"],
//!     ["source", "string"],
//!     ["explorer", "dict", [["state", "string"]]]
//! ]"#)?;
//! let obj = Cconfig::builder().schema(schema).path("/srv/objects/web").load()?;
//! ```
//!
//! # Schema as source of truth
//!
//! A [`Schema`] is an ordered list of `(key, tag[, subschema])` entries. It is
//! built once, from Rust ([`SchemaDefinition`]), JSON, or TOML, and defines:
//!
//! - **which keys exist**: only declared keys are read or written;
//! - **their order**: declaration order is the iteration order of decoded
//!   objects and the order in which keys are written;
//! - **their representation**: each tag resolves, through the [`Registry`],
//!   to a [`Codec`] that knows how to decode and encode it.
//!
//! [`Schema::from_schema`] produces a value with every key set to its empty
//! form without touching the disk, so tooling can pre-populate a value before
//! the first save.
//!
//! # On-disk representation
//!
//! | Tag          | On disk                                                  |
//! |--------------|----------------------------------------------------------|
//! | `boolean`    | the file exists (`true`) or not (`false`)                |
//! | `string`     | file content; one trailing newline is added and stripped |
//! | `integer`    | decimal text                                             |
//! | `datetime`   | Unix timestamp text, seconds with optional fraction      |
//! | `list`       | one element per line                                     |
//! | `listdir`    | the names of a directory's entries (read-only)           |
//! | `dict`       | a directory holding the subschema's keys                 |
//! | `mapping`    | a directory whose entry names are data                   |
//! | `collection` | a directory of items, named by a discriminator key       |
//!
//! An unset string, integer or datetime has no file, and saving one leaves
//! whatever file is already there untouched. A dict or mapping
//! without a subschema reads files as plain strings and directories as nested
//! objects.
//!
//! # Lenient reads, strict writes
//!
//! A file that cannot be read decodes as absent; read failures other than
//! "not found" are logged through `tracing` and swallowed. Failures to create,
//! write, or remove anything are returned as errors. Content that is present
//! but malformed (`abc` in an integer file) is always an error.
//!
//! # Unknown entries
//!
//! The tree walker only visits declared keys. The builder adds a policy on
//! top, chosen with [`unknown_keys()`](CconfigBuilder::unknown_keys):
//!
//! - **[`Permissive`](UnknownKeyPolicy::Permissive)** (default): undeclared
//!   entries are loaded as plain strings alongside declared ones.
//! - **[`Ignore`](UnknownKeyPolicy::Ignore)**: undeclared entries are skipped.
//! - **[`Strict`](UnknownKeyPolicy::Strict)**: loading fails with every
//!   undeclared path listed.
//!
//! # Live view
//!
//! [`BoundDict`] keeps a value bound to its directory and tracks which
//! top-level keys changed. `save()` writes only those keys, `load()` re-reads
//! everything, and a [`scope()`](BoundDict::scope) flushes on entry and syncs
//! on exit, so code inside the scope sees the directory matching memory and
//! code after it sees any changes made on disk meanwhile.
//!
//! # Error handling
//!
//! All fallible operations return [`CconfigError`]. With the `rich-errors`
//! feature, errors also implement `miette::Diagnostic` with codes and help
//! text. See the [`error`] module for the full set.

pub mod error;
pub mod types;

mod bound;
mod builder;
mod codec;
mod ops;
mod registry;
mod scalar;
mod schema;
mod structural;
mod validate;
mod value;
pub mod walk;

#[cfg(test)]
mod fixtures;

pub use bound::{BoundDict, BoundScope};
pub use builder::{Cconfig, CconfigBuilder};
pub use codec::Codec;
pub use error::CconfigError;
pub use ops::{ConfigResult, get_path, list_values};
pub use registry::{CodecFactory, Registry};
pub use scalar::{BooleanCodec, DateTimeCodec, IntegerCodec, ListCodec, ListDirCodec, StringCodec};
pub use schema::{Schema, SchemaDefinition, SchemaEntry};
pub use structural::{CollectionCodec, DictCodec, InferredCodec, MappingCodec};
pub use types::{ConfigAction, TypeTag, UnknownKeyPolicy};
pub use validate::{UnknownEntry, unknown_entries};
pub use value::{ConfigMap, ConfigValue, Object};
pub use walk::{from_dir, from_schema, to_dir};
