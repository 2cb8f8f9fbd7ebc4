use std::path::PathBuf;

use crate::bound::BoundDict;
use crate::error::CconfigError;
use crate::ops::{self, ConfigResult};
use crate::schema::{Schema, SchemaDefinition};
use crate::types::{ConfigAction, UnknownKeyPolicy};
use crate::validate;
use crate::value::Object;
use crate::walk;

/// Entry point for building a cconfig directory handle.
pub struct Cconfig;

impl Cconfig {
    pub fn builder() -> CconfigBuilder {
        CconfigBuilder::new()
    }
}

/// Builder for loading, saving and binding one config directory.
///
/// A schema and a path are required. The schema may be given ready-built
/// ([`schema()`](Self::schema)) or as a declaration that is resolved against
/// the built-in registry when a terminal operation runs
/// ([`schema_definition()`](Self::schema_definition)).
#[derive(Debug, Default)]
pub struct CconfigBuilder {
    schema: Option<Schema>,
    definition: Option<SchemaDefinition>,
    path: Option<PathBuf>,
    policy: UnknownKeyPolicy,
}

impl CconfigBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self.definition = None;
        self
    }

    pub fn schema_definition(mut self, definition: SchemaDefinition) -> Self {
        self.definition = Some(definition);
        self.schema = None;
        self
    }

    /// The config directory.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// What to do with undeclared entries (default:
    /// [`UnknownKeyPolicy::Permissive`]).
    pub fn unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn effective_schema(&self) -> Result<Schema, CconfigError> {
        match (&self.schema, &self.definition) {
            (Some(schema), _) => Ok(schema.clone()),
            (None, Some(definition)) => Schema::new(definition),
            (None, None) => Err(CconfigError::SchemaRequired),
        }
    }

    fn effective_path(&self) -> Result<PathBuf, CconfigError> {
        self.path.clone().ok_or(CconfigError::PathRequired)
    }

    /// Decode the directory, then apply the unknown-key policy.
    pub fn load(self) -> Result<Object, CconfigError> {
        let schema = self.effective_schema()?;
        let path = self.effective_path()?;
        let mut value = walk::from_dir(&path, &schema)?;
        validate::apply_policy(&path, &schema, &mut value, self.policy)?;
        Ok(value)
    }

    /// Encode every schema key of `value` into the directory.
    pub fn save(self, value: &Object) -> Result<(), CconfigError> {
        let schema = self.effective_schema()?;
        let path = self.effective_path()?;
        walk::to_dir(&path, value, &schema)
    }

    /// The empty object for the schema. No path needed, no disk access.
    pub fn empty(self) -> Result<Object, CconfigError> {
        Ok(walk::from_schema(&self.effective_schema()?))
    }

    /// Bind `value` to the directory without reading it.
    pub fn bind(self, value: Object) -> Result<BoundDict, CconfigError> {
        let schema = self.effective_schema()?;
        let path = self.effective_path()?;
        Ok(BoundDict::bind(value, path, schema).with_policy(self.policy))
    }

    /// Bind to the directory and load its content.
    pub fn open(self) -> Result<BoundDict, CconfigError> {
        let mut bound = self.bind(Object::new())?;
        bound.load()?;
        Ok(bound)
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(self, action: &ConfigAction) -> Result<(), CconfigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / get / describe).
    pub fn handle(self, action: &ConfigAction) -> Result<ConfigResult, CconfigError> {
        match action {
            ConfigAction::List => Ok(ops::list_values(&self.load()?)),
            ConfigAction::Get { key } => ops::get_value(&self.load()?, key),
            ConfigAction::Describe => Ok(ops::describe(&self.effective_schema()?)),
        }
    }
}
