//! A directory-backed object with dirty-key tracking.
//!
//! [`BoundDict`] pairs an in-memory [`Object`] with the directory it mirrors.
//! Assignments that change a top-level key mark that key dirty; [`save`]
//! writes only the dirty keys, [`load`] re-reads everything, and [`sync`] does
//! both in that order.
//!
//! ```ignore
//! let mut obj = BoundDict::open("/srv/objects/web", schema)?;
//! {
//!     let mut scope = obj.scope()?;
//!     scope.set("state", "present");
//!     scope.close()?; // saves `state`, then reloads
//! }
//! ```
//!
//! Dropping a `BoundDict` never writes anything.
//!
//! [`save`]: BoundDict::save
//! [`load`]: BoundDict::load
//! [`sync`]: BoundDict::sync

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CconfigError;
use crate::schema::Schema;
use crate::types::UnknownKeyPolicy;
use crate::validate;
use crate::value::{ConfigMap, ConfigValue, Object};
use crate::walk;

#[derive(Debug, Clone)]
pub struct BoundDict {
    value: Object,
    path: PathBuf,
    schema: Schema,
    dirty: BTreeSet<String>,
    policy: UnknownKeyPolicy,
}

impl BoundDict {
    /// Wrap `value` without reading the directory.
    pub fn bind(value: Object, path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            value,
            path: path.into(),
            schema,
            dirty: BTreeSet::new(),
            policy: UnknownKeyPolicy::Ignore,
        }
    }

    /// Bind to `path` and load its current content.
    pub fn open(path: impl Into<PathBuf>, schema: Schema) -> Result<Self, CconfigError> {
        let mut bound = Self::bind(Object::new(), path, schema);
        bound.load()?;
        Ok(bound)
    }

    /// Policy for undeclared entries on later loads.
    pub fn with_policy(mut self, policy: UnknownKeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.value.get(key)
    }

    pub fn value(&self) -> &Object {
        &self.value
    }

    pub fn into_inner(self) -> Object {
        self.value
    }

    /// Keys changed since the last successful save, sorted.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Assign `key`. Returns whether the key became dirty; assigning the value
    /// already held is a no-op.
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) -> bool {
        self.assign(key, value.into())
    }

    fn assign(&mut self, key: &str, value: ConfigValue) -> bool {
        if self.value.get(key) == Some(&value) {
            return false;
        }
        self.value.insert(key.to_string(), value);
        self.dirty.insert(key.to_string());
        true
    }

    /// Drop `key` from memory. The next save encodes it as absent, which
    /// clears a boolean and leaves any other file as it is.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let removed = self.value.shift_remove(key);
        if removed.is_some() {
            self.dirty.insert(key.to_string());
        }
        removed
    }

    /// Write the dirty keys. Dirty keys the schema does not declare are
    /// dropped from the dirty set without being written.
    pub fn save(&mut self) -> Result<(), CconfigError> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let (declared, undeclared): (Vec<String>, Vec<String>) = self
            .dirty
            .iter()
            .cloned()
            .partition(|key| self.schema.contains(key));
        if !undeclared.is_empty() {
            debug!(keys = ?undeclared, "skipping keys without a schema entry");
            for key in &undeclared {
                self.dirty.remove(key);
            }
        }
        let keys: Vec<&str> = declared.iter().map(String::as_str).collect();
        self.save_keys(&keys)
    }

    /// Write exactly `keys`, dirty or not.
    pub fn save_keys(&mut self, keys: &[&str]) -> Result<(), CconfigError> {
        walk::to_dir_keys(&self.path, &self.value, &self.schema, keys)?;
        for key in keys {
            self.dirty.remove(*key);
        }
        Ok(())
    }

    /// Write every schema key.
    pub fn save_all(&mut self) -> Result<(), CconfigError> {
        walk::to_dir(&self.path, &self.value, &self.schema)?;
        self.dirty.clear();
        Ok(())
    }

    /// Replace the in-memory object with the directory's content. Unsaved
    /// changes are discarded.
    pub fn load(&mut self) -> Result<(), CconfigError> {
        let mut value = walk::from_dir(&self.path, &self.schema)?;
        validate::apply_policy(&self.path, &self.schema, &mut value, self.policy)?;
        self.value = value;
        self.dirty.clear();
        Ok(())
    }

    /// Save pending changes, then reload.
    pub fn sync(&mut self) -> Result<(), CconfigError> {
        self.save()?;
        self.load()
    }

    /// Flush pending changes and open a scope that syncs when it ends.
    pub fn scope(&mut self) -> Result<BoundScope<'_>, CconfigError> {
        self.save()?;
        Ok(BoundScope {
            bound: self,
            closed: false,
        })
    }

    /// Run `f` inside a scope. An error from `f` is returned in preference to
    /// one from the closing sync.
    pub fn with_scope<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<CconfigError>,
        F: FnOnce(&mut BoundDict) -> Result<T, E>,
    {
        self.save()?;
        let result = f(self);
        let synced = self.sync();
        match result {
            Ok(value) => synced.map(|()| value).map_err(E::from),
            Err(e) => {
                if let Err(sync_err) = synced {
                    warn!(error = %sync_err, path = %self.path.display(), "sync after failed scope also failed");
                }
                Err(e)
            }
        }
    }
}

impl ConfigMap for BoundDict {
    fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.value.get(key)
    }

    fn set(&mut self, key: &str, value: ConfigValue) {
        self.assign(key, value);
    }

    fn contains(&self, key: &str) -> bool {
        self.value.contains_key(key)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &ConfigValue)> + '_> {
        Box::new(self.value.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Guard returned by [`BoundDict::scope`].
///
/// Ends with a sync: explicitly through [`close`](Self::close), which reports
/// the result, or on drop, which can only log it.
#[derive(Debug)]
pub struct BoundScope<'a> {
    bound: &'a mut BoundDict,
    closed: bool,
}

impl BoundScope<'_> {
    pub fn close(mut self) -> Result<(), CconfigError> {
        self.closed = true;
        self.bound.sync()
    }
}

impl Deref for BoundScope<'_> {
    type Target = BoundDict;

    fn deref(&self) -> &BoundDict {
        &*self.bound
    }
}

impl DerefMut for BoundScope<'_> {
    fn deref_mut(&mut self) -> &mut BoundDict {
        &mut *self.bound
    }
}

impl Drop for BoundScope<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.bound.sync() {
            warn!(error = %e, path = %self.bound.path.display(), "failed to sync config directory at end of scope");
        }
    }
}
