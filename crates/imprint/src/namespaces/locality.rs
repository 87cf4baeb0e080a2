//! Directory-locality cache for path-dependent namespaces.
//!
//! Rendering a tree asks a path-dependent namespace for a value once per file.
//! When the answer is a property of a whole directory subtree (the repository
//! root, the current branch), recomputing it per file is wasted work.
//! [`LocalityCache`] remembers the directory it last computed a value for and
//! reuses that value for every file underneath it.
//!
//! With `refresh` set the value is reused only within the exact same directory,
//! which keeps nested scopes (git submodules) correct at the cost of one lookup
//! per directory.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::trace;

use super::{DirectoryLookup, NamespaceError, PathResolver};

pub struct LocalityCache<L> {
    lookup: L,
    refresh: bool,
    cached_root: Option<PathBuf>,
    cached_value: Value,
}

impl<L: DirectoryLookup> LocalityCache<L> {
    pub fn new(lookup: L, refresh: bool) -> Self {
        Self {
            lookup,
            refresh,
            cached_root: None,
            cached_value: Value::Null,
        }
    }

    pub fn cached_root(&self) -> Option<&Path> {
        self.cached_root.as_deref()
    }

    /// Returns the value for the node at `path`, looking it up in the node's
    /// directory unless the cached value covers that directory. A directory
    /// node is its own directory; a file's is its parent.
    pub fn resolve(&mut self, path: &Path) -> Result<Value, NamespaceError> {
        let dir = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };

        if let Some(root) = &self.cached_root {
            let covered = if self.refresh {
                dir == root
            } else {
                dir.starts_with(root)
            };
            if covered {
                trace!(dir = %dir.display(), root = %root.display(), "Namespace cache hit");
                return Ok(self.cached_value.clone());
            }
        }

        let value = self.lookup.lookup(dir)?;
        self.cached_root = Some(dir.to_path_buf());
        self.cached_value = value.clone();
        Ok(value)
    }
}

impl<L: DirectoryLookup> PathResolver for LocalityCache<L> {
    fn resolve(&mut self, path: &Path) -> Result<Value, NamespaceError> {
        LocalityCache::resolve(self, path)
    }
}
