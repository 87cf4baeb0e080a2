//! Namespaces: named, session-scoped data providers exposed as template globals.
//!
//! A namespace plugin is a [`NamespaceFactory`]. The [`NamespaceBinder`] calls
//! each factory once per session with that namespace's configuration subtree
//! (`imprint.namespace.<name>`), and the factory answers with a [`Namespace`]:
//!
//! - [`Namespace::Static`]: a value computed once, exposed as-is for every file
//! - [`Namespace::PerPath`]: a resolver asked for a value per file, usually a
//!   [`LocalityCache`] around a [`DirectoryLookup`]
//!
//! # Failures
//!
//! [`NamespaceError::Unavailable`] means the lookup subsystem is missing (for
//! instance, `git` is not installed). It is logged and the namespace or field
//! is left unset; rendering goes on. Every other error aborts the session.
//!
//! # Built-in namespaces
//!
//! - `env`: the process environment, see [`env`]
//! - `git`: repository metadata for the file being rendered, see [`git`]

pub mod binder;
pub mod command;
pub mod env;
pub mod git;
pub mod locality;

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use imprint_values::{booleanize, ValueTree};
use serde_json::Value;

pub use binder::NamespaceBinder;
pub use locality::LocalityCache;

#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    /// The subsystem a namespace relies on is not installed or reachable.
    #[error("namespace `{namespace}` is unavailable: {reason}")]
    Unavailable { namespace: String, reason: String },

    /// The namespace's own configuration subtree is invalid.
    #[error("invalid configuration for namespace `{namespace}`: {message}")]
    Config { namespace: String, message: String },

    /// Any other lookup failure.
    #[error("namespace `{namespace}` failed: {message}")]
    Failed { namespace: String, message: String },
}

impl NamespaceError {
    pub fn unavailable(namespace: &str, reason: impl fmt::Display) -> Self {
        NamespaceError::Unavailable {
            namespace: namespace.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn failed(namespace: &str, message: impl fmt::Display) -> Self {
        NamespaceError::Failed {
            namespace: namespace.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, NamespaceError::Unavailable { .. })
    }
}

/// What a factory gets to build its namespace from.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceConfig<'a> {
    pub name: &'a str,
    /// The namespace's configuration subtree; empty when not configured.
    pub options: &'a ValueTree,
    /// Timeout for external commands, from `imprint.shell.timeout_secs`.
    pub command_timeout: Option<Duration>,
}

impl NamespaceConfig<'_> {
    /// Reads a boolean option. Strings such as `"yes"` or `"false"` are accepted.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool, NamespaceError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(Value::String(raw)) => booleanize(raw).ok_or_else(|| self.invalid(key, raw)),
            Some(other) => Err(self.invalid(key, other)),
        }
    }

    fn invalid(&self, key: &str, value: impl fmt::Display) -> NamespaceError {
        NamespaceError::Config {
            namespace: self.name.to_string(),
            message: format!("`{key}` must be a boolean, got {value}"),
        }
    }
}

/// A namespace plugin.
pub type NamespaceFactory =
    Arc<dyn Fn(&NamespaceConfig<'_>) -> Result<Namespace, NamespaceError> + Send + Sync>;

/// Wraps a function as a [`NamespaceFactory`].
pub fn factory<F>(f: F) -> NamespaceFactory
where
    F: Fn(&NamespaceConfig<'_>) -> Result<Namespace, NamespaceError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An expensive lookup whose answer is the same for a whole directory subtree.
pub trait DirectoryLookup: Send {
    fn lookup(&self, dir: &Path) -> Result<Value, NamespaceError>;
}

/// Produces a namespace value for the file at `path`.
pub trait PathResolver: Send {
    fn resolve(&mut self, path: &Path) -> Result<Value, NamespaceError>;
}

/// A bound namespace instance.
pub enum Namespace {
    Static(Value),
    PerPath(Box<dyn PathResolver>),
}

impl Namespace {
    /// A path-dependent namespace backed by a [`LocalityCache`].
    pub fn cached<L>(lookup: L, refresh: bool) -> Self
    where
        L: DirectoryLookup + 'static,
    {
        Namespace::PerPath(Box::new(LocalityCache::new(lookup, refresh)))
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Namespace::Static(_))
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Namespace::PerPath(_) => f.write_str("PerPath(..)"),
        }
    }
}
