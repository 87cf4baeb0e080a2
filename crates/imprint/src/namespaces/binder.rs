//! Binding namespace plugins to a render session.

use std::path::Path;

use imprint_render::Globals;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Namespace, NamespaceConfig, NamespaceError, NamespaceFactory};
use crate::config::Settings;
use crate::tree::VALUES_GLOBAL;

/// The namespaces of one session, each bound to its configuration subtree.
#[derive(Debug, Default)]
pub struct NamespaceBinder {
    bound: IndexMap<String, Namespace>,
}

impl NamespaceBinder {
    /// Calls every factory once with `imprint.namespace.<name>`.
    ///
    /// A factory reporting [`NamespaceError::Unavailable`] leaves its
    /// namespace as `none`; any other error is returned.
    pub fn bind(
        factories: &IndexMap<String, NamespaceFactory>,
        settings: &Settings,
    ) -> Result<Self, NamespaceError> {
        let command_timeout = settings.command_timeout();
        let mut bound = IndexMap::with_capacity(factories.len());

        for (name, factory) in factories {
            if name == VALUES_GLOBAL {
                warn!(namespace = %name, "Namespace is shadowed by the values tree");
            }
            let options = settings.namespace_options(name);
            let config = NamespaceConfig {
                name,
                options: &options,
                command_timeout,
            };
            let namespace = match factory(&config) {
                Ok(namespace) => namespace,
                Err(err) if err.is_unavailable() => {
                    warn!(%err, "Leaving namespace unset");
                    Namespace::Static(Value::Null)
                }
                Err(err) => return Err(err),
            };
            debug!(namespace = %name, path_dependent = !namespace.is_static(), "Bound namespace");
            bound.insert(name.clone(), namespace);
        }

        Ok(Self { bound })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bound.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Namespace values for the file at `path`, one global per namespace.
    pub fn resolve(&mut self, path: &Path) -> Result<Globals, NamespaceError> {
        let mut globals = Globals::with_capacity(self.bound.len() + 1);
        for (name, namespace) in self.bound.iter_mut() {
            let value = match namespace {
                Namespace::Static(value) => value.clone(),
                Namespace::PerPath(resolver) => match resolver.resolve(path) {
                    Ok(value) => value,
                    Err(err) if err.is_unavailable() => {
                        warn!(%err, path = %path.display(), "Leaving namespace unset");
                        Value::Null
                    }
                    Err(err) => return Err(err),
                },
            };
            globals.insert(name.clone(), value);
        }
        Ok(globals)
    }
}
