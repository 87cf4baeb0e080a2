//! Plugins compiled into the process.

use std::sync::Arc;

use imprint_render::{filters, Filter};
use indexmap::IndexMap;

use super::{Candidate, CapabilityTag, PluginError, PluginSource};
use crate::namespaces::{self, NamespaceFactory};

/// A [`PluginSource`] over plugins registered in code.
///
/// Its tables are keyed by capability tag, so a source only answers for the
/// interface versions it was built against.
#[derive(Clone)]
pub struct EmbeddedSource {
    name: String,
    filters: IndexMap<String, Filter>,
    namespaces: IndexMap<String, NamespaceFactory>,
}

impl EmbeddedSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: IndexMap::new(),
            namespaces: IndexMap::new(),
        }
    }

    /// The `comment` and `read` filters plus the `env` and `git` namespaces.
    pub fn builtin() -> Self {
        let mut source = Self::new("builtin");
        for (name, make) in filters::builtins() {
            source = source.with_filter(name, make());
        }
        source
            .with_namespace("env", namespaces::factory(namespaces::env::namespace))
            .with_namespace("git", namespaces::factory(namespaces::git::namespace))
    }

    pub fn with_filter(mut self, name: impl Into<String>, filter: Filter) -> Self {
        self.filters.insert(name.into(), filter);
        self
    }

    pub fn with_namespace(mut self, name: impl Into<String>, factory: NamespaceFactory) -> Self {
        self.namespaces.insert(name.into(), factory);
        self
    }

    pub fn shared(self) -> Arc<dyn PluginSource> {
        Arc::new(self)
    }
}

fn candidates<P>(table: &IndexMap<String, P>) -> Vec<Candidate<P>>
where
    P: Clone + Send + 'static,
{
    table
        .iter()
        .map(|(name, plugin)| {
            let plugin = plugin.clone();
            Candidate::new(name.clone(), move || Ok(plugin))
        })
        .collect()
}

impl PluginSource for EmbeddedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn filters(&self, tag: &CapabilityTag) -> Result<Vec<Candidate<Filter>>, PluginError> {
        if *tag != CapabilityTag::of::<super::Filters>() {
            return Ok(Vec::new());
        }
        Ok(candidates(&self.filters))
    }

    fn namespaces(
        &self,
        tag: &CapabilityTag,
    ) -> Result<Vec<Candidate<NamespaceFactory>>, PluginError> {
        if *tag != CapabilityTag::of::<super::Namespaces>() {
            return Ok(Vec::new());
        }
        Ok(candidates(&self.namespaces))
    }
}

/// The process-embedded built-ins.
pub struct BuiltinSource;

impl BuiltinSource {
    pub fn shared() -> Arc<dyn PluginSource> {
        EmbeddedSource::builtin().shared()
    }
}
