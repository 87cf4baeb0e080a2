//! Plugin discovery for filters and namespaces.
//!
//! Plugins reach a render session through two channels per capability class:
//!
//! 1. Host-wide discovery. Every [`PluginSource`] is asked for the candidates
//!    it has under the class's versioned [`CapabilityTag`]
//!    (`imprint_plugins_filters_1_0`, `imprint_plugins_namespaces_1_0`).
//!    Candidates load lazily; a candidate or source that fails is logged and
//!    skipped, never fatal.
//! 2. Local registration. [`Capability::register`] puts a plugin straight
//!    into a process-wide table. Local entries win over discovered ones with
//!    the same name. [`Capability::reset`] clears the table.
//!
//! [`PluginLoader::load`] merges both channels into a name → plugin table.
//!
//! ```rust
//! use imprint::plugins::{BuiltinSource, Capability, Filters, PluginLoader};
//! use imprint_render::Filter;
//!
//! Filters::register("shout", Filter::new(|value: String| value.to_uppercase()));
//!
//! let mut loader = PluginLoader::<Filters>::new(vec![BuiltinSource::shared()]);
//! let filters = loader.load(true);
//! assert!(filters.contains_key("comment"));
//! assert!(filters.contains_key("shout"));
//! # Filters::reset();
//! ```

mod builtin;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use imprint_render::Filter;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, error};

pub use builtin::{BuiltinSource, EmbeddedSource};

use crate::namespaces::NamespaceFactory;

/// Prefix of every capability tag.
pub const PLUGIN_NAMESPACE: &str = "imprint";

/// Version of the plugin interface.
pub const API_VERSION: &str = "1.0";

/// Identifies one capability class at one interface version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityTag(String);

impl CapabilityTag {
    pub fn new(namespace: &str, class: &str, version: &str) -> Self {
        Self(format!(
            "{namespace}_plugins_{class}_{}",
            version.replace('.', "_")
        ))
    }

    /// The tag of `C` at the current interface version.
    pub fn of<C: Capability>() -> Self {
        Self::new(PLUGIN_NAMESPACE, C::CLASS, API_VERSION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Unable to load plugin \"{name}\": {message}")]
    Load { name: String, message: String },

    #[error("Plugin source \"{source_name}\" cannot enumerate {tag}: {message}")]
    Enumerate {
        source_name: String,
        tag: CapabilityTag,
        message: String,
    },
}

type LoadFn<P> = Box<dyn FnOnce() -> Result<P, PluginError> + Send>;

/// A named plugin that has not been loaded yet.
pub struct Candidate<P> {
    name: String,
    load: LoadFn<P>,
}

impl<P> Candidate<P> {
    pub fn new<F>(name: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> Result<P, PluginError> + Send + 'static,
    {
        Self {
            name: name.into(),
            load: Box::new(load),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load(self) -> Result<P, PluginError> {
        (self.load)()
    }
}

impl<P> fmt::Debug for Candidate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Somewhere plugins can be discovered.
///
/// Each method enumerates the candidates registered under `tag`; a source
/// with nothing for a class returns an empty list.
pub trait PluginSource: Send + Sync {
    fn name(&self) -> &str;

    fn filters(&self, tag: &CapabilityTag) -> Result<Vec<Candidate<Filter>>, PluginError>;

    fn namespaces(
        &self,
        tag: &CapabilityTag,
    ) -> Result<Vec<Candidate<NamespaceFactory>>, PluginError>;
}

/// A capability class: what its plugins are, how sources enumerate them and
/// where local registrations live.
pub trait Capability: 'static {
    type Plugin: Clone + Send + 'static;

    const CLASS: &'static str;

    fn enumerate(
        source: &dyn PluginSource,
        tag: &CapabilityTag,
    ) -> Result<Vec<Candidate<Self::Plugin>>, PluginError>;

    fn local() -> &'static Mutex<IndexMap<String, Self::Plugin>>;

    /// Registers a plugin locally, replacing any earlier one with that name.
    fn register(name: impl Into<String>, plugin: Self::Plugin) {
        Self::local().lock().insert(name.into(), plugin);
    }

    fn unregister(name: &str) -> Option<Self::Plugin> {
        Self::local().lock().shift_remove(name)
    }

    /// Clears every local registration of this class.
    fn reset() {
        Self::local().lock().clear();
    }

    fn registered() -> Vec<String> {
        Self::local().lock().keys().cloned().collect()
    }
}

static LOCAL_FILTERS: Lazy<Mutex<IndexMap<String, Filter>>> = Lazy::new(Default::default);
static LOCAL_NAMESPACES: Lazy<Mutex<IndexMap<String, NamespaceFactory>>> =
    Lazy::new(Default::default);

/// Filters exposed to templates.
pub enum Filters {}

impl Capability for Filters {
    type Plugin = Filter;

    const CLASS: &'static str = "filters";

    fn enumerate(
        source: &dyn PluginSource,
        tag: &CapabilityTag,
    ) -> Result<Vec<Candidate<Filter>>, PluginError> {
        source.filters(tag)
    }

    fn local() -> &'static Mutex<IndexMap<String, Filter>> {
        &LOCAL_FILTERS
    }
}

/// Namespace factories.
pub enum Namespaces {}

impl Capability for Namespaces {
    type Plugin = NamespaceFactory;

    const CLASS: &'static str = "namespaces";

    fn enumerate(
        source: &dyn PluginSource,
        tag: &CapabilityTag,
    ) -> Result<Vec<Candidate<NamespaceFactory>>, PluginError> {
        source.namespaces(tag)
    }

    fn local() -> &'static Mutex<IndexMap<String, NamespaceFactory>> {
        &LOCAL_NAMESPACES
    }
}

/// Discovers the plugins of one capability class.
pub struct PluginLoader<C: Capability> {
    tag: CapabilityTag,
    sources: Vec<Arc<dyn PluginSource>>,
    cache: Option<IndexMap<String, C::Plugin>>,
    _class: PhantomData<C>,
}

impl<C: Capability> PluginLoader<C> {
    pub fn new(sources: Vec<Arc<dyn PluginSource>>) -> Self {
        Self {
            tag: CapabilityTag::of::<C>(),
            sources,
            cache: None,
            _class: PhantomData,
        }
    }

    pub fn tag(&self) -> &CapabilityTag {
        &self.tag
    }

    /// Returns the name → plugin table.
    ///
    /// With `cache` set a previous result is returned as-is; otherwise every
    /// source is enumerated again and the local table re-read.
    pub fn load(&mut self, cache: bool) -> IndexMap<String, C::Plugin> {
        if cache {
            if let Some(cached) = &self.cache {
                return cached.clone();
            }
        }

        debug!(tag = %self.tag, "Loading plugins");
        let mut available = IndexMap::new();

        for source in &self.sources {
            let candidates = match C::enumerate(source.as_ref(), &self.tag) {
                Ok(candidates) => candidates,
                Err(err) => {
                    error!(source = source.name(), %err, "Skipping plugin source");
                    continue;
                }
            };
            for candidate in candidates {
                let name = candidate.name().to_string();
                match candidate.load() {
                    Ok(plugin) => {
                        debug!(class = C::CLASS, name = %name, source = source.name(), "Loaded plugin");
                        available.insert(name, plugin);
                    }
                    Err(err) => error!(class = C::CLASS, %err, "Skipping plugin"),
                }
            }
        }

        for (name, plugin) in C::local().lock().iter() {
            debug!(class = C::CLASS, name = %name, "Using locally registered plugin");
            available.insert(name.clone(), plugin.clone());
        }

        self.cache = Some(available.clone());
        available
    }
}
