//! Render sessions: everything one invocation needs, and the `run` entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use imprint_render::MiniJinjaEngine;
use imprint_values::{deep_merge, ValueTree};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::Result;
use crate::extension::ExtensionSession;
use crate::namespaces::NamespaceBinder;
use crate::plugins::{BuiltinSource, Filters, Namespaces, PluginLoader, PluginSource};
use crate::tree::{RunFlags, TreeRenderer};

/// One source, one destination, one configuration and values tree.
///
/// ```rust,no_run
/// use imprint::{default_config, RenderSession, RunFlags};
/// use imprint_values::ValueTree;
///
/// let mut session = RenderSession::new(
///     default_config()?,
///     ValueTree::new(),
///     "templates/project",
///     "out",
///     Some("project".to_string()),
/// )?;
/// let processed = session.run(RunFlags::default().dry_run(true))?;
/// # Ok::<(), imprint::ImprintError>(())
/// ```
pub struct RenderSession {
    config: ValueTree,
    settings: Settings,
    values: ValueTree,
    libraries: Vec<PathBuf>,
    source: PathBuf,
    destination: PathBuf,
    filename: Option<String>,
    filters: PluginLoader<Filters>,
    namespaces: PluginLoader<Namespaces>,
    extension: ExtensionSession,
}

impl RenderSession {
    pub fn new(
        config: ValueTree,
        values: ValueTree,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        filename: Option<String>,
    ) -> Result<Self> {
        let settings = Settings::from_config(&config)?;
        let sources = vec![BuiltinSource::shared()];
        Ok(Self {
            config,
            settings,
            values,
            libraries: Vec::new(),
            source: source.into(),
            destination: destination.into(),
            filename,
            filters: PluginLoader::new(sources.clone()),
            namespaces: PluginLoader::new(sources),
            extension: ExtensionSession::new(),
        })
    }

    /// Directories searched, in order, for `library/` templates.
    pub fn with_libraries(mut self, libraries: Vec<PathBuf>) -> Self {
        self.libraries = libraries;
        self
    }

    /// Replaces the host-wide plugin sources (the built-ins by default).
    pub fn with_sources(mut self, sources: Vec<Arc<dyn PluginSource>>) -> Self {
        self.filters = PluginLoader::new(sources.clone());
        self.namespaces = PluginLoader::new(sources);
        self
    }

    /// Deep-merges `overlay` into the values tree.
    pub fn update(&mut self, overlay: &ValueTree) {
        deep_merge(&mut self.values, overlay);
    }

    pub fn config(&self) -> &ValueTree {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn values(&self) -> &ValueTree {
        &self.values
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Renders the source into the destination and returns the number of
    /// nodes processed.
    pub fn run(&mut self, flags: RunFlags) -> Result<usize> {
        let reload = self.extension.enter(root_of(&self.source))?;
        let filters = self.filters.load(!reload);
        let factories = self.namespaces.load(!reload);

        info!(
            filters = ?filters.keys().collect::<Vec<_>>(),
            namespaces = ?factories.keys().collect::<Vec<_>>(),
            "Plugins ready"
        );
        debug!(values = ?self.values, "Values");

        let engine = MiniJinjaEngine::new(self.settings.engine_options(self.libraries.clone()), filters)?;
        let mut binder = NamespaceBinder::bind(&factories, &self.settings)?;

        TreeRenderer::new(
            &engine,
            &mut binder,
            Value::Object(self.values.clone()),
            &self.settings,
            flags,
        )
        .run(&self.source, &self.destination, self.filename.as_deref())
    }
}

/// The directory holding `source`, where its extension file lives.
fn root_of(source: &Path) -> &Path {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use serde_json::json;
    use serial_test::serial;
    use std::fs;

    fn tree(value: Value) -> ValueTree {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_root_of() {
        assert_eq!(root_of(Path::new("a.txt")), Path::new("."));
        assert_eq!(root_of(Path::new("/src/a.txt")), Path::new("/src"));
    }

    #[test]
    fn test_update_merges_deeply() {
        let mut session = RenderSession::new(
            ValueTree::new(),
            tree(json!({ "db": { "host": "localhost", "port": 5432 } })),
            "src",
            "dst",
            None,
        )
        .unwrap();
        session.update(&tree(json!({ "db": { "port": 6543 } })));
        assert_eq!(
            Value::Object(session.values().clone()),
            json!({ "db": { "host": "localhost", "port": 6543 } })
        );
    }

    #[test]
    fn test_invalid_settings_fail_early() {
        let config = tree(json!({ "imprint": { "undefined": "loud" } }));
        assert!(RenderSession::new(config, ValueTree::new(), "a", "b", None).is_err());
    }

    #[test]
    #[serial]
    fn test_run_uses_builtin_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("main.py");
        fs::write(&src, "{{ ('Project ' ~ values.project) | comment }}\n").unwrap();
        let out = tempfile::tempdir().unwrap();

        let mut session = RenderSession::new(
            default_config().unwrap(),
            tree(json!({ "project": "demo" })),
            &src,
            out.path(),
            None,
        )
        .unwrap();
        assert_eq!(session.run(RunFlags::default()).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(out.path().join("main.py")).unwrap(),
            "# Project demo\n"
        );
    }
}
