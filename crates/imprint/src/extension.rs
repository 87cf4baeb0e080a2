//! Project-local extension files.
//!
//! A project can declare its own filters and namespaces in an
//! `imprintconf.{toml,yaml,json}` file placed next to the rendering source:
//!
//! ```toml
//! [filters]
//! shout = "{{ value | upper }}{{ args | join }}"
//!
//! [namespaces.project]
//! value = { name = "demo", license = "MIT" }
//!
//! [namespaces.version]
//! command = ["git", "describe", "--always"]
//! refresh = false
//! ```
//!
//! Declarations are registered through the local plugin tables, so they win
//! over anything discovered host-wide. An [`ExtensionSession`] tracks which
//! root is loaded and clears the tables when the root changes or the session
//! ends.

use std::path::{Path, PathBuf};

use imprint_render::Filter;
use imprint_values::{load_file, Format};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ImprintError, Result};
use crate::namespaces::command::CommandLookup;
use crate::namespaces::{factory, Namespace, NamespaceFactory};
use crate::plugins::{Capability, Filters, Namespaces};

/// File stem of the extension file.
pub const EXTENSION_STEM: &str = "imprintconf";

/// A namespace declared in an extension file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NamespaceDecl {
    /// Path-dependent: the trimmed stdout of `command`, run in the directory
    /// of the file being rendered.
    Command {
        command: Vec<String>,
        #[serde(default)]
        refresh: bool,
    },
    Static { value: Value },
}

/// The parsed content of an extension file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionFile {
    pub filters: IndexMap<String, String>,
    pub namespaces: IndexMap<String, NamespaceDecl>,
}

impl ExtensionFile {
    /// The first existing `imprintconf.*` in `root`, trying toml, yaml, json.
    pub fn find(root: &Path) -> Option<PathBuf> {
        Format::ALL
            .iter()
            .map(|format| root.join(format!("{EXTENSION_STEM}.{}", format.suffix())))
            .find(|path| path.is_file())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |message: String| ImprintError::Extension {
            path: path.to_path_buf(),
            message,
        };
        let tree = load_file(path).map_err(|err| invalid(err.to_string()))?;
        let file: Self =
            serde_json::from_value(Value::Object(tree)).map_err(|err| invalid(err.to_string()))?;

        if let Some((name, _)) = file.namespaces.iter().find(|(_, decl)| {
            matches!(decl, NamespaceDecl::Command { command, .. } if command.is_empty())
        }) {
            return Err(invalid(format!("namespace `{name}` has an empty command")));
        }
        Ok(file)
    }

    /// Adds every declaration to the local plugin tables.
    pub fn register(&self) {
        for (name, source) in &self.filters {
            debug!(filter = %name, "Registering extension filter");
            Filters::register(name.clone(), Filter::from_template(source.clone()));
        }
        for (name, decl) in &self.namespaces {
            debug!(namespace = %name, "Registering extension namespace");
            Namespaces::register(name.clone(), decl.factory());
        }
    }
}

impl NamespaceDecl {
    pub fn factory(&self) -> NamespaceFactory {
        match self.clone() {
            NamespaceDecl::Static { value } => factory(move |_| Ok(Namespace::Static(value.clone()))),
            NamespaceDecl::Command { command, refresh } => factory(move |config| {
                let refresh = refresh || config.flag("refresh", false)?;
                Ok(Namespace::cached(
                    CommandLookup::new(config.name, command.clone(), config.command_timeout),
                    refresh,
                ))
            }),
        }
    }
}

/// Tracks the extension loaded for the current rendering root.
#[derive(Debug, Default)]
pub struct ExtensionSession {
    root: Option<PathBuf>,
    loaded: Option<PathBuf>,
}

impl ExtensionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches to `root`.
    ///
    /// Returns `false` when `root` is already the current root. Otherwise the
    /// previous extension is unloaded, the extension in `root` (if any) is
    /// registered, and `true` tells the caller to re-run plugin discovery.
    pub fn enter(&mut self, root: &Path) -> Result<bool> {
        if self.root.as_deref() == Some(root) {
            return Ok(false);
        }

        self.unload();

        let Some(path) = ExtensionFile::find(root) else {
            debug!(root = %root.display(), "No local extension file");
            self.root = Some(root.to_path_buf());
            return Ok(true);
        };
        // A root is only current once its extension loaded.
        let extension = ExtensionFile::load(&path)?;
        extension.register();
        self.root = Some(root.to_path_buf());
        info!(
            path = %path.display(),
            filters = extension.filters.len(),
            namespaces = extension.namespaces.len(),
            "Local extension loaded"
        );
        self.loaded = Some(path);
        Ok(true)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The extension file currently registered, if any.
    pub fn loaded(&self) -> Option<&Path> {
        self.loaded.as_deref()
    }

    fn unload(&mut self) {
        if self.root.take().is_none() {
            return;
        }
        if let Some(path) = self.loaded.take() {
            debug!(path = %path.display(), "Unloading local extension");
        }
        Filters::reset();
        Namespaces::reset();
    }
}

impl Drop for ExtensionSession {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_declarations_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imprintconf.yaml");
        fs::write(
            &path,
            "filters:\n  twice: '{{ value }}{{ value }}'\nnamespaces:\n  project:\n    value: {name: demo}\n  version:\n    command: [echo, '1.0']\n",
        )
        .unwrap();

        let file = ExtensionFile::load(&path).unwrap();
        assert_eq!(file.filters["twice"], "{{ value }}{{ value }}");
        assert_eq!(
            file.namespaces["project"],
            NamespaceDecl::Static {
                value: json!({ "name": "demo" })
            }
        );
        assert_eq!(
            file.namespaces["version"],
            NamespaceDecl::Command {
                command: vec!["echo".into(), "1.0".into()],
                refresh: false
            }
        );
    }

    #[test]
    fn test_invalid_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imprintconf.toml");

        fs::write(&path, "[namespaces.bad]\ncommand = []\n").unwrap();
        assert!(matches!(
            ExtensionFile::load(&path),
            Err(ImprintError::Extension { .. })
        ));

        fs::write(&path, "[macros]\nx = 1\n").unwrap();
        assert!(ExtensionFile::load(&path).is_err());

        fs::write(&path, "[namespaces.neither]\nrefreshed = true\n").unwrap();
        assert!(ExtensionFile::load(&path).is_err());
    }

    #[test]
    fn test_find_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ExtensionFile::find(dir.path()), None);
        fs::write(dir.path().join("imprintconf.json"), "{}").unwrap();
        fs::write(dir.path().join("imprintconf.toml"), "").unwrap();
        assert_eq!(
            ExtensionFile::find(dir.path()),
            Some(dir.path().join("imprintconf.toml"))
        );
    }

    #[test]
    #[serial]
    fn test_session_reloads_only_on_root_change() {
        Filters::reset();
        Namespaces::reset();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(
            first.path().join("imprintconf.toml"),
            "[filters]\nshout = \"{{ value | upper }}\"\n",
        )
        .unwrap();

        let mut session = ExtensionSession::new();
        assert!(session.enter(first.path()).unwrap());
        assert_eq!(Filters::registered(), vec!["shout".to_string()]);
        assert!(!session.enter(first.path()).unwrap());
        assert!(session.loaded().is_some());

        assert!(session.enter(second.path()).unwrap());
        assert!(Filters::registered().is_empty());
        assert!(session.loaded().is_none());
        assert_eq!(session.root(), Some(second.path()));
    }

    #[test]
    #[serial]
    fn test_broken_extension_fails_every_time() {
        Filters::reset();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("imprintconf.json"), r#"{"filters": 3}"#).unwrap();

        let mut session = ExtensionSession::new();
        assert!(session.enter(dir.path()).is_err());
        assert_eq!(session.root(), None);
        assert!(session.enter(dir.path()).is_err());
        assert_eq!(session.root(), None);

        fs::write(
            dir.path().join("imprintconf.json"),
            r#"{"filters": {"twice": "{{ value }}{{ value }}"}}"#,
        )
        .unwrap();
        assert!(session.enter(dir.path()).unwrap());
        assert_eq!(session.root(), Some(dir.path()));
        assert_eq!(Filters::registered(), vec!["twice".to_string()]);
    }

    #[test]
    #[serial]
    fn test_drop_unloads() {
        Namespaces::reset();
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("imprintconf.json"),
            r#"{"namespaces": {"project": {"value": "demo"}}}"#,
        )
        .unwrap();

        {
            let mut session = ExtensionSession::new();
            session.enter(dir.path()).unwrap();
            assert_eq!(Namespaces::registered(), vec!["project".to_string()]);
        }
        assert!(Namespaces::registered().is_empty());
    }
}
