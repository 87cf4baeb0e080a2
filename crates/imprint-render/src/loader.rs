//! Template resolution for render calls.
//!
//! Every render call sees exactly one in-memory template (the file or filename
//! being rendered) plus any number of library directories that templates can
//! `include`, `import` or `extend` from.
//!
//! # Resolution
//!
//! 1. The in-memory entry, matched by its exact logical name.
//! 2. Library directories in priority order, first match wins.
//!
//! Library names may be written with a `library/` prefix
//! (`{% include "library/header.j2" %}`) or without it. Names that try to
//! leave a library directory (`..`, absolute paths) never resolve.

use std::fs;
use std::path::{Component, Path, PathBuf};

use minijinja::{Error, ErrorKind};
use tracing::debug;

/// Prefix under which library templates may be addressed.
pub const LIBRARY_PREFIX: &str = "library/";

/// Looks up templates in an ordered list of directories.
#[derive(Debug, Clone, Default)]
pub struct LibraryLoader {
    dirs: Vec<PathBuf>,
    follow_links: bool,
}

impl LibraryLoader {
    pub fn new(dirs: Vec<PathBuf>, follow_links: bool) -> Self {
        Self { dirs, follow_links }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Returns the path a logical name resolves to, if any directory has it.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = library_relative(name)?;
        self.dirs.iter().find_map(|dir| {
            let candidate = dir.join(&relative);
            let meta = fs::symlink_metadata(&candidate).ok()?;
            if meta.file_type().is_symlink() && !self.follow_links {
                debug!(path = %candidate.display(), "Skipping symlinked library template");
                return None;
            }
            candidate.is_file().then_some(candidate)
        })
    }

    pub fn load(&self, name: &str) -> Result<Option<String>, Error> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        debug!(name, path = %path.display(), "Loading library template");
        fs::read_to_string(&path).map(Some).map_err(|err| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("could not read library template {}", path.display()),
            )
            .with_source(err)
        })
    }
}

/// The loader installed on each render environment: one in-memory template
/// first, then the library directories.
#[derive(Debug, Clone)]
pub struct ChainLoader {
    name: String,
    source: String,
    libraries: LibraryLoader,
}

impl ChainLoader {
    pub fn new(name: impl Into<String>, source: impl Into<String>, libraries: LibraryLoader) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            libraries,
        }
    }

    pub fn load(&self, name: &str) -> Result<Option<String>, Error> {
        if name == self.name {
            return Ok(Some(self.source.clone()));
        }
        self.libraries.load(name)
    }
}

fn library_relative(name: &str) -> Option<PathBuf> {
    let name = name.strip_prefix(LIBRARY_PREFIX).unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    let path = Path::new(name);
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        .then(|| path.to_path_buf())
}
