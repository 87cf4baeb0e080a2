//! The recursive tree renderer.
//!
//! For every node under the source, depth first:
//!
//! 1. Stop if the depth limit is used up.
//! 2. Render the node's own name as a template, unless a name was forced. A
//!    name rendering to blank prunes the node and its whole subtree.
//! 3. Refuse to touch an existing destination unless overriding.
//! 4. Files: render the content, write it, copy the permission bits.
//! 5. Directories: create, copy the permission bits, recurse into each entry
//!    in listing order with the depth limit decremented.
//!
//! Dry runs render and validate everything but never touch the filesystem.
//! A fatal error stops the walk; whatever was already written stays.

use std::fs;
use std::io;
use std::path::Path;

use imprint_render::{Globals, TemplateEngine};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Encoding, Settings};
use crate::error::{ImprintError, Result};
use crate::namespaces::NamespaceBinder;

/// Name of the global holding the values tree.
pub const VALUES_GLOBAL: &str = "values";

/// Per-run flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub dry_run: bool,
    /// Write over existing destination files and into existing directories.
    pub override_existing: bool,
    /// Depth limit; `Some(1)` renders the source node only.
    pub levels: Option<usize>,
}

impl RunFlags {
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn levels(mut self, levels: Option<usize>) -> Self {
        self.levels = levels;
        self
    }
}

pub struct TreeRenderer<'a> {
    engine: &'a dyn TemplateEngine,
    binder: &'a mut NamespaceBinder,
    values: Value,
    input: Encoding,
    output: Encoding,
    flags: RunFlags,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(
        engine: &'a dyn TemplateEngine,
        binder: &'a mut NamespaceBinder,
        values: Value,
        settings: &Settings,
        flags: RunFlags,
    ) -> Self {
        Self {
            engine,
            binder,
            values,
            input: settings.input.encoding,
            output: settings.output.encoding,
            flags,
        }
    }

    /// Renders `source` into `destination`, returning the number of nodes
    /// processed.
    ///
    /// With `filename` set the source node is written under that name instead
    /// of its rendered own name.
    pub fn run(&mut self, source: &Path, destination: &Path, filename: Option<&str>) -> Result<usize> {
        info!(
            source = %source.display(),
            destination = %destination.display(),
            dry_run = self.flags.dry_run,
            "Rendering tree"
        );
        self.process(source, destination, filename, self.flags.levels)
    }

    fn process(
        &mut self,
        src: &Path,
        dst_dir: &Path,
        filename: Option<&str>,
        levels: Option<usize>,
    ) -> Result<usize> {
        if levels.is_some_and(|levels| levels < 1) {
            return Ok(0);
        }

        let globals = self.globals(src)?;

        let filename = match filename {
            Some(filename) => filename.to_string(),
            None => {
                let name = node_name(src);
                let rendered = self.engine.render(&name, &name, &globals)?;
                if rendered.trim().is_empty() {
                    warn!("\"{name}\" file renders to nothing, skipping ...");
                    return Ok(0);
                }
                rendered
            }
        };

        let dst = dst_dir.join(&filename);
        if dst.exists() && !self.flags.override_existing {
            return Err(ImprintError::DestinationExists { path: dst });
        }

        if src.is_file() {
            let raw = fs::read(src).map_err(ImprintError::io(src))?;
            let source = self.input.decode(raw, src)?;
            let content = self.engine.render(&node_name(src), &source, &globals)?;
            debug!(src = %src.display(), dst = %dst.display(), "Rendered file");

            if !self.flags.dry_run {
                fs::write(&dst, self.output.encode(&content)).map_err(ImprintError::io(&dst))?;
                copy_permissions(src, &dst)?;
            }
            return Ok(1);
        }

        if src.is_dir() {
            if !self.flags.dry_run {
                self.create_dir(&dst)?;
                copy_permissions(src, &dst)?;
            }

            let levels = levels.map(|levels| levels - 1);
            let mut processed = 1;
            for entry in fs::read_dir(src).map_err(ImprintError::io(src))? {
                let entry = entry.map_err(ImprintError::io(src))?;
                processed += self.process(&entry.path(), &dst, None, levels)?;
            }
            debug!(src = %src.display(), processed, "Rendered directory");
            return Ok(processed);
        }

        Err(ImprintError::UnsupportedPathType {
            path: src.to_path_buf(),
        })
    }

    fn globals(&mut self, src: &Path) -> Result<Globals> {
        let mut globals = self.binder.resolve(src)?;
        globals.insert(VALUES_GLOBAL.to_string(), self.values.clone());
        Ok(globals)
    }

    fn create_dir(&self, dst: &Path) -> Result<()> {
        match fs::create_dir(dst) {
            Ok(()) => Ok(()),
            Err(err)
                if err.kind() == io::ErrorKind::AlreadyExists
                    && self.flags.override_existing
                    && dst.is_dir() =>
            {
                Ok(())
            }
            Err(err) => Err(ImprintError::io(dst)(err)),
        }
    }
}

fn node_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn copy_permissions(src: &Path, dst: &Path) -> Result<()> {
    let permissions = fs::metadata(src).map_err(ImprintError::io(src))?.permissions();
    fs::set_permissions(dst, permissions).map_err(ImprintError::io(dst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imprint_render::{EngineOptions, FilterTable, MiniJinjaEngine};
    use serde_json::json;

    struct Fixture {
        engine: MiniJinjaEngine,
        binder: NamespaceBinder,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                engine: MiniJinjaEngine::new(EngineOptions::default(), FilterTable::new()).unwrap(),
                binder: NamespaceBinder::default(),
                settings: Settings::default(),
            }
        }

        fn run(&mut self, src: &Path, dst: &Path, filename: Option<&str>, flags: RunFlags) -> Result<usize> {
            TreeRenderer::new(
                &self.engine,
                &mut self.binder,
                json!({ "name": "World", "skip": false }),
                &self.settings,
                flags,
            )
            .run(src, dst, filename)
        }
    }

    #[test]
    fn test_forced_filename_for_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        fs::write(&src, "Hello {{ values.name }}").unwrap();
        let out = tempfile::tempdir().unwrap();

        let count = Fixture::new()
            .run(&src, out.path(), Some("greeting.txt"), RunFlags::default())
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            fs::read_to_string(out.path().join("greeting.txt")).unwrap(),
            "Hello World"
        );
    }

    #[test]
    fn test_rendered_filenames() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("{{ values.name }}.md"), "# {{ values.name }}\n").unwrap();
        fs::write(dir.path().join("{% if values.skip %}gone{% endif %}"), "x").unwrap();
        let out = tempfile::tempdir().unwrap();

        let count = Fixture::new()
            .run(dir.path(), out.path(), Some("site"), RunFlags::default())
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(out.path().join("site/World.md")).unwrap(),
            "# World\n"
        );
        assert_eq!(fs::read_dir(out.path().join("site")).unwrap().count(), 1);
    }

    #[test]
    fn test_zero_levels_prunes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let count = Fixture::new()
            .run(dir.path(), out.path(), Some("x"), RunFlags::default().levels(Some(0)))
            .unwrap();
        assert_eq!(count, 0);
        assert!(!out.path().join("x").exists());
    }

    #[test]
    fn test_template_errors_abort() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.txt");
        fs::write(&src, "{{ values.missing.deeper }}").unwrap();
        let out = tempfile::tempdir().unwrap();

        let err = Fixture::new()
            .run(&src, out.path(), None, RunFlags::default())
            .unwrap_err();
        assert!(matches!(err, ImprintError::Render(_)));
        assert!(!out.path().join("bad.txt").exists());
    }

    #[test]
    fn test_existing_directory_needs_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir(out.path().join("site")).unwrap();
        let mut fixture = Fixture::new();

        assert!(matches!(
            fixture.run(dir.path(), out.path(), Some("site"), RunFlags::default()),
            Err(ImprintError::DestinationExists { .. })
        ));
        let count = fixture
            .run(
                dir.path(),
                out.path(),
                Some("site"),
                RunFlags::default().override_existing(true),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_directory_over_file_fails_even_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(out.path().join("site"), "a file").unwrap();

        let err = Fixture::new()
            .run(
                dir.path(),
                out.path(),
                Some("site"),
                RunFlags::default().override_existing(true),
            )
            .unwrap_err();
        assert!(matches!(err, ImprintError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_copied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("run.sh");
        fs::write(&src, "#!/bin/sh\necho {{ values.name }}\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();
        let out = tempfile::tempdir().unwrap();

        Fixture::new()
            .run(&src, out.path(), None, RunFlags::default())
            .unwrap();
        let mode = fs::metadata(out.path().join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();
        let out = tempfile::tempdir().unwrap();

        let err = Fixture::new()
            .run(&link, out.path(), None, RunFlags::default())
            .unwrap_err();
        assert!(matches!(err, ImprintError::UnsupportedPathType { .. }));
    }

    #[test]
    fn test_utf8_sig_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bom.txt");
        fs::write(&src, "\u{feff}{{ values.name }}").unwrap();
        let out = tempfile::tempdir().unwrap();

        let mut fixture = Fixture::new();
        fixture.settings.input.encoding = Encoding::Utf8Sig;
        fixture.settings.output.encoding = Encoding::Utf8Sig;
        fixture.run(&src, out.path(), None, RunFlags::default()).unwrap();

        let written = fs::read(out.path().join("bom.txt")).unwrap();
        assert_eq!(written, "\u{feff}World".as_bytes());
    }
}
