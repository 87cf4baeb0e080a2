//! The `git` namespace: repository metadata for the file being rendered.
//!
//! | Property   | Source |
//! |------------|--------|
//! | `tag`      | tag pointing exactly at `HEAD` |
//! | `root`     | top-level directory of the work tree |
//! | `branch`   | current branch (`HEAD` when detached) |
//! | `revision` | full commit hash of `HEAD` |
//! | `name`     | author name of `HEAD` |
//! | `email`    | author email of `HEAD` |
//! | `subject`  | commit message subject |
//! | `body`     | commit message body |
//! | `date`     | author date, strict ISO 8601 |
//!
//! Properties that cannot be determined (no tag, not a repository) are
//! `none`. If `git` itself is not installed every property is `none`.
//!
//! Lookups run in the node's directory (a directory node is its own) and are
//! cached for the whole subtree, see [`LocalityCache`](super::LocalityCache).
//! Set `submodules: true` in `imprint.namespace.git` to look up again in
//! every directory.

use std::path::Path;
use std::time::Duration;

use imprint_shell::{ShellCommand, ShellError};
use imprint_values::ValueTree;
use serde_json::Value;
use tracing::{debug, warn};

use super::{DirectoryLookup, Namespace, NamespaceConfig, NamespaceError};

pub const PROGRAM: &str = "git";

pub const PROPERTIES: [(&str, &[&str]); 9] = [
    ("tag", &["describe", "--tags", "--exact-match", "HEAD"]),
    ("root", &["rev-parse", "--show-toplevel"]),
    ("branch", &["rev-parse", "--abbrev-ref", "HEAD"]),
    ("revision", &["rev-parse", "HEAD"]),
    ("name", &["log", "-1", "--format=%an"]),
    ("email", &["log", "-1", "--format=%ae"]),
    ("subject", &["log", "-1", "--format=%s"]),
    ("body", &["log", "-1", "--format=%b"]),
    ("date", &["log", "-1", "--format=%aI"]),
];

/// Factory for the `git` namespace.
pub fn namespace(config: &NamespaceConfig<'_>) -> Result<Namespace, NamespaceError> {
    let submodules = config.flag("submodules", false)?;
    Ok(Namespace::cached(
        GitLookup::new(config.command_timeout),
        submodules,
    ))
}

#[derive(Debug, Clone)]
pub struct GitLookup {
    timeout: Option<Duration>,
}

impl GitLookup {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, ShellError> {
        ShellCommand::new(PROGRAM)
            .args(args)
            .current_dir(dir)
            .with_timeout(self.timeout)
            .run()
    }
}

impl DirectoryLookup for GitLookup {
    fn lookup(&self, dir: &Path) -> Result<Value, NamespaceError> {
        let mut context = ValueTree::new();
        let mut installed = true;

        for (property, args) in PROPERTIES {
            let value = if !installed {
                Value::Null
            } else {
                match self.run(dir, args) {
                    Ok(output) => Value::String(output),
                    Err(err) if err.is_not_found() => {
                        debug!("git is not installed, git namespace is empty");
                        installed = false;
                        Value::Null
                    }
                    Err(err @ ShellError::CommandFailed { .. }) => {
                        warn!(property, dir = %dir.display(), %err, "Failed fetching git property");
                        Value::Null
                    }
                    Err(err) => return Err(NamespaceError::failed("git", err)),
                }
            };
            context.insert(property.to_string(), value);
        }

        debug!(dir = %dir.display(), ?context, "git namespace");
        Ok(Value::Object(context))
    }
}
