//! Namespaces whose value is the output of a command.
//!
//! Declared in the project extension file:
//!
//! ```toml
//! [namespaces.version]
//! command = ["git", "describe", "--always"]
//! refresh = false
//! ```
//!
//! The command runs in the directory of the file being rendered and its
//! trimmed stdout becomes the value, cached per subtree like `git`.

use std::path::Path;
use std::time::Duration;

use imprint_shell::ShellCommand;
use serde_json::Value;

use super::{DirectoryLookup, NamespaceError};

#[derive(Debug, Clone)]
pub struct CommandLookup {
    namespace: String,
    argv: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandLookup {
    pub fn new(namespace: impl Into<String>, argv: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            namespace: namespace.into(),
            argv,
            timeout,
        }
    }
}

impl DirectoryLookup for CommandLookup {
    fn lookup(&self, dir: &Path) -> Result<Value, NamespaceError> {
        let command = ShellCommand::from_argv(&self.argv)
            .ok_or_else(|| NamespaceError::Config {
                namespace: self.namespace.clone(),
                message: "command must not be empty".into(),
            })?
            .current_dir(dir)
            .with_timeout(self.timeout);

        match command.run() {
            Ok(output) => Ok(Value::String(output)),
            Err(err) if err.is_not_found() => Err(NamespaceError::unavailable(&self.namespace, err)),
            Err(err) => Err(NamespaceError::failed(&self.namespace, err)),
        }
    }
}
