//! # imprint
//!
//! Renders a file or a whole directory tree through templates into a parallel
//! output tree. File names are templates too: a name that renders to nothing
//! prunes the node.
//!
//! Templates see two kinds of globals:
//!
//! - `values`: one tree deep-merged from values files, `KEY=VALUE` overrides
//!   and piped standard input (see [`imprint_values`])
//! - one global per namespace plugin, such as `env` and `git`, either computed
//!   once per session or resolved per file (see [`namespaces`])
//!
//! Filters and namespaces are plugins. They are discovered from
//! [`PluginSource`](plugins::PluginSource)s and from a process-wide local table
//! that a project's `imprintconf.toml` feeds (see [`plugins`] and
//! [`extension`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use imprint::{default_config, RenderSession, RunFlags};
//! use serde_json::json;
//!
//! let src = tempfile::tempdir().unwrap();
//! std::fs::write(src.path().join("a.txt"), "Hello {{ values.name }}").unwrap();
//! let out = tempfile::tempdir().unwrap();
//!
//! let values = json!({ "name": "World" }).as_object().cloned().unwrap();
//! let mut session = RenderSession::new(
//!     default_config().unwrap(),
//!     values,
//!     src.path().join("a.txt"),
//!     out.path(),
//!     None,
//! )
//! .unwrap();
//!
//! assert_eq!(session.run(RunFlags::default()).unwrap(), 1);
//! assert_eq!(
//!     std::fs::read_to_string(out.path().join("a.txt")).unwrap(),
//!     "Hello World"
//! );
//! ```
//!
//! ## Configuration
//!
//! Defaults are embedded and `--config` files are merged over them; see
//! [`config`] for the keys under `imprint`.

pub mod cli;
pub mod config;
mod error;
pub mod extension;
pub mod namespaces;
pub mod plugins;
pub mod session;
pub mod tree;

pub use config::{default_config, load_config, Encoding, Settings, CONFIG_ROOT};
pub use error::{ImprintError, Result};
pub use extension::{ExtensionFile, ExtensionSession};
pub use namespaces::{Namespace, NamespaceBinder, NamespaceError, NamespaceFactory};
pub use plugins::{Capability, Filters, Namespaces, PluginLoader, PluginSource};
pub use session::RenderSession;
pub use tree::{RunFlags, TreeRenderer, VALUES_GLOBAL};
