//! Template rendering for imprint.
//!
//! `imprint-render` is the boundary between imprint and its template engine.
//! Callers hand over a template name, its source, a set of globals and a
//! filter table; they get back a string or a [`RenderError`].
//!
//! # Quick Start
//!
//! ```rust
//! use imprint_render::{builtin_filters, EngineOptions, Globals, MiniJinjaEngine, TemplateEngine};
//! use serde_json::json;
//!
//! let engine = MiniJinjaEngine::new(EngineOptions::default(), builtin_filters()).unwrap();
//!
//! let mut globals = Globals::new();
//! globals.insert("values".into(), json!({ "project": "demo" }));
//!
//! let header = engine
//!     .render("main.py", "{{ ('Project ' ~ values.project) | comment }}", &globals)
//!     .unwrap();
//! assert_eq!(header, "# Project demo");
//! ```
//!
//! # Modules
//!
//! - [`engine`]: the [`TemplateEngine`] trait and [`MiniJinjaEngine`]
//! - [`options`]: undefined-name policy, delimiters, escaping, library settings
//! - [`loader`]: in-memory-first, library-second template resolution
//! - [`filters`]: filter tables and the built-in `comment` and `read` filters

pub mod engine;
mod error;
pub mod filters;
pub mod loader;
pub mod options;

pub use engine::{Globals, MiniJinjaEngine, TemplateEngine};
pub use error::RenderError;
pub use filters::{Filter, FilterTable};
pub use loader::{ChainLoader, LibraryLoader, LIBRARY_PREFIX};
pub use options::{AutoescapeOptions, Delimiters, EngineOptions, UndefinedPolicy};

/// The built-in filters as a ready-made table.
pub fn builtin_filters() -> FilterTable {
    filters::builtins()
        .into_iter()
        .map(|(name, make)| (name.to_string(), make()))
        .collect()
}
