//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait, the only way the rest of
//! imprint renders text. The default implementation is [`MiniJinjaEngine`].
//!
//! # Per-call environments
//!
//! [`MiniJinjaEngine`] builds a fresh minijinja environment for every call.
//! The environment's loader knows the one template being rendered plus the
//! configured library directories, so nothing compiled for one file can leak
//! into the next, and globals (namespaces resolved for *this* path) are
//! always current.

use indexmap::IndexMap;
use minijinja::syntax::SyntaxConfig;
use minijinja::{context, Environment, Value};
use tracing::trace;

use crate::error::RenderError;
use crate::filters::{self, FilterTable};
use crate::loader::{ChainLoader, LibraryLoader};
use crate::options::EngineOptions;

/// Named template globals, in insertion order.
pub type Globals = IndexMap<String, serde_json::Value>;

/// Renders one named template source against a set of globals.
pub trait TemplateEngine: Send + Sync {
    /// Renders `source`, addressable as `name` by the loader and used to pick
    /// the escaping mode.
    ///
    /// Empty sources render to an empty string without touching the engine.
    fn render(&self, name: &str, source: &str, globals: &Globals) -> Result<String, RenderError>;
}

/// MiniJinja-based template engine.
///
/// # Example
///
/// ```rust
/// use imprint_render::{EngineOptions, FilterTable, Globals, MiniJinjaEngine, TemplateEngine};
/// use serde_json::json;
///
/// let engine = MiniJinjaEngine::new(EngineOptions::default(), FilterTable::new()).unwrap();
/// let mut globals = Globals::new();
/// globals.insert("values".into(), json!({ "name": "World" }));
///
/// let output = engine.render("a.txt", "Hello {{ values.name }}", &globals).unwrap();
/// assert_eq!(output, "Hello World");
/// ```
pub struct MiniJinjaEngine {
    options: EngineOptions,
    syntax: Option<SyntaxConfig>,
    libraries: LibraryLoader,
    filters: FilterTable,
}

impl MiniJinjaEngine {
    /// Creates an engine. Fails when the configured delimiters are unusable.
    pub fn new(options: EngineOptions, filters: FilterTable) -> Result<Self, RenderError> {
        let syntax = if options.syntax.is_default() {
            None
        } else {
            Some(options.syntax.syntax()?)
        };
        let libraries = LibraryLoader::new(options.libraries.clone(), options.follow_links);
        Ok(Self {
            options,
            syntax,
            libraries,
            filters,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn filters(&self) -> &FilterTable {
        &self.filters
    }

    fn environment(&self, name: &str, source: &str) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(self.options.undefined.behavior());
        env.set_keep_trailing_newline(self.options.keep_trailing_newline);
        env.set_trim_blocks(self.options.trim_blocks);
        env.set_lstrip_blocks(self.options.lstrip_blocks);
        if let Some(syntax) = &self.syntax {
            env.set_syntax(syntax.clone());
        }

        let autoescape = self.options.autoescape.clone();
        env.set_auto_escape_callback(move |name: &str| autoescape.mode(name));

        let loader = ChainLoader::new(name, source, self.libraries.clone());
        env.set_loader(move |name: &str| loader.load(name));

        filters::install(&mut env, &self.filters);
        env
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, name: &str, source: &str, globals: &Globals) -> Result<String, RenderError> {
        if source.is_empty() {
            return Ok(String::new());
        }

        let mut env = self.environment(name, source);
        for (key, value) in globals {
            env.add_global(key.clone(), Value::from_serialize(value));
        }

        trace!(name, "Rendering template");
        let template = env.get_template(name)?;
        Ok(template.render(context! {})?)
    }
}
