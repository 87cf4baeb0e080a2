//! Engine options.
//!
//! [`EngineOptions`] is everything a render call needs besides the template,
//! its filters and its globals. It deserializes straight from the
//! `imprint.environment`-style configuration subtrees, with every field
//! defaulted so partial configurations work.

use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, UndefinedBehavior};
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// How the engine treats a reference to a name that is not defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndefinedPolicy {
    /// Undefined renders as empty; attribute access on it fails.
    Lenient,
    /// Undefined renders as empty and attribute access chains silently.
    Chainable,
    /// Like strict, but undefined values may be tested in conditions.
    SemiStrict,
    /// Any use of an undefined value fails the render.
    #[default]
    Strict,
}

impl UndefinedPolicy {
    pub(crate) fn behavior(self) -> UndefinedBehavior {
        match self {
            UndefinedPolicy::Lenient => UndefinedBehavior::Lenient,
            UndefinedPolicy::Chainable => UndefinedBehavior::Chainable,
            UndefinedPolicy::SemiStrict => UndefinedBehavior::SemiStrict,
            UndefinedPolicy::Strict => UndefinedBehavior::Strict,
        }
    }
}

/// Template delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    pub block_start: String,
    pub block_end: String,
    pub variable_start: String,
    pub variable_end: String,
    pub comment_start: String,
    pub comment_end: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            block_start: "{%".into(),
            block_end: "%}".into(),
            variable_start: "{{".into(),
            variable_end: "}}".into(),
            comment_start: "{#".into(),
            comment_end: "#}".into(),
        }
    }
}

impl Delimiters {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn syntax(&self) -> Result<SyntaxConfig, RenderError> {
        SyntaxConfig::builder()
            .block_delimiters(self.block_start.clone(), self.block_end.clone())
            .variable_delimiters(self.variable_start.clone(), self.variable_end.clone())
            .comment_delimiters(self.comment_start.clone(), self.comment_end.clone())
            .build()
            .map_err(|err| RenderError::ConfigError(err.to_string()))
    }
}

/// Which templates get HTML escaping, keyed by the template name's extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoescapeOptions {
    pub enabled_extensions: Vec<String>,
    /// Applies to names whose extension is not listed, and to names with none.
    pub default: bool,
}

impl Default for AutoescapeOptions {
    fn default() -> Self {
        Self {
            enabled_extensions: vec!["html".into(), "htm".into(), "xml".into()],
            default: false,
        }
    }
}

impl AutoescapeOptions {
    pub fn escapes(&self, name: &str) -> bool {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension {
            Some(ext) => {
                self.enabled_extensions
                    .iter()
                    .any(|enabled| enabled.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                    || self.default
            }
            None => self.default,
        }
    }

    pub(crate) fn mode(&self, name: &str) -> AutoEscape {
        if self.escapes(name) {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    }
}

/// Options applied to the environment built for every render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub undefined: UndefinedPolicy,
    pub keep_trailing_newline: bool,
    pub trim_blocks: bool,
    pub lstrip_blocks: bool,
    pub syntax: Delimiters,
    pub autoescape: AutoescapeOptions,
    /// Read library templates reached through symbolic links.
    pub follow_links: bool,
    /// Library search directories, highest priority first.
    pub libraries: Vec<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            undefined: UndefinedPolicy::default(),
            keep_trailing_newline: true,
            trim_blocks: false,
            lstrip_blocks: false,
            syntax: Delimiters::default(),
            autoescape: AutoescapeOptions::default(),
            follow_links: true,
            libraries: Vec::new(),
        }
    }
}

impl EngineOptions {
    pub fn with_undefined(mut self, undefined: UndefinedPolicy) -> Self {
        self.undefined = undefined;
        self
    }

    pub fn with_libraries<I, P>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.libraries = libraries.into_iter().map(Into::into).collect();
        self
    }
}
