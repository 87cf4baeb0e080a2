//! Configuration tree and typed settings.
//!
//! The configuration is an ordinary value tree: the embedded defaults from
//! `default_config.yaml`, with every `--config` file deep-merged over them in
//! order. Everything imprint itself reads lives under the `imprint` key and is
//! deserialized into [`Settings`]; the rest of the tree is left for namespaces
//! (`imprint.namespace.<name>`) and anything else users want to carry along.

use std::path::{Path, PathBuf};
use std::time::Duration;

use imprint_render::{AutoescapeOptions, Delimiters, EngineOptions, UndefinedPolicy};
use imprint_values::{deep_merge, load_files, subtree, Format, ValueTree};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ImprintError, Result};

/// Root key of imprint's own configuration.
pub const CONFIG_ROOT: &str = "imprint";

const DEFAULT_CONFIG: &str = include_str!("default_config.yaml");

const BOM: char = '\u{feff}';

/// Builds the configuration tree from the embedded defaults and `files`.
pub fn load_config<P: AsRef<Path>>(files: &[P]) -> Result<ValueTree> {
    let mut config = default_config()?;
    if !files.is_empty() {
        debug!(count = files.len(), "Loading configuration files");
        deep_merge(&mut config, &load_files(files)?);
    }
    Ok(config)
}

/// The embedded default configuration tree.
pub fn default_config() -> Result<ValueTree> {
    Ok(Format::Yaml.parse(DEFAULT_CONFIG, "<default configuration>")?)
}

/// Text encoding for reading sources and writing outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    /// UTF-8 with a byte order mark: stripped on read, written on output.
    #[serde(rename = "utf-8-sig", alias = "utf8-sig", alias = "UTF-8-SIG")]
    Utf8Sig,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Sig => "utf-8-sig",
        }
    }

    pub fn decode(self, bytes: Vec<u8>, path: &Path) -> Result<String> {
        let text = String::from_utf8(bytes).map_err(|_| ImprintError::Encoding {
            path: path.to_path_buf(),
            encoding: self.name(),
        })?;
        Ok(match self {
            Encoding::Utf8 => text,
            Encoding::Utf8Sig => match text.strip_prefix(BOM) {
                Some(stripped) => stripped.to_string(),
                None => text,
            },
        })
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf8Sig => {
                let mut bytes = Vec::with_capacity(text.len() + BOM.len_utf8());
                bytes.extend_from_slice(BOM.to_string().as_bytes());
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    pub encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub keep_trailing_newline: bool,
    pub trim_blocks: bool,
    pub lstrip_blocks: bool,
    pub syntax: Delimiters,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            keep_trailing_newline: true,
            trim_blocks: false,
            lstrip_blocks: false,
            syntax: Delimiters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self { follow_links: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// `None` or `0` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            timeout_secs: Some(10),
        }
    }
}

/// Typed view of the `imprint` configuration subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: EncodingSettings,
    pub output: EncodingSettings,
    pub undefined: UndefinedPolicy,
    pub environment: EnvironmentSettings,
    pub autoescape: AutoescapeOptions,
    pub library: LibrarySettings,
    pub shell: ShellSettings,
    /// Per-namespace configuration subtrees, keyed by namespace name.
    pub namespace: ValueTree,
}

impl Settings {
    /// Reads settings from the `imprint` key of `config`. A missing key gives
    /// the defaults.
    pub fn from_config(config: &ValueTree) -> Result<Self> {
        let Some(tree) = subtree(config, CONFIG_ROOT) else {
            return Ok(Self::default());
        };
        serde_json::from_value(serde_json::Value::Object(tree.clone()))
            .map_err(|err| ImprintError::Config(format!("{CONFIG_ROOT}: {err}")))
    }

    pub fn engine_options(&self, libraries: Vec<PathBuf>) -> EngineOptions {
        EngineOptions {
            undefined: self.undefined,
            keep_trailing_newline: self.environment.keep_trailing_newline,
            trim_blocks: self.environment.trim_blocks,
            lstrip_blocks: self.environment.lstrip_blocks,
            syntax: self.environment.syntax.clone(),
            autoescape: self.autoescape.clone(),
            follow_links: self.library.follow_links,
            libraries,
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.shell
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// The configuration subtree of one namespace, empty when absent.
    pub fn namespace_options(&self, name: &str) -> ValueTree {
        self.namespace
            .get(name)
            .and_then(|value| value.as_object())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_embedded_config() {
        let settings = Settings::from_config(&default_config().unwrap()).unwrap();
        assert_eq!(settings.undefined, UndefinedPolicy::Strict);
        assert_eq!(settings.input.encoding, Encoding::Utf8);
        assert!(settings.environment.keep_trailing_newline);
        assert!(settings.library.follow_links);
        assert_eq!(settings.command_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(settings.namespace_options("env").get("safe"), Some(&json!(true)));
        assert!(settings.namespace_options("vault").is_empty());
    }

    #[test]
    fn test_config_files_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(
            &path,
            "[imprint]\nundefined = \"chainable\"\n[imprint.output]\nencoding = \"utf-8-sig\"\n",
        )
        .unwrap();

        let config = load_config(&[&path]).unwrap();
        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.undefined, UndefinedPolicy::Chainable);
        assert_eq!(settings.output.encoding, Encoding::Utf8Sig);
        assert_eq!(settings.input.encoding, Encoding::Utf8);
        assert!(settings.autoescape.escapes("index.html"));
    }

    #[test]
    fn test_unknown_encoding_is_config_error() {
        let mut config = ValueTree::new();
        config.insert(
            CONFIG_ROOT.into(),
            json!({ "input": { "encoding": "latin-1" } }),
        );
        assert!(matches!(
            Settings::from_config(&config),
            Err(ImprintError::Config(_))
        ));
    }

    #[test]
    fn test_missing_root_gives_defaults() {
        assert_eq!(
            Settings::from_config(&ValueTree::new()).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_utf8_sig_round_trip() {
        let path = Path::new("bom.txt");
        let encoded = Encoding::Utf8Sig.encode("héllo");
        assert_eq!(&encoded[..3], &[0xef, 0xbb, 0xbf]);
        assert_eq!(Encoding::Utf8Sig.decode(encoded.clone(), path).unwrap(), "héllo");
        assert_eq!(Encoding::Utf8.decode(encoded, path).unwrap(), "\u{feff}héllo");
        assert!(Encoding::Utf8.decode(vec![0xff, 0xfe], path).is_err());
    }

    #[test]
    fn test_zero_timeout_waits_forever() {
        let settings = Settings {
            shell: ShellSettings {
                timeout_secs: Some(0),
            },
            ..Settings::default()
        };
        assert_eq!(settings.command_timeout(), None);
    }
}
