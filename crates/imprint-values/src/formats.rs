//! Structured input formats.
//!
//! Values and configuration files are decoded into a [`ValueTree`] according
//! to their suffix:
//!
//! | Suffix | Format |
//! |--------|--------|
//! | `.json` | JSON |
//! | `.yaml`, `.yml` | YAML |
//! | `.toml` | TOML |
//!
//! Any other suffix fails with [`ValuesError::UnknownFormat`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, ValuesError};
use crate::merge::{deep_merge, ValueTree};

/// Supported structured formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// All formats, in the order they are tried when looking for a file by stem.
    pub const ALL: [Format; 3] = [Format::Toml, Format::Yaml, Format::Json];

    /// The canonical file suffix, without the dot.
    pub fn suffix(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        }
    }

    /// Human-readable list of accepted suffixes.
    pub fn supported() -> String {
        "json, toml, yaml".to_string()
    }

    /// Picks the format from a path's suffix.
    pub fn from_path(path: &Path) -> Result<Self> {
        let suffix = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        suffix.parse().map_err(|_| ValuesError::UnknownFormat {
            format: suffix.to_string(),
            path: path.to_path_buf(),
            supported: Self::supported(),
        })
    }

    /// Decodes `content` into a mapping.
    ///
    /// An empty document decodes to an empty mapping. `source_name` is only used
    /// in error messages.
    pub fn parse(self, content: &str, source_name: &str) -> Result<ValueTree> {
        let value: Value = match self {
            Format::Json => serde_json::from_str(content)
                .map_err(|e| ValuesError::parse(source_name, "JSON", e))?,
            Format::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ValuesError::parse(source_name, "YAML", e))?,
            Format::Toml => toml::from_str(content)
                .map_err(|e| ValuesError::parse(source_name, "TOML", e))?,
        };
        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(ValueTree::new()),
            _ => Err(ValuesError::NotAMapping {
                source_name: source_name.to_string(),
            }),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Loads one structured file, choosing the decoder by suffix.
pub fn load_file(path: &Path) -> Result<ValueTree> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ValuesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    format.parse(&content, &path.display().to_string())
}

/// Loads every file in order and merges them left to right.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<ValueTree> {
    let mut bundle = ValueTree::new();
    for path in paths {
        let path = path.as_ref();
        info!("Loading file {} ...", path.display());
        let content = load_file(path)?;
        debug!(keys = content.len(), "Content loaded from {}", path.display());
        deep_merge(&mut bundle, &content);
    }
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_from_suffix() {
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.yml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.YAML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.toml")).unwrap(), Format::Toml);
    }

    #[test]
    fn unknown_suffix_is_rejected() {
        let err = Format::from_path(Path::new("values.ini")).unwrap_err();
        match err {
            ValuesError::UnknownFormat { format, .. } => assert_eq!(format, "ini"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(Format::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn parses_each_format_to_the_same_tree() {
        let expected = json!({"name": "World", "nested": {"n": 1}});
        let json = Format::Json
            .parse(r#"{"name": "World", "nested": {"n": 1}}"#, "json")
            .unwrap();
        let yaml = Format::Yaml
            .parse("name: World\nnested:\n  n: 1\n", "yaml")
            .unwrap();
        let toml = Format::Toml
            .parse("name = \"World\"\n[nested]\nn = 1\n", "toml")
            .unwrap();
        for tree in [json, yaml, toml] {
            assert_eq!(Value::Object(tree), expected);
        }
    }

    #[test]
    fn empty_yaml_is_an_empty_tree() {
        assert!(Format::Yaml.parse("", "empty").unwrap().is_empty());
    }

    #[test]
    fn top_level_sequence_is_rejected() {
        assert!(matches!(
            Format::Json.parse("[1, 2]", "list"),
            Err(ValuesError::NotAMapping { .. })
        ));
    }

    #[test]
    fn malformed_input_reports_format() {
        let err = Format::Json.parse("{", "broken.json").unwrap_err();
        assert!(err.to_string().contains("JSON"));
        assert!(err.to_string().contains("broken.json"));
    }
}
