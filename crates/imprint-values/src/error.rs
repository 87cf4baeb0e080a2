//! Error types for value loading and merging.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while building a value tree.
#[derive(Debug, thiserror::Error)]
pub enum ValuesError {
    /// The file suffix does not name a supported structured format.
    #[error("Unknown file format \"{format}\" for file {}. Supported formats are: {supported}.", path.display())]
    UnknownFormat {
        format: String,
        path: PathBuf,
        supported: String,
    },

    /// Two dot-notation keys disagree on whether a segment is a leaf or a container.
    #[error("Incompatible paths to \"{key}\": segment \"{segment}\" is both a value and a table")]
    ConflictingPath { key: String, segment: String },

    /// A dot-notation key has an empty segment (e.g. `a..b` or a trailing dot).
    #[error("Invalid dot-notation key \"{0}\"")]
    InvalidKey(String),

    /// A `KEY=VALUE` override was missing its `=`.
    #[error("Invalid value \"{0}\", expected KEY=VALUE")]
    InvalidAssignment(String),

    /// A structured document did not decode to a mapping at its top level.
    #[error("Content of {source_name} is not a mapping")]
    NotAMapping { source_name: String },

    /// A structured document failed to parse.
    #[error("Failed to parse {source_name} as {format}: {message}")]
    Parse {
        source_name: String,
        format: &'static str,
        message: String,
    },

    /// Failed to read a values file.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read piped stdin.
    #[error("Failed to read stdin: {0}")]
    StdinFailed(#[source] io::Error),
}

impl ValuesError {
    /// Create a parse error.
    pub fn parse(
        source_name: impl Into<String>,
        format: &'static str,
        message: impl ToString,
    ) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            format,
            message: message.to_string(),
        }
    }
}

/// Result type for value operations.
pub type Result<T> = std::result::Result<T, ValuesError>;
