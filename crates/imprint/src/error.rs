//! Error types for imprint sessions.

use std::io;
use std::path::{Path, PathBuf};

use imprint_render::RenderError;
use imprint_values::ValuesError;

use crate::namespaces::NamespaceError;

/// Errors that abort a render session.
#[derive(Debug, thiserror::Error)]
pub enum ImprintError {
    /// The destination node already exists and overriding was not requested.
    #[error("{} exists. Use --force to override files and directories.", path.display())]
    DestinationExists { path: PathBuf },

    /// The source node is neither a regular file nor a directory.
    #[error("{} isn't a file nor directory. Don't know what to do.", path.display())]
    UnsupportedPathType { path: PathBuf },

    /// Command-line arguments failed validation.
    #[error("{0}")]
    InvalidArguments(String),

    /// The configuration tree could not be turned into settings.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The project-local extension file is malformed.
    #[error("Invalid extension file {}: {message}", path.display())]
    Extension { path: PathBuf, message: String },

    /// A source file is not valid in the configured input encoding.
    #[error("{} is not valid {encoding}", path.display())]
    Encoding { path: PathBuf, encoding: &'static str },

    #[error("{} failed: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Values(#[from] ValuesError),

    #[error("Failed to render: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

impl ImprintError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| ImprintError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for imprint operations.
pub type Result<T> = std::result::Result<T, ImprintError>;
