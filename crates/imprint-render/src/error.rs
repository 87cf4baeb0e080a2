//! Error types for template rendering.
//!
//! This module provides [`RenderError`], the error type for all rendering
//! operations. It abstracts over the underlying template engine's errors so the
//! rest of imprint never matches on minijinja error kinds directly.

use std::fmt;

/// Error type for template rendering operations.
#[derive(Debug)]
pub enum RenderError {
    /// Template syntax error, undefined name under a strict policy, or a
    /// failing filter.
    TemplateError(String),

    /// A template referenced by name (include, import, extends) was not found
    /// in memory or in any library directory.
    TemplateNotFound(String),

    /// Data serialization error.
    SerializationError(String),

    /// Invalid engine options (e.g. unusable delimiters).
    ConfigError(String),

    /// Other operational error.
    OperationError(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateError(msg) => write!(f, "template error: {}", msg),
            RenderError::TemplateNotFound(name) => write!(f, "template not found: {}", name),
            RenderError::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            RenderError::ConfigError(msg) => write!(f, "engine configuration error: {}", msg),
            RenderError::OperationError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

// The alternate format includes the template name, line and source excerpt.
impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        let message = format!("{:#}", err);
        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(message),
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UndefinedError
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownMethod
            | ErrorKind::InvalidOperation
            | ErrorKind::MissingArgument
            | ErrorKind::TooManyArguments => RenderError::TemplateError(message),
            ErrorKind::BadSerialization => RenderError::SerializationError(message),
            _ => RenderError::OperationError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::TemplateNotFound("foo".to_string());
        assert!(err.to_string().contains("template not found"));
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn test_from_minijinja_bad_serialization() {
        let mj_err = minijinja::Error::new(minijinja::ErrorKind::BadSerialization, "not a map");
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::SerializationError(_)));
    }

    #[test]
    fn test_from_minijinja_template_not_found() {
        let mj_err = minijinja::Error::new(
            minijinja::ErrorKind::TemplateNotFound,
            "template 'foo' not found",
        );
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_from_minijinja_undefined() {
        let mj_err = minijinja::Error::new(minijinja::ErrorKind::UndefinedError, "missing");
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::TemplateError(_)));
    }
}
