//! Error types for biddoc.
//!
//! Library crates use [`BidDocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all biddoc operations.
#[derive(Debug, thiserror::Error)]
pub enum BidDocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a template or talking to the backend.
    #[error("network error: {0}")]
    Network(String),

    /// The template package could not be opened (not a zip, missing parts).
    #[error("template error: {message}")]
    Template { message: String },

    /// The templating engine rejected the template or the data
    /// (unresolved placeholder, malformed tag, unmatched loop).
    #[error("render error: {message}")]
    Render { message: String },

    /// Draft persistence error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Form data validation error (bad JSON, missing fields, bad formats).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BidDocError>;

impl BidDocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Create a render error from any displayable message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BidDocError::config("missing template path");
        assert_eq!(err.to_string(), "config error: missing template path");

        let err = BidDocError::render("unresolved tag `projectName`");
        assert!(err.to_string().starts_with("render error:"));
        assert!(err.to_string().contains("projectName"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = BidDocError::io(
            "/tmp/模板.docx",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("模板.docx"));
        assert!(msg.contains("gone"));
    }
}
