//! Error types for newsbrief.
//!
//! Library crates use [`NewsbriefError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all newsbrief operations.
#[derive(Debug, thiserror::Error)]
pub enum NewsbriefError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Spreadsheet could not be opened or does not have the expected shape.
    #[error("spreadsheet error at {path:?}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// Network/HTTP error while fetching an article.
    #[error("network error: {0}")]
    Network(String),

    /// Language model call failed or returned something unreadable.
    #[error("model error: {0}")]
    Model(String),

    /// Mail composition, authentication, or transmission error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (threshold not met, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewsbriefError>;

impl NewsbriefError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a spreadsheet error for the given file.
    pub fn spreadsheet(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Spreadsheet {
            path: path.into(),
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
        let err = NewsbriefError::config("missing [mail] section");
        assert_eq!(err.to_string(), "config error: missing [mail] section");

        let err = NewsbriefError::spreadsheet("NewsLinks.xlsx", "column 'URL' not found");
        let text = err.to_string();
        assert!(text.contains("NewsLinks.xlsx"));
        assert!(text.contains("column 'URL' not found"));

        let err = NewsbriefError::Mail("EMAIL_PASSWORD is not set".into());
        assert_eq!(err.to_string(), "mail error: EMAIL_PASSWORD is not set");
    }
}
