//! Style library errors.

use thiserror::Error;

/// Errors that can occur while loading or validating a style library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document parsed but violates a library invariant.
    #[error("Invalid style library at '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

impl LibraryError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
