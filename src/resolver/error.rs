//! Request validation errors.

use thiserror::Error;

/// A client-supplied value failed a schema or range check. The message
/// always names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn missing(field: &str) -> Self {
        Self(format!("missing '{}'", field))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
