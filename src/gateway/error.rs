//! Generation gateway errors.

use thiserror::Error;

/// Failure of an outbound text or image generation call.
///
/// These are surfaced to the caller verbatim; nothing retries them.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider is missing credentials or an endpoint.
    #[error("{provider} is not configured: {reason}")]
    NotConfigured {
        provider: &'static str,
        reason: String,
    },

    /// Transport failure, including timeouts. The request URL is stripped.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The service answered 2xx but the payload was unusable.
    #[error("Invalid {provider} response: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl GenerationError {
    pub(crate) fn invalid(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            reason: reason.into(),
        }
    }
}
