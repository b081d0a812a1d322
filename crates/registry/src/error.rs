//! Error types for registry queries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),

    /// Connection failure, timeout or an interrupted body.
    #[error("network error: {0}")]
    Network(String),

    #[error("registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode registry response: {0}")]
    Decode(String),
}

impl RegistryError {
    /// Whether a later attempt of the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidUrl(_) | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> RegistryError {
        RegistryError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(RegistryError::Network("timed out".into()).is_retryable());
    }

    #[test]
    fn client_errors_and_bad_payloads_are_final() {
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!RegistryError::Decode("expected value".into()).is_retryable());
        assert!(!RegistryError::InvalidUrl("ftp://x".into()).is_retryable());
    }
}
