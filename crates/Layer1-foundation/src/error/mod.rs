//! Error types for aide
//!
//! Shared error type for the foundation layer and the conversion target for
//! the higher layers' own error enums.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// aide error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Storage
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // External services
    // ========================================================================
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("API error: {service} - {message}")]
    Api { service: String, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a caller may reasonably retry the failed operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::RateLimited(_) | Error::Http(_)
        )
    }

    /// Whether the message is meant to be shown to the user as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::UnknownService(_) | Error::RateLimited(_))
    }

    /// API error helper
    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            service: service.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::RateLimited("svc".into()).is_retryable());
        assert!(Error::Timeout("30s".into()).is_retryable());
        assert!(!Error::UnknownService("svc".into()).is_retryable());
        assert!(!Error::Config("bad".into()).is_retryable());
    }

    #[test]
    fn test_user_facing() {
        assert!(Error::UnknownService("svc".into()).is_user_facing());
        assert!(!Error::Storage("disk full".into()).is_user_facing());
    }

    #[test]
    fn test_api_helper_display() {
        let err = Error::api("gmail", "HTTP 500");
        assert_eq!(err.to_string(), "API error: gmail - HTTP 500");
    }
}
