//! API access error types
//!
//! `ApiError` carries the service name and the failing operation so a single
//! log line or message is enough to locate the problem. Converts into
//! `aide_foundation::Error` for callers that work with the shared type.

use crate::retry::{RetryClassification, RetryableError};
use aide_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors returned by [`ApiManager`](crate::ApiManager)
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Service was never registered; no network call was made
    #[error("Unknown service: {service}")]
    UnknownService { service: String },

    /// Admission denied by the rate limiter; no network call was made
    #[error("Rate limit exceeded for {service}, retry after {retry_after_ms}ms")]
    RateLimitExceeded { service: String, retry_after_ms: u64 },

    /// Token acquisition failed
    #[error("Authentication failed for {service}: {message}")]
    Authentication { service: String, message: String },

    /// Non-2xx response
    #[error("{method} {endpoint} on {service} failed with HTTP {status}: {body}")]
    RequestFailed {
        service: String,
        method: String,
        endpoint: String,
        status: u16,
        body: String,
    },

    /// No response at all (connection, DNS, timeout)
    #[error("{method} {endpoint} on {service} failed: {message}")]
    Transport {
        service: String,
        method: String,
        endpoint: String,
        message: String,
        timed_out: bool,
    },

    /// 2xx response whose body could not be decoded
    #[error("Invalid response from {service} {endpoint}: {message}")]
    InvalidResponse {
        service: String,
        endpoint: String,
        message: String,
    },
}

impl ApiError {
    pub fn unknown_service(service: impl Into<String>) -> Self {
        ApiError::UnknownService {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        match self {
            ApiError::UnknownService { service }
            | ApiError::RateLimitExceeded { service, .. }
            | ApiError::Authentication { service, .. }
            | ApiError::RequestFailed { service, .. }
            | ApiError::Transport { service, .. }
            | ApiError::InvalidResponse { service, .. } => service,
        }
    }

    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport { timed_out: true, .. })
    }

    /// Rejected locally before anything went over the wire
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ApiError::UnknownService { .. } | ApiError::RateLimitExceeded { .. }
        )
    }
}

impl RetryableError for ApiError {
    fn classify(&self) -> RetryClassification {
        match self {
            ApiError::RateLimitExceeded { retry_after_ms, .. } => {
                RetryClassification::RateLimited {
                    retry_after_ms: Some(*retry_after_ms),
                }
            }

            ApiError::RequestFailed { status: 429, body, .. } => RetryClassification::RateLimited {
                retry_after_ms: extract_retry_after(body),
            },

            ApiError::RequestFailed {
                status: 408 | 500..=599,
                ..
            } => RetryClassification::Retry,

            ApiError::Transport { .. } => RetryClassification::Retry,

            ApiError::UnknownService { .. }
            | ApiError::Authentication { .. }
            | ApiError::RequestFailed { .. }
            | ApiError::InvalidResponse { .. } => RetryClassification::NoRetry,
        }
    }
}

/// Retry hint from an error body, in milliseconds
fn extract_retry_after(body: &str) -> Option<u64> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let hint = json
            .get("retry_after")
            .or_else(|| json.get("error").and_then(|e| e.get("retry_after")))
            .and_then(|v| v.as_f64());
        if let Some(secs) = hint {
            return Some((secs * 1000.0) as u64);
        }
    }

    // plain text: "... retry after 2.5 seconds ..."
    let idx = body.to_ascii_lowercase().find("retry")?;
    let num_str: String = body[idx..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    num_str.parse::<f64>().ok().map(|secs| (secs * 1000.0) as u64)
}

// ============================================================================
// aide_foundation::Error conversion
// ============================================================================

impl From<ApiError> for FoundationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::UnknownService { service } => FoundationError::UnknownService(service),
            ApiError::RateLimitExceeded {
                service,
                retry_after_ms,
            } => FoundationError::RateLimited(format!(
                "{}: retry after {}ms",
                service, retry_after_ms
            )),
            ApiError::Authentication { service, message } => {
                FoundationError::Authentication(format!("{}: {}", service, message))
            }
            ApiError::RequestFailed {
                service,
                method,
                endpoint,
                status,
                body,
            } => FoundationError::Api {
                service,
                message: format!("{} {} returned HTTP {}: {}", method, endpoint, status, body),
            },
            ApiError::Transport {
                service,
                method,
                endpoint,
                message,
                timed_out: true,
            } => FoundationError::Timeout(format!("{} {} {}: {}", service, method, endpoint, message)),
            ApiError::Transport {
                service,
                method,
                endpoint,
                message,
                timed_out: false,
            } => FoundationError::Http(format!("{} {} {}: {}", service, method, endpoint, message)),
            ApiError::InvalidResponse {
                service,
                endpoint,
                message,
            } => FoundationError::Api {
                service,
                message: format!("invalid response from {}: {}", endpoint, message),
            },
        }
    }
}
