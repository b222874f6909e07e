//! # aide-api
//!
//! Outbound API access layer for aide.
//!
//! ## Features
//! - Per-service sliding-window rate limiting (hard fail on denial)
//! - Token lifecycle: OAuth2 client credentials, static api keys, anonymous
//! - One shared, lazily opened HTTP session behind a [`Transport`] seam
//! - Caller-side retry with exponential backoff

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod manager;
pub mod rate_limit;
pub mod request;
pub mod retry;
pub mod testing;
pub mod transport;

// Core types
pub use endpoint::ApiEndpoint;
pub use manager::{ApiManager, ServiceState};
pub use rate_limit::RateLimiter;
pub use request::RequestOptions;
pub use reqwest::Method;

// Auth and transport
pub use auth::TokenRecord;
pub use transport::{
    join_url, OutboundRequest, RequestBody, ReqwestTransport, Transport, TransportError,
    TransportResponse,
};

// Error and retry
pub use error::ApiError;
pub use retry::{with_retry, RetryClassification, RetryConfig, RetryableError};
