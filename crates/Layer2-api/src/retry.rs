//! Caller-side retry with exponential backoff
//!
//! [`ApiManager::request`](crate::ApiManager::request) never retries; callers
//! that want retries wrap it:
//!
//! ```rust,ignore
//! let body = with_retry(&RetryConfig::default(), "search", || {
//!     api.get("search", "/v1/query", RequestOptions::new().param("q", "rust"))
//! })
//! .await?;
//! ```

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff settings
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,

    pub backoff_multiplier: f64,

    /// Upper bound for any single delay, including server-provided ones (milliseconds)
    pub max_delay_ms: u64,

    /// Spread delays by ±20%
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: 60_000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt + 1` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);

        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let final_delay = if self.jitter {
            let jitter_factor = 0.8 + rand_jitter() * 0.4;
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }

    fn cap(&self, delay: Duration) -> Duration {
        delay.min(Duration::from_millis(self.max_delay_ms))
    }
}

/// Pseudo-random value in [0, 1) from the clock's sub-second nanos
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// How a failure should be treated by [`with_retry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClassification {
    /// Transient; back off and try again
    Retry,

    /// Permanent; return immediately
    NoRetry,

    /// Throttled; wait the hinted delay if known
    RateLimited { retry_after_ms: Option<u64> },
}

pub trait RetryableError {
    fn classify(&self) -> RetryClassification;
}

/// Run `operation` until it succeeds, fails permanently, or retries run out
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: RetryableError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let classification = error.classify();
        if classification == RetryClassification::NoRetry {
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                error = %error,
                "Non-retryable failure"
            );
            return Err(error);
        }

        if attempt >= config.max_retries {
            warn!(
                operation = operation_name,
                max_retries = config.max_retries,
                error = %error,
                "Retries exhausted"
            );
            return Err(error);
        }

        let delay = match classification {
            RetryClassification::RateLimited {
                retry_after_ms: Some(ms),
            } => config.cap(Duration::from_millis(ms)),
            _ => config.delay_for_attempt(attempt),
        };

        warn!(
            operation = operation_name,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, retrying"
        );

        sleep(delay).await;
        attempt += 1;
    }
}
