//! Cache entry with lazy expiry

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A cached value plus its lifecycle metadata
///
/// Expiry is never stored as a flag; it is recomputed from `created_at + ttl`
/// on every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    /// TTL in milliseconds
    ttl_ms: u64,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Value, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value,
            created_at: now,
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            last_accessed: now,
            access_count: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// `None` when the TTL is too large to represent (never expires)
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = TimeDelta::from_std(self.ttl()).ok()?;
        self.created_at.checked_add_signed(ttl)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    /// Record a read
    pub fn access(&mut self) {
        self.last_accessed = Utc::now();
        self.access_count += 1;
    }
}
