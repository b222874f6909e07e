//! Cache configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tiered cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Directory holding one file per cached key
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// TTL applied by `set` when the caller gives none (seconds)
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Memory-tier size that triggers a synchronous sweep on `set`
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: usize,

    /// Period of the background sweep (seconds)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Keys/files handled per lock acquisition during a sweep
    #[serde(default = "default_sweep_batch")]
    pub sweep_batch: usize,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("aide"))
        .unwrap_or_else(|| PathBuf::from(".cache"))
}
fn default_ttl_secs() -> u64 {
    3600
} // 1 hour
fn default_cleanup_threshold() -> usize {
    1000
}
fn default_sweep_interval_secs() -> u64 {
    300
} // 5 minutes
fn default_sweep_batch() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            default_ttl_secs: default_ttl_secs(),
            cleanup_threshold: default_cleanup_threshold(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_batch: default_sweep_batch(),
        }
    }
}

impl CacheConfig {
    /// Default settings rooted at `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Memory size the tier is trimmed back to once the threshold is crossed
    pub fn low_water_mark(&self) -> usize {
        self.cleanup_threshold - self.cleanup_threshold / 10
    }

    /// Overlay fields that differ from the defaults
    pub fn merge(&mut self, other: CacheConfig) {
        if other.dir != default_cache_dir() {
            self.dir = other.dir;
        }
        if other.default_ttl_secs != default_ttl_secs() {
            self.default_ttl_secs = other.default_ttl_secs;
        }
        if other.cleanup_threshold != default_cleanup_threshold() {
            self.cleanup_threshold = other.cleanup_threshold;
        }
        if other.sweep_interval_secs != default_sweep_interval_secs() {
            self.sweep_interval_secs = other.sweep_interval_secs;
        }
        if other.sweep_batch != default_sweep_batch() {
            self.sweep_batch = other.sweep_batch;
        }
    }
}
