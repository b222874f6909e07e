//! # aide-foundation
//!
//! Foundation layer for aide:
//! - Error: shared error type
//! - Config: service definitions (services.json) and app settings (config.json)
//! - Storage: JsonStore (global + project)
//! - Cache: tiered memory/disk cache with TTL
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  aide-cli                                               │
//! │          │                                              │
//! │          ▼                                              │
//! │  aide-api (ApiManager, RateLimiter, Transport)          │
//! │          │                                              │
//! │          ▼                                              │
//! │  aide-foundation                                        │
//! │  ├── Config  ──► JsonStore                              │
//! │  └── Cache   ──► memory tier + disk tier                │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    AideConfig, AuthMode, ServiceConfig, ServicesConfig, AIDE_CONFIG_FILE, SERVICES_FILE,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Cache
// ============================================================================
pub use cache::{
    CacheConfig, CacheEntry, CacheKey, CacheManager, CacheStats, Cached, SweepReport,
};
