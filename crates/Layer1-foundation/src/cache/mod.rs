//! # Tiered Cache
//!
//! Memory + disk key/value cache with per-entry TTL, used to avoid repeating
//! identical external API calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheManager                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Memory tier   HashMap<String, CacheEntry>  (lost on exit)  │
//! │       ▲ promote on disk hit                                 │
//! │  Disk tier     <dir>/<sha256(key)>.cache    (survives exit) │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Expiry: lazy on read + sweep on threshold + periodic task  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aide_foundation::cache::{CacheConfig, CacheManager};
//!
//! let cache = CacheManager::open(CacheConfig::default())?;
//!
//! cache.set("greeting", json!("hello"));
//! assert_eq!(cache.get("greeting"), Some(json!("hello")));
//!
//! let weather = cache.cached("weather", Duration::from_secs(900));
//! let forecast = weather.call(&"Seoul", || fetch_forecast("Seoul"));
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Cache configuration
//! - [`entry`] - Entry with TTL metadata
//! - [`disk`] - Disk tier
//! - [`manager`] - Tiered cache manager
//! - [`util`] - Key hashing

pub mod cached;
pub mod config;
pub mod disk;
pub mod entry;
pub mod manager;
pub mod stats;
pub mod util;

pub use cached::Cached;
pub use config::CacheConfig;
pub use disk::{CacheIoError, DiskTier};
pub use entry::CacheEntry;
pub use manager::CacheManager;
pub use stats::{CacheStats, SweepReport};
pub use util::{hash_str, CacheKey};
