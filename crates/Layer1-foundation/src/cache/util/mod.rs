//! Cache utilities
//!
//! - `hash`: stable structural hashing for cache keys and file names

mod hash;

pub use hash::{hash_str, CacheKey};
