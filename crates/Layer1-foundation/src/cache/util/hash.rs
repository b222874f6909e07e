//! Hashing utilities for cache keys
//!
//! Keys outlive the process (they name files on disk), so everything here is
//! SHA-256 based rather than `DefaultHasher`, whose output may change between
//! Rust releases.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex SHA-256 of an arbitrary string
pub fn hash_str(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn write_len(hasher: &mut Sha256, len: usize) {
    hasher.update((len as u64).to_le_bytes());
}

fn write_str(hasher: &mut Sha256, s: &str) {
    write_len(hasher, s.len());
    hasher.update(s.as_bytes());
}

/// Structural hash of a JSON value
///
/// Object key order does not matter; every node is type-tagged and
/// length-prefixed, so values that render to the same text but differ in
/// structure (`"1"` vs `1`, `["a,b"]` vs `["a","b"]`) hash differently.
fn hash_json_value(value: &Value, hasher: &mut Sha256) {
    match value {
        Value::Null => {
            hasher.update([0u8]);
        }
        Value::Bool(b) => {
            hasher.update([1u8, *b as u8]);
        }
        Value::Number(n) => {
            hasher.update([2u8]);
            write_str(hasher, &n.to_string());
        }
        Value::String(s) => {
            hasher.update([3u8]);
            write_str(hasher, s);
        }
        Value::Array(arr) => {
            hasher.update([4u8]);
            write_len(hasher, arr.len());
            for item in arr {
                hash_json_value(item, hasher);
            }
        }
        Value::Object(obj) => {
            hasher.update([5u8]);
            write_len(hasher, obj.len());
            let mut keys: Vec<_> = obj.keys().collect();
            keys.sort();
            for key in keys {
                write_str(hasher, key);
                if let Some(v) = obj.get(key) {
                    hash_json_value(v, hasher);
                }
            }
        }
    }
}

/// Cache key for a wrapped computation: operation identity plus arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// `operation:<structural hash of (operation, args)>`
    ///
    /// Fails only if `args` cannot be represented as JSON (e.g. a map with
    /// non-string keys).
    pub fn for_operation<A>(operation: &str, args: &A) -> serde_json::Result<Self>
    where
        A: Serialize + ?Sized,
    {
        let args = serde_json::to_value(args)?;
        let mut hasher = Sha256::new();
        write_str(&mut hasher, operation);
        hash_json_value(&args, &mut hasher);
        Ok(Self(format!("{}:{:x}", operation, hasher.finalize())))
    }

    /// Wrap a caller-computed key as-is
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
