//! Memoized computations on top of [`CacheManager`]
//!
//! Results are keyed by an operation name plus a structural hash of the
//! arguments (see [`CacheKey::for_operation`]). A failed computation is never
//! stored.

use super::manager::CacheManager;
use super::util::CacheKey;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

impl CacheManager {
    /// Cached value for `key`, or compute, store and return it
    pub fn get_or_insert_with<T, F>(&self, key: &str, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(hit) = self.get_as::<T>(key) {
            return hit;
        }
        let value = compute();
        self.set_as(key, &value, Some(ttl));
        value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with); errors pass
    /// through uncached
    pub fn get_or_try_insert_with<T, E, F>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get_as::<T>(key) {
            return Ok(hit);
        }
        let value = compute()?;
        self.set_as(key, &value, Some(ttl));
        Ok(value)
    }

    pub async fn get_or_insert_async<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(hit) = self.get_as::<T>(key) {
            return hit;
        }
        let value = compute().await;
        self.set_as(key, &value, Some(ttl));
        value
    }

    pub async fn get_or_try_insert_async<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get_as::<T>(key) {
            return Ok(hit);
        }
        let value = compute().await?;
        self.set_as(key, &value, Some(ttl));
        Ok(value)
    }

    /// Memoizer for one named operation
    ///
    /// ```rust,ignore
    /// let lookup = cache.cached("weather", Duration::from_secs(900));
    /// let forecast = lookup
    ///     .try_call_async(&("Seoul", "metric"), || client.forecast("Seoul"))
    ///     .await?;
    /// ```
    pub fn cached(&self, operation: impl Into<String>, ttl: Duration) -> Cached<'_> {
        Cached {
            cache: self,
            operation: operation.into(),
            ttl,
        }
    }
}

/// Operation-scoped memoizer returned by [`CacheManager::cached`]
#[derive(Debug)]
pub struct Cached<'a> {
    cache: &'a CacheManager,
    operation: String,
    ttl: Duration,
}

impl Cached<'_> {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Key for `args`; `None` if the arguments cannot be serialized
    pub fn key<A: Serialize + ?Sized>(&self, args: &A) -> Option<CacheKey> {
        match CacheKey::for_operation(&self.operation, args) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    operation = %self.operation,
                    error = %e,
                    "Arguments are not hashable; calling through uncached"
                );
                None
            }
        }
    }

    pub fn call<A, T, F>(&self, args: &A, compute: F) -> T
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.key(args) {
            Some(key) => self
                .cache
                .get_or_insert_with(key.as_str(), self.ttl, compute),
            None => compute(),
        }
    }

    pub fn try_call<A, T, E, F>(&self, args: &A, compute: F) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        match self.key(args) {
            Some(key) => self
                .cache
                .get_or_try_insert_with(key.as_str(), self.ttl, compute),
            None => compute(),
        }
    }

    pub async fn call_async<A, T, F, Fut>(&self, args: &A, compute: F) -> T
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.key(args) {
            Some(key) => {
                debug!(key = %key, "Cached call");
                self.cache
                    .get_or_insert_async(key.as_str(), self.ttl, compute)
                    .await
            }
            None => compute().await,
        }
    }

    pub async fn try_call_async<A, T, E, F, Fut>(&self, args: &A, compute: F) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.key(args) {
            Some(key) => {
                debug!(key = %key, "Cached call");
                self.cache
                    .get_or_try_insert_async(key.as_str(), self.ttl, compute)
                    .await
            }
            None => compute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(600);

    fn open(dir: &std::path::Path) -> CacheManager {
        CacheManager::open(CacheConfig::with_dir(dir)).unwrap()
    }

    #[test]
    fn test_computes_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache.get_or_insert_with("answer", TTL, || {
                calls.fetch_add(1, Ordering::SeqCst);
                42u32
            });
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        let first: Result<u32, &str> = cache.get_or_try_insert_with("k", TTL, || Err("offline"));
        assert_eq!(first, Err("offline"));
        assert!(!cache.contains("k"));

        let second: Result<u32, &str> = cache.get_or_try_insert_with("k", TTL, || Ok(7));
        assert_eq!(second, Ok(7));
        assert!(cache.contains("k"));
    }

    #[test]
    fn test_none_result_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Option<String> = cache.get_or_insert_with("nothing", TTL, || {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            });
            assert_eq!(value, None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memoizer_keys_by_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        let square = cache.cached("square", TTL);
        let calls = AtomicUsize::new(0);

        let compute = |n: u64| {
            calls.fetch_add(1, Ordering::SeqCst);
            n * n
        };

        assert_eq!(square.call(&3u64, || compute(3)), 9);
        assert_eq!(square.call(&4u64, || compute(4)), 16);
        assert_eq!(square.call(&3u64, || compute(3)), 9);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(square.operation(), "square");
    }

    #[test]
    fn test_memoizers_with_different_names_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        let a = cache.cached("a", TTL).call(&1, || "from a".to_string());
        let b = cache.cached("b", TTL).call(&1, || "from b".to_string());

        assert_eq!(a, "from a");
        assert_eq!(b, "from b");
    }

    #[tokio::test]
    async fn test_async_memoizer() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        let lookup = cache.cached("lookup", TTL);
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            let value = lookup
                .call_async(&("seoul", "metric"), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    vec![18.5f64, 21.0]
                })
                .await;
            assert_eq!(value, vec![18.5, 21.0]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let failed: Result<u32, String> = lookup
            .try_call_async(&"busan", || async { Err("timeout".to_string()) })
            .await;
        assert!(failed.is_err());

        let key = lookup.key(&"busan").unwrap();
        assert!(!cache.contains(key.as_str()));
    }
}
