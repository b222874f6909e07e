//! Tiered Cache Manager
//!
//! Memory tier in front of a disk tier, with lazy TTL expiry and a periodic
//! background sweep.
//!
//! ```text
//! get ──► memory ──hit──► value
//!            │ miss / expired (dropped)
//!            ▼
//!          disk ──hit──► promote to memory ──► value
//!            │ miss / expired (file removed) / unreadable
//!            ▼
//!          None
//! ```
//!
//! Locking:
//! - `memory` guards the whole in-process map; held only for map operations.
//! - `disk_guard` is taken shared by `get` (read plus promotion) and `set`
//!   (memory insert plus write), and exclusive by `delete`, `clear` and
//!   `cleanup` (one batch of files at a time). A deleted key therefore cannot
//!   be promoted or rewritten by a call that started before the delete.
//! - Order: `disk_guard`, then `memory`, then `stats`. `stats` is a leaf lock.
//!
//! Disk failures never reach the caller. They are logged, counted in
//! [`CacheStats::io_errors`], and the entry is treated as absent.

use super::config::CacheConfig;
use super::disk::{CacheIoError, DiskTier};
use super::entry::CacheEntry;
use super::stats::{CacheStats, SweepReport};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Two-tier (memory + disk) key/value cache with per-entry TTL
///
/// # Usage
///
/// ```rust,ignore
/// let cache = CacheManager::open(CacheConfig::with_dir(".cache"))?;
///
/// cache.set_with_ttl("calendar:today", json!(events), Duration::from_secs(600));
/// let events = cache.get("calendar:today");
///
/// cache.shutdown();
/// ```
///
/// When opened inside a Tokio runtime the manager also owns a background task
/// that runs [`cleanup`](Self::cleanup) every `sweep_interval_secs`; it is
/// cancelled by [`shutdown`](Self::shutdown) or on drop.
pub struct CacheManager {
    inner: Arc<CacheInner>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

struct CacheInner {
    config: CacheConfig,
    memory: Mutex<HashMap<String, CacheEntry>>,
    disk: DiskTier,
    disk_guard: RwLock<()>,
    stats: Mutex<CacheStats>,
}

impl CacheManager {
    /// Open the cache rooted at `config.dir`
    ///
    /// Existing entry files are kept and served on demand. The periodic sweep
    /// starts only if a Tokio runtime is available.
    pub fn open(config: CacheConfig) -> Result<Self> {
        let disk = DiskTier::open(&config.dir).map_err(|e| Error::Storage(e.to_string()))?;

        let inner = Arc::new(CacheInner {
            config,
            memory: Mutex::new(HashMap::new()),
            disk,
            disk_guard: RwLock::new(()),
            stats: Mutex::new(CacheStats::default()),
        });

        let sweeper = spawn_sweeper(&inner);
        if sweeper.is_none() {
            debug!("No Tokio runtime; periodic cache sweep disabled");
        }

        info!(
            dir = %inner.config.dir.display(),
            disk_entries = inner.disk.len(),
            "Cache opened"
        );

        Ok(Self {
            inner,
            sweeper: Mutex::new(sweeper),
        })
    }

    // =========================================================================
    // Core operations
    // =========================================================================

    /// Live value for `key`, checking memory then disk
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key)
    }

    /// Live value for `key`, or `default`
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Live value decoded as `T`; a value of another shape counts as a miss
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key, error = %e, "Cached value has an unexpected shape");
                None
            }
        }
    }

    /// Store with the configured default TTL
    pub fn set(&self, key: &str, value: Value) {
        self.inner.set(key, value, self.inner.config.default_ttl());
    }

    pub fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) {
        self.inner.set(key, value, ttl);
    }

    /// Serialize and store; a value that cannot become JSON is logged and skipped
    pub fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        match serde_json::to_value(value) {
            Ok(value) => {
                let ttl = ttl.unwrap_or_else(|| self.inner.config.default_ttl());
                self.inner.set(key, value, ttl);
            }
            Err(e) => warn!(key, error = %e, "Value is not cacheable"),
        }
    }

    /// Remove from both tiers; returns whether anything was removed
    pub fn delete(&self, key: &str) -> bool {
        self.inner.delete(key)
    }

    /// Drop expired memory entries and expired or unreadable disk files
    pub fn cleanup(&self) -> SweepReport {
        self.inner.cleanup()
    }

    /// Empty both tiers
    pub fn clear(&self) {
        self.inner.clear();
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Whether a live entry exists, without touching access metadata
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    pub fn memory_len(&self) -> usize {
        self.inner.memory.lock().len()
    }

    pub fn disk_len(&self) -> usize {
        let _guard = self.inner.disk_guard.read();
        self.inner.disk.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.lock().clone()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn dir(&self) -> &Path {
        self.inner.disk.dir()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Whether the periodic sweep task is running
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the periodic sweep. Entries already on disk stay there.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            let stats = self.stats();
            info!(
                hit_rate = stats.hit_rate(),
                sweeps = stats.sweeps,
                io_errors = stats.io_errors,
                "Cache sweep stopped"
            );
        }
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("dir", &self.inner.config.dir)
            .field("memory_len", &self.memory_len())
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

fn spawn_sweeper(inner: &Arc<CacheInner>) -> Option<JoinHandle<()>> {
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let weak: Weak<CacheInner> = Arc::downgrade(inner);
    let period = inner.config.sweep_interval();

    Some(runtime.spawn(async move {
        let mut timer = tokio::time::interval(period);
        // first tick completes immediately
        timer.tick().await;

        loop {
            timer.tick().await;

            let Some(inner) = weak.upgrade() else {
                break;
            };

            match tokio::task::spawn_blocking(move || inner.cleanup()).await {
                Ok(report) if report.total() > 0 => {
                    debug!(
                        memory_expired = report.memory_expired,
                        disk_expired = report.disk_expired,
                        disk_corrupt = report.disk_corrupt,
                        "Periodic cache sweep"
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Periodic cache sweep failed"),
            }
        }
    }))
}

impl CacheInner {
    fn batch(&self) -> usize {
        self.config.sweep_batch.max(1)
    }

    fn record_io_error(&self, error: &CacheIoError) {
        warn!(error = %error, "Cache disk operation failed; treating entry as absent");
        self.stats.lock().io_errors += 1;
    }

    fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.get_memory(key) {
            self.stats.lock().memory_hits += 1;
            return Some(value);
        }

        match self.get_disk(key) {
            Some(value) => {
                let mut stats = self.stats.lock();
                stats.disk_hits += 1;
                stats.promotions += 1;
                Some(value)
            }
            None => {
                self.stats.lock().misses += 1;
                None
            }
        }
    }

    fn get_memory(&self, key: &str) -> Option<Value> {
        let mut memory = self.memory.lock();
        let entry = memory.get_mut(key)?;

        if entry.is_expired() {
            memory.remove(key);
            drop(memory);
            self.stats.lock().expired += 1;
            debug!(key, "Memory entry expired");
            return None;
        }

        entry.access();
        Some(entry.value.clone())
    }

    fn get_disk(&self, key: &str) -> Option<Value> {
        let _guard = self.disk_guard.read();
        let entry = match self.disk.read(key) {
            Ok(Some(entry)) if entry.key != key => None,
            Ok(Some(entry)) if entry.is_expired() => {
                if let Err(e) = self.disk.remove(key) {
                    self.record_io_error(&e);
                }
                self.stats.lock().expired += 1;
                debug!(key, "Disk entry expired");
                None
            }
            Ok(found) => found,
            Err(e) => {
                self.record_io_error(&e);
                if matches!(e, CacheIoError::Decode { .. }) {
                    if let Err(e) = self.disk.remove(key) {
                        self.record_io_error(&e);
                    }
                }
                None
            }
        }?;

        // a concurrent `set` may have landed in memory since the read
        let mut memory = self.memory.lock();
        let slot = match memory.entry(key.to_string()) {
            Entry::Occupied(occupied) if !occupied.get().is_expired() => occupied.into_mut(),
            Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(entry),
        };
        slot.access();
        debug!(key, "Promoted disk entry to memory");
        Some(slot.value.clone())
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry::new(key, value, ttl);

        let over_threshold = {
            let _guard = self.disk_guard.read();
            let over_threshold = {
                let mut memory = self.memory.lock();
                memory.insert(key.to_string(), entry.clone());
                memory.len() > self.config.cleanup_threshold
            };
            if let Err(e) = self.disk.write(&entry) {
                self.record_io_error(&e);
            }
            over_threshold
        };

        if over_threshold {
            debug!(
                threshold = self.config.cleanup_threshold,
                "Memory tier over threshold; sweeping"
            );
            self.cleanup();
            self.demote_cold_entries();
        }
    }

    fn delete(&self, key: &str) -> bool {
        let _guard = self.disk_guard.write();
        let in_memory = self.memory.lock().remove(key).is_some();
        let on_disk = match self.disk.remove(key) {
            Ok(removed) => removed,
            Err(e) => {
                self.record_io_error(&e);
                false
            }
        };

        in_memory || on_disk
    }

    fn contains(&self, key: &str) -> bool {
        if let Some(entry) = self.memory.lock().get(key) {
            if !entry.is_expired() {
                return true;
            }
        }

        let _guard = self.disk_guard.read();
        matches!(self.disk.read(key), Ok(Some(entry)) if entry.key == key && !entry.is_expired())
    }

    fn cleanup(&self) -> SweepReport {
        let now = Utc::now();
        let memory_expired = self.sweep_memory(now);
        let (disk_expired, disk_corrupt) = self.sweep_disk(now);

        let report = SweepReport {
            memory_expired,
            disk_expired,
            disk_corrupt,
        };

        {
            let mut stats = self.stats.lock();
            stats.sweeps += 1;
            stats.expired += (memory_expired + disk_expired) as u64;
        }

        debug!(
            memory_expired,
            disk_expired, disk_corrupt, "Cache cleanup finished"
        );
        report
    }

    /// Scan once, then delete in batches so foreground calls can interleave
    fn sweep_memory(&self, now: DateTime<Utc>) -> usize {
        let candidates: Vec<String> = {
            let memory = self.memory.lock();
            memory
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect()
        };

        let mut removed = 0;
        for chunk in candidates.chunks(self.batch()) {
            let mut memory = self.memory.lock();
            for key in chunk {
                // the key may have been set again since the scan
                if memory.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
                    memory.remove(key);
                    removed += 1;
                }
            }
        }
        removed
    }

    fn sweep_disk(&self, now: DateTime<Utc>) -> (usize, usize) {
        let paths = match self.disk.entry_paths() {
            Ok(paths) => paths,
            Err(e) => {
                self.record_io_error(&e);
                return (0, 0);
            }
        };

        let mut expired = 0;
        let mut corrupt = 0;
        for chunk in paths.chunks(self.batch()) {
            let _guard = self.disk_guard.write();
            for path in chunk {
                match self.disk.read_path(path) {
                    Ok(entry) if entry.is_expired_at(now) => {
                        if self.remove_file(path) {
                            expired += 1;
                        }
                    }
                    Ok(_) => {}
                    Err(CacheIoError::Read { ref source, .. })
                        if source.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        debug!(error = %e, "Removing unreadable cache file");
                        if self.remove_file(path) {
                            corrupt += 1;
                        }
                    }
                }
            }
        }
        (expired, corrupt)
    }

    fn remove_file(&self, path: &Path) -> bool {
        match self.disk.remove_path(path) {
            Ok(removed) => removed,
            Err(e) => {
                self.record_io_error(&e);
                false
            }
        }
    }

    /// Trim a memory tier full of live entries back to the low-water mark,
    /// least recently accessed first. Demoted entries remain on disk.
    fn demote_cold_entries(&self) {
        let demoted = {
            let mut memory = self.memory.lock();
            if memory.len() <= self.config.cleanup_threshold {
                return;
            }

            let mut by_access: Vec<(DateTime<Utc>, String)> = memory
                .iter()
                .map(|(key, entry)| (entry.last_accessed, key.clone()))
                .collect();
            by_access.sort();

            let excess = memory.len().saturating_sub(self.config.low_water_mark());
            for (_, key) in by_access.into_iter().take(excess) {
                memory.remove(&key);
            }
            excess
        };

        self.stats.lock().evictions += demoted as u64;
        debug!(demoted, "Demoted cold entries to disk only");
    }

    fn clear(&self) {
        let _guard = self.disk_guard.write();
        self.memory.lock().clear();
        *self.stats.lock() = CacheStats::default();

        match self.disk.all_paths() {
            Ok(paths) => {
                for path in paths {
                    self.remove_file(&path);
                }
            }
            Err(e) => self.record_io_error(&e),
        }
        debug!("Cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open(dir: &Path) -> CacheManager {
        CacheManager::open(CacheConfig::with_dir(dir)).unwrap()
    }

    fn open_with(dir: &Path, configure: impl FnOnce(&mut CacheConfig)) -> CacheManager {
        let mut config = CacheConfig::with_dir(dir);
        configure(&mut config);
        CacheManager::open(config).unwrap()
    }

    const SHORT: Duration = Duration::from_millis(50);

    fn wait_past(ttl: Duration) {
        std::thread::sleep(ttl * 3);
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        cache.set_with_ttl("search:rust", json!({"results": ["a", "b"]}), Duration::from_secs(3600));

        assert_eq!(
            cache.get("search:rust"),
            Some(json!({"results": ["a", "b"]}))
        );
        assert_eq!(cache.stats().memory_hits, 1);
        assert_eq!(cache.disk_len(), 1);
    }

    #[test]
    fn test_missing_key_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        assert_eq!(cache.get("absent"), None);
        assert_eq!(cache.get_or("absent", json!("fallback")), json!("fallback"));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_overwrite_replaces_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        cache.set("k", json!(1));
        cache.set("k", json!(2));
        assert_eq!(cache.get("k"), Some(json!(2)));
        drop(cache);

        let reopened = open(dir.path());
        assert_eq!(reopened.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_survives_restart_via_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = open(dir.path());
            cache.set_with_ttl("mail:inbox", json!(["m1", "m2"]), Duration::from_secs(3600));
        }

        let cache = open(dir.path());
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.get("mail:inbox"), Some(json!(["m1", "m2"])));

        let stats = cache.stats();
        assert_eq!(stats.disk_hits, 1);
        assert_eq!(stats.promotions, 1);
        assert_eq!(cache.memory_len(), 1);

        // second read is served from memory
        assert_eq!(cache.get("mail:inbox"), Some(json!(["m1", "m2"])));
        assert_eq!(cache.stats().memory_hits, 1);
    }

    #[test]
    fn test_expired_memory_entry_is_dropped_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        cache.set_with_ttl("k", json!("v"), SHORT);
        assert_eq!(cache.get("k"), Some(json!("v")));

        wait_past(SHORT);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.memory_len(), 0);
        // the disk copy was expired as well and got removed on the fall-through
        assert_eq!(cache.disk_len(), 0);
    }

    #[test]
    fn test_expired_disk_entry_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = open(dir.path());
            cache.set_with_ttl("k", json!("v"), SHORT);
        }
        wait_past(SHORT);

        let cache = open(dir.path());
        assert_eq!(cache.disk_len(), 1);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.disk_len(), 0);
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn test_delete_absent_key_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        cache.set("present", json!(true));

        assert!(!cache.delete("absent"));
        assert_eq!(cache.memory_len(), 1);
        assert_eq!(cache.disk_len(), 1);
        assert_eq!(cache.get("present"), Some(json!(true)));
    }

    #[test]
    fn test_delete_removes_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        cache.set("k", json!(1));

        assert!(cache.delete("k"));
        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.disk_len(), 0);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_cleanup_removes_expired_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());

        cache.set_with_ttl("short", json!(1), SHORT);
        cache.set_with_ttl("long", json!(2), Duration::from_secs(3600));
        std::fs::write(cache.dir().join("deadbeef.cache"), b"not json").unwrap();
        wait_past(SHORT);

        let report = cache.cleanup();

        assert_eq!(report.memory_expired, 1);
        assert_eq!(report.disk_expired, 1);
        assert_eq!(report.disk_corrupt, 1);
        assert_eq!(cache.memory_len(), 1);
        assert_eq!(cache.disk_len(), 1);
        assert_eq!(cache.get("long"), Some(json!(2)));
    }

    #[test]
    fn test_corrupt_file_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        let path = DiskTier::open(dir.path()).unwrap().path_for("k");
        std::fs::write(&path, b"{truncated").unwrap();

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().io_errors, 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_empties_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        for i in 0..5 {
            cache.set(&format!("k{}", i), json!(i));
        }

        cache.clear();

        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.disk_len(), 0);
        assert_eq!(cache.get("k0"), None);
    }

    #[test]
    fn test_threshold_triggers_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_with(dir.path(), |c| c.cleanup_threshold = 3);

        for i in 0..3 {
            cache.set_with_ttl(&format!("old{}", i), json!(i), SHORT);
        }
        wait_past(SHORT);
        assert_eq!(cache.stats().sweeps, 0);

        cache.set("fresh", json!("x"));

        assert_eq!(cache.stats().sweeps, 1);
        assert_eq!(cache.memory_len(), 1);
        assert_eq!(cache.disk_len(), 1);
    }

    #[test]
    fn test_live_entries_over_threshold_are_demoted_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_with(dir.path(), |c| c.cleanup_threshold = 10);

        for i in 0..11 {
            cache.set(&format!("k{}", i), json!(i));
        }

        assert_eq!(cache.memory_len(), 9);
        assert_eq!(cache.disk_len(), 11);
        assert_eq!(cache.stats().evictions, 2);
        for i in 0..11 {
            assert_eq!(cache.get(&format!("k{}", i)), Some(json!(i)));
        }
    }

    #[test]
    fn test_typed_access() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Event {
            title: String,
            minutes: u32,
        }

        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        let event = Event {
            title: "standup".into(),
            minutes: 15,
        };

        cache.set_as("event", &event, None);

        assert_eq!(cache.get_as::<Event>("event"), Some(event));
        assert_eq!(cache.get_as::<Vec<u8>>("event"), None);
    }

    #[test]
    fn test_contains_does_not_count_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        cache.set("k", json!(1));

        assert!(cache.contains("k"));
        assert!(!cache.contains("absent"));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_concurrent_set_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_with(dir.path(), |c| c.cleanup_threshold = 16);

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..50 {
                        let key = format!("k{}", i % 10);
                        cache.set(&key, json!(worker));
                        let _ = cache.get(&key);
                        if i % 7 == 0 {
                            cache.delete(&key);
                        }
                    }
                });
            }
        });

        assert!(cache.memory_len() <= 10);
        assert_eq!(cache.stats().io_errors, 0);
        for i in 0..10 {
            let key = format!("k{}", i);
            if let Some(value) = cache.get(&key) {
                assert!(value.as_u64().unwrap() < 8);
            }
        }
    }

    #[test]
    fn test_removal_racing_promotion_stays_removed() {
        let dir = tempfile::tempdir().unwrap();

        for round in 0..300 {
            open(dir.path()).set_with_ttl("k", json!(round), Duration::from_secs(3600));

            // memory is empty, so `get` has to promote from disk
            let cache = open(dir.path());
            let barrier = std::sync::Barrier::new(2);
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    let _ = cache.get("k");
                });
                scope.spawn(|| {
                    barrier.wait();
                    if round % 2 == 0 {
                        cache.delete("k");
                    } else {
                        cache.clear();
                    }
                });
            });

            assert_eq!(cache.get("k"), None, "round {round}");
            assert_eq!(cache.memory_len(), 0, "round {round}");
            assert_eq!(cache.disk_len(), 0, "round {round}");
        }
    }

    #[test]
    fn test_no_sweeper_without_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        assert!(!cache.is_sweeping());
        cache.shutdown();
    }

    #[tokio::test]
    async fn test_background_sweep_evicts_without_reads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open_with(dir.path(), |c| c.sweep_interval_secs = 1);
        assert!(cache.is_sweeping());

        cache.set_with_ttl("k", json!("v"), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(cache.memory_len(), 0);
        assert_eq!(cache.disk_len(), 0);
        assert!(cache.stats().sweeps >= 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweeper() {
        let dir = tempfile::tempdir().unwrap();
        let cache = open(dir.path());
        assert!(cache.is_sweeping());

        cache.shutdown();
        tokio::task::yield_now().await;

        assert!(!cache.is_sweeping());
    }
}
