//! End-to-end behaviour of the tiered cache through the public API

use aide_foundation::{CacheConfig, CacheKey, CacheManager};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn config(dir: &std::path::Path) -> CacheConfig {
    CacheConfig::with_dir(dir.join("cache"))
}

#[test]
fn value_written_before_restart_is_served_after() {
    let dir = tempfile::tempdir().unwrap();

    let first = CacheManager::open(config(dir.path())).unwrap();
    first.set_with_ttl("k", json!("v"), Duration::from_secs(3600));
    first.shutdown();
    drop(first);

    let second = CacheManager::open(config(dir.path())).unwrap();
    assert_eq!(second.get("k"), Some(json!("v")));
    assert_eq!(second.stats().disk_hits, 1);
}

#[test]
fn entry_is_gone_once_ttl_has_passed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheManager::open(config(dir.path())).unwrap();

    cache.set_with_ttl("k", json!("v"), Duration::from_secs(1));
    assert_eq!(cache.get("k"), Some(json!("v")));

    std::thread::sleep(Duration::from_secs(2));

    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.memory_len(), 0);
    assert_eq!(cache.disk_len(), 0);
}

#[test]
fn operation_keys_depend_on_name_and_arguments() {
    let a = CacheKey::for_operation("search", &("rust", 10)).unwrap();
    let b = CacheKey::for_operation("search", &("rust", 10)).unwrap();
    let c = CacheKey::for_operation("search", &("rust", 20)).unwrap();
    let d = CacheKey::for_operation("lookup", &("rust", 10)).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_share_one_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheManager::open(config(dir.path())).unwrap());

    let tasks = (0..16).map(|worker| {
        let cache = cache.clone();
        tokio::spawn(async move {
            for i in 0..25 {
                let key = format!("worker{}:{}", worker, i);
                cache.set(&key, json!({"worker": worker, "i": i}));
                assert_eq!(cache.get(&key), Some(json!({"worker": worker, "i": i})));
            }
        })
    });

    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(cache.memory_len(), 400);
    assert_eq!(cache.disk_len(), 400);
    assert_eq!(cache.stats().io_errors, 0);
    cache.shutdown();
}

#[tokio::test]
async fn memoized_async_call_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let ttl = Duration::from_secs(600);

    {
        let cache = CacheManager::open(config(dir.path())).unwrap();
        let forecast = cache
            .cached("forecast", ttl)
            .call_async(&"Seoul", || async { vec![18, 21, 19] })
            .await;
        assert_eq!(forecast, vec![18, 21, 19]);
    }

    let cache = CacheManager::open(config(dir.path())).unwrap();
    let forecast: Vec<i32> = cache
        .cached("forecast", ttl)
        .call_async(&"Seoul", || async { Vec::new() })
        .await;
    assert_eq!(forecast, vec![18, 21, 19]);
}
