//! TTL'd key-value cache with best-effort disk persistence
//!
//! One JSON blob on disk holds every entry. Persistence failures are
//! logged and swallowed: the cache degrades to memory-only rather than
//! failing a refresh.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    data: Value,
}

/// Shared cache handle. Cloning is cheap and all clones see the same
/// entries.
#[derive(Clone)]
pub struct PriceCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    path: Arc<PathBuf>,
}

impl PriceCache {
    /// Open the cache at `path`, loading whatever previous runs left
    /// behind. Unreadable or unparseable blobs start the cache empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(map) => {
                    debug!(entries = map.len(), path = %path.display(), "Loaded cache blob");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unparseable cache blob");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            entries: Arc::new(RwLock::new(entries)),
            path: Arc::new(path),
        }
    }

    /// Entry for `key` if present and younger than `ttl_ms`
    pub async fn get(&self, key: &str, ttl_ms: i64) -> Option<Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let age_ms = (Utc::now() - entry.fetched_at).num_milliseconds();
        if age_ms < ttl_ms {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub async fn set(&self, key: &str, data: Value) {
        {
            let mut entries = self.entries.write().await;
            entries.insert(
                key.to_string(),
                CacheEntry {
                    fetched_at: Utc::now(),
                    data,
                },
            );
        }
        self.persist().await;
    }

    pub async fn has(&self, key: &str, ttl_ms: i64) -> bool {
        self.get(key, ttl_ms).await.is_some()
    }

    /// (key, fetched_at) for every entry, sorted by key
    pub async fn snapshot(&self) -> Vec<(String, DateTime<Utc>)> {
        let entries = self.entries.read().await;
        let mut out: Vec<(String, DateTime<Utc>)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.fetched_at))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    async fn persist(&self) {
        let serialized = {
            let entries = self.entries.read().await;
            serde_json::to_string(&*entries)
        };
        match serialized {
            Ok(blob) => {
                if let Err(e) = std::fs::write(self.path.as_ref(), blob) {
                    warn!(path = %self.path.display(), error = %e, "Cache persistence failed, continuing in memory");
                }
            }
            Err(e) => warn!(error = %e, "Cache serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sectorcycle_cache_test_{}_{}.json", tag, std::process::id()))
    }

    #[tokio::test]
    async fn test_set_then_get_within_ttl() {
        let cache = PriceCache::open(temp_path("basic"));
        cache.set("y:SPY", json!({"closes": [1, 2, 3]})).await;
        let hit = cache.get("y:SPY", 60_000).await;
        assert_eq!(hit, Some(json!({"closes": [1, 2, 3]})));
        assert!(cache.has("y:SPY", 60_000).await);
    }

    #[tokio::test]
    async fn test_expired_entry_misses() {
        let cache = PriceCache::open(temp_path("expired"));
        cache.set("s:XLE", json!(1)).await;
        assert_eq!(cache.get("s:XLE", 0).await, None);
        assert!(!cache.has("s:XLE", 0).await);
    }

    #[tokio::test]
    async fn test_missing_key_misses() {
        let cache = PriceCache::open(temp_path("missing"));
        assert_eq!(cache.get("y:NOPE", 60_000).await, None);
    }

    #[tokio::test]
    async fn test_persists_across_open() {
        let path = temp_path("persist");
        let _ = std::fs::remove_file(&path);
        {
            let cache = PriceCache::open(path.clone());
            cache.set("h:XLK", json!(["AAPL", "MSFT"])).await;
        }
        let reopened = PriceCache::open(path.clone());
        assert_eq!(
            reopened.get("h:XLK", 60_000).await,
            Some(json!(["AAPL", "MSFT"]))
        );
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_corrupt_blob_starts_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json at all {{{").unwrap();
        let cache = PriceCache::open(path.clone());
        assert_eq!(cache.get("y:SPY", 60_000).await, None);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_snapshot_sorted() {
        let cache = PriceCache::open(temp_path("snapshot"));
        cache.set("y:XLF", json!(1)).await;
        cache.set("h:XLF", json!(2)).await;
        let snap = cache.snapshot().await;
        let keys: Vec<&str> = snap.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["h:XLF", "y:XLF"]);
    }
}
