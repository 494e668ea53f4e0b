//! Cache store: a typed read-through wrapper over a swappable backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to the cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Raw key-value store with per-entry TTL and prefix deletion.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the payload for `key`, if present and not expired.
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `payload` under `key` for `ttl`.
    async fn store(&self, key: &str, ttl: Duration, payload: String) -> Result<(), CacheError>;

    /// Delete every entry whose key starts with `prefix:`.
    async fn remove_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct Entry {
    payload: String,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process [`CacheBackend`] over a `moka` cache.
pub struct MokaBackend {
    entries: Cache<String, Entry>,
}

impl MokaBackend {
    /// Create a backend holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();
        Self { entries }
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.payload))
    }

    async fn store(&self, key: &str, ttl: Duration, payload: String) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_owned(), Entry { payload, ttl })
            .await;
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let scoped = format!("{prefix}:");
        self.entries
            .invalidate_entries_if(move |key, _| key.starts_with(&scoped))
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }
}

/// Typed read-through cache used by the resource controllers.
///
/// Every failure degrades: a backend error or an undecodable payload is a
/// miss, a failed write returns `false`, and invalidation errors are
/// logged. Callers always fall through to the source of truth.
///
/// Concurrent identical misses both hit the source of truth; there is no
/// single-flight de-duplication (known limitation, kept for behavioral
/// parity).
#[derive(Clone)]
pub struct QueryCache {
    backend: Arc<dyn CacheBackend>,
}

impl QueryCache {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// In-process cache with a default capacity, for production startup.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MokaBackend::new(10_000)))
    }

    /// Typed lookup. Anything that is not a decodable `T` is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.fetch(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    debug!(key, error = %e, "cached payload failed to decode, treating as miss");
                    None
                }
            },
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Store a value under `key` for `ttl`. Returns whether the write
    /// stuck; failures only cost the next reader a trip to the database.
    pub async fn set<T: Serialize>(&self, key: &str, ttl: Duration, value: &T) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "cache serialization failed");
                return false;
            }
        };
        match self.backend.store(key, ttl, payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "cache write failed");
                false
            }
        }
    }

    /// Drop every entry under `prefix`. Called synchronously after each
    /// write commits and before the response is sent.
    pub async fn invalidate(&self, prefix: &str) {
        if let Err(e) = self.backend.remove_prefix(prefix).await {
            warn!(prefix, error = %e, "cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        rows: Vec<String>,
        count: i64,
    }

    fn payload() -> Payload {
        Payload {
            rows: vec!["tea".to_owned()],
            count: 1,
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn fetch(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".to_owned()))
        }

        async fn store(
            &self,
            _key: &str,
            _ttl: Duration,
            _payload: String,
        ) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_owned()))
        }

        async fn remove_prefix(&self, _prefix: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = QueryCache::in_memory();
        assert!(cache.set("products:getAll", TTL, &payload()).await);
        assert_eq!(
            cache.get::<Payload>("products:getAll").await,
            Some(payload())
        );
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn invalidation_scope_is_the_prefix() {
        let cache = QueryCache::in_memory();
        cache.set("products:getAll:page:1", TTL, &payload()).await;
        cache.set("products:getById:id:5", TTL, &payload()).await;
        cache.set("types:getAll", TTL, &payload()).await;

        cache.invalidate("products").await;

        assert_eq!(cache.get::<Payload>("products:getAll:page:1").await, None);
        assert_eq!(cache.get::<Payload>("products:getById:id:5").await, None);
        assert_eq!(cache.get::<Payload>("types:getAll").await, Some(payload()));
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = QueryCache::in_memory();
        cache
            .set("products:getAll", Duration::from_millis(50), &payload())
            .await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get::<Payload>("products:getAll").await, None);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_miss() {
        let backend = Arc::new(MokaBackend::new(16));
        backend
            .store("products:getAll", TTL, "{\"weird\": true}".to_owned())
            .await
            .expect("raw store");
        let cache = QueryCache::new(backend);
        assert_eq!(cache.get::<Payload>("products:getAll").await, None);
    }

    #[tokio::test]
    async fn backend_failures_degrade_silently() {
        let cache = QueryCache::new(Arc::new(FailingBackend));
        assert_eq!(cache.get::<Payload>("products:getAll").await, None);
        assert!(!cache.set("products:getAll", TTL, &payload()).await);
        cache.invalidate("products").await; // must not panic or propagate
    }
}
