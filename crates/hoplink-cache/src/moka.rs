use async_trait::async_trait;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;
use hoplink_core::cache::Result;
use hoplink_core::{ShortCode, UrlCache, UrlRecord};

#[derive(Debug, Clone)]
struct Entry {
    record: UrlRecord,
    valid_until: Option<Instant>,
}

/// An in-memory cache implementation using Moka.
///
/// Moka's eviction TTL is cache-wide, so the per-entry TTL from the
/// contract is enforced lazily: each entry carries its own deadline and
/// a read past the deadline invalidates it and reports a miss.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<String, Entry>,
}

impl MokaUrlCache {
    /// Creates a Moka URL cache with a default capacity of 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a Moka URL cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let key = code.as_str().to_string();
        match self.cache.get(&key).await {
            Some(entry) => {
                if entry.valid_until.is_some_and(|at| Instant::now() >= at) {
                    trace!(code = %code, "entry outlived its TTL, invalidating");
                    self.cache.invalidate(&key).await;
                    return Ok(None);
                }
                debug!(code = %code, "cache hit in Moka");
                Ok(Some(entry.record))
            }
            None => {
                trace!(code = %code, "cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        trace!(code = %code, ttl = ?ttl, "storing URL record in Moka cache");

        let entry = Entry {
            record: record.clone(),
            valid_until: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.cache.insert(code.as_str().to_string(), entry).await;
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        trace!(code = %code, "removing URL record from Moka cache");
        self.cache.invalidate(code.as_str()).await;
        Ok(())
    }
}

/// Configuration for creating a [`MokaUrlCache`] with custom settings.
#[derive(Debug, TypedBuilder, Default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    /// Cache-wide time-to-live for entries, applied on top of any
    /// per-entry TTL.
    #[builder(default, setter(strip_option))]
    time_to_live: Option<Duration>,
    /// Time-to-idle for cache entries.
    #[builder(default, setter(strip_option))]
    time_to_idle: Option<Duration>,
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        MokaUrlCache {
            cache: builder.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record(url: &str) -> UrlRecord {
        UrlRecord {
            long_url: url.to_string(),
            expires_at: None,
        }
    }

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[tokio::test]
    async fn cache_get_and_set() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");
        let record = test_record("https://example.com");

        assert!(cache.get_url(&c).await.unwrap().is_none());

        cache.set_url(&c, &record, None).await.unwrap();

        let result = cache.get_url(&c).await.unwrap();
        assert_eq!(result, Some(record));
    }

    #[tokio::test]
    async fn cache_del_removes_entry() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");
        let record = test_record("https://example.com");

        cache.set_url(&c, &record, None).await.unwrap();
        assert!(cache.get_url(&c).await.unwrap().is_some());

        cache.del(&c).await.unwrap();

        assert!(cache.get_url(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_del_is_idempotent() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");

        cache.del(&c).await.unwrap();
        assert!(cache.get_url(&c).await.unwrap().is_none());
        cache.del(&c).await.unwrap();
    }

    #[tokio::test]
    async fn per_entry_ttl_is_enforced() {
        let cache = MokaUrlCache::new();
        let c = code("abc123");
        let record = test_record("https://example.com");

        cache
            .set_url(&c, &record, Some(Duration::from_millis(30)))
            .await
            .unwrap();
        assert!(cache.get_url(&c).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(cache.get_url(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn builder_configures_the_cache() {
        let cache: MokaUrlCache = MokaUrlCache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(60))
            .build()
            .into();

        let c = code("abc123");
        let record = test_record("https://example.com");
        cache.set_url(&c, &record, None).await.unwrap();
        assert_eq!(cache.get_url(&c).await.unwrap(), Some(record));
    }
}
