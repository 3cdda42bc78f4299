use crate::error::Result;
use crate::redirector::{Redirector, Resolution};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use hoplink_core::{Clock, ReadRepository, ShortCode, SystemClock, UrlCache, UrlRecord};

/// Service for handling URL redirects.
///
/// Reads go cache-first with a durable-store fallback. The store is the
/// authority on existence and expiry; the cache is a disposable fast
/// path whose failures are logged and swallowed.
#[derive(Debug, Clone)]
pub struct RedirectService<R, C, K = SystemClock> {
    repository: Arc<R>,
    cache: Arc<C>,
    clock: Arc<K>,
}

impl<R, C> RedirectService<R, C>
where
    R: ReadRepository,
    C: UrlCache,
{
    /// Creates a new `RedirectService` using the system clock.
    pub fn new(repository: R, cache: C) -> Self {
        Self::with_clock(repository, cache, SystemClock)
    }
}

impl<R, C, K> RedirectService<R, C, K>
where
    R: ReadRepository,
    C: UrlCache,
    K: Clock,
{
    /// Creates a new `RedirectService` with an injected clock.
    pub fn with_clock(repository: R, cache: C, clock: K) -> Self {
        Self {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
            clock: Arc::new(clock),
        }
    }

    /// Resolves a short code. See [`Redirector::resolve`].
    pub async fn resolve(&self, code: &str) -> Result<Resolution> {
        Redirector::resolve(self, code).await
    }

    /// Checks the cache. An expired hit is evicted and terminal; a
    /// decode failure or cache error degrades to a miss.
    async fn resolve_from_cache(&self, code: &ShortCode) -> Option<Resolution> {
        match self.cache.get_url(code).await {
            Ok(Some(record)) => {
                if record.is_expired(self.clock.now()) {
                    debug!(code = %code, "cached mapping has expired, evicting");
                    if let Err(e) = self.cache.del(code).await {
                        warn!(code = %code, error = %e, "failed to evict expired cache entry");
                    }
                    return Some(Resolution::Expired);
                }
                debug!(code = %code, url = %record.long_url, "resolved from cache");
                Some(Resolution::Found(record))
            }
            Ok(None) => {
                trace!(code = %code, "cache miss");
                None
            }
            Err(e) => {
                warn!(code = %code, error = %e, "cache unavailable, falling back to store");
                None
            }
        }
    }

    /// Best-effort cache population after a live store read.
    async fn populate_cache(&self, code: &ShortCode, record: &UrlRecord) {
        if let Err(e) = self.cache.store(code, record, self.clock.now()).await {
            warn!(code = %code, error = %e, "failed to populate cache, continuing");
        }
    }
}

#[async_trait]
impl<R, C, K> Redirector for RedirectService<R, C, K>
where
    R: ReadRepository,
    C: UrlCache,
    K: Clock,
{
    async fn resolve(&self, code: &str) -> Result<Resolution> {
        // Empty codes and dotted paths (favicon.ico and friends) belong
        // to whoever serves static assets.
        if code.is_empty() || code.contains('.') {
            trace!(code = %code, "not a short code, deferring to caller");
            return Ok(Resolution::NotApplicable);
        }

        let code = ShortCode::new_unchecked(code);
        trace!(code = %code, "resolving short code");

        if let Some(resolution) = self.resolve_from_cache(&code).await {
            return Ok(resolution);
        }

        match self.repository.find(&code).await? {
            None => {
                trace!(code = %code, "short code not found");
                Ok(Resolution::NotFound)
            }
            Some(record) if record.is_expired(self.clock.now()) => {
                debug!(code = %code, "mapping has expired");
                Ok(Resolution::Expired)
            }
            Some(record) => {
                debug!(code = %code, url = %record.long_url, "resolved from store");
                self.populate_cache(&code, &record).await;
                Ok(Resolution::Found(record))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use hoplink_cache::MokaUrlCache;
    use hoplink_core::cache;
    use hoplink_core::repository::{Repository, Result as RepoResult};
    use hoplink_core::{CacheError, ManualClock, StorageError};
    use hoplink_storage::InMemoryRepository;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn record(url: &str, expires_at: Option<Timestamp>) -> UrlRecord {
        UrlRecord {
            long_url: url.to_string(),
            expires_at,
        }
    }

    async fn setup_with_record(
        c: &ShortCode,
        rec: UrlRecord,
    ) -> RedirectService<InMemoryRepository, MokaUrlCache> {
        let repo = InMemoryRepository::new();
        repo.insert(c, rec).await.unwrap();
        RedirectService::new(repo, MokaUrlCache::new())
    }

    #[tokio::test]
    async fn resolve_existing_code() {
        let c = code("abc123");
        let service = setup_with_record(&c, record("https://example.com", None)).await;

        let result = service.resolve("abc123").await.unwrap();
        assert_eq!(result, Resolution::Found(record("https://example.com", None)));
    }

    #[tokio::test]
    async fn resolve_nonexistent_code() {
        let service = RedirectService::new(InMemoryRepository::new(), MokaUrlCache::new());

        let result = service.resolve("nope123").await.unwrap();
        assert_eq!(result, Resolution::NotFound);
    }

    #[tokio::test]
    async fn degenerate_input_is_deferred_without_io() {
        let repo = CountingRepository::new(InMemoryRepository::new());
        let service = RedirectService::new(repo, MokaUrlCache::new());

        assert_eq!(service.resolve("").await.unwrap(), Resolution::NotApplicable);
        assert_eq!(
            service.resolve("favicon.ico").await.unwrap(),
            Resolution::NotApplicable
        );
        assert_eq!(service.repository.finds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_record_in_store() {
        let clock = ManualClock::new(Timestamp::from_second(1_000).unwrap());
        let repo = InMemoryRepository::new();
        let c = code("gone123");
        repo.insert(
            &c,
            record(
                "https://example.com",
                Some(clock.now() + SignedDuration::from_secs(1)),
            ),
        )
        .await
        .unwrap();
        let service = RedirectService::with_clock(repo, MokaUrlCache::new(), clock.clone());

        clock.advance(SignedDuration::from_secs(2));

        assert_eq!(service.resolve("gone123").await.unwrap(), Resolution::Expired);
        // An expired mapping is never written back to the cache.
        assert!(service.cache.get_url(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn not_yet_expired_record_resolves() {
        let clock = ManualClock::new(Timestamp::from_second(1_000).unwrap());
        let repo = InMemoryRepository::new();
        let expires = clock.now() + SignedDuration::from_secs(3_600);
        repo.insert(&code("live123"), record("https://example.com", Some(expires)))
            .await
            .unwrap();
        let service = RedirectService::with_clock(repo, MokaUrlCache::new(), clock);

        let result = service.resolve("live123").await.unwrap();
        assert_eq!(
            result,
            Resolution::Found(record("https://example.com", Some(expires)))
        );
    }

    /// Counts reads against the inner repository.
    struct CountingRepository {
        inner: InMemoryRepository,
        finds: AtomicUsize,
    }

    impl CountingRepository {
        fn new(inner: InMemoryRepository) -> Self {
            Self {
                inner,
                finds: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReadRepository for CountingRepository {
        async fn find(&self, c: &ShortCode) -> RepoResult<Option<UrlRecord>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find(c).await
        }
    }

    /// Records cache traffic while delegating to a real in-memory cache.
    struct RecordingCache {
        inner: MokaUrlCache,
        sets: AtomicUsize,
        dels: AtomicUsize,
    }

    impl RecordingCache {
        fn new() -> Self {
            Self {
                inner: MokaUrlCache::new(),
                sets: AtomicUsize::new(0),
                dels: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UrlCache for RecordingCache {
        async fn get_url(&self, c: &ShortCode) -> cache::Result<Option<UrlRecord>> {
            self.inner.get_url(c).await
        }

        async fn set_url(
            &self,
            c: &ShortCode,
            rec: &UrlRecord,
            ttl: Option<Duration>,
        ) -> cache::Result<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set_url(c, rec, ttl).await
        }

        async fn del(&self, c: &ShortCode) -> cache::Result<()> {
            self.dels.fetch_add(1, Ordering::SeqCst);
            self.inner.del(c).await
        }
    }

    #[tokio::test]
    async fn cache_miss_populates_and_next_resolve_hits_cache() {
        let repo = CountingRepository::new(InMemoryRepository::new());
        repo.inner
            .insert(&code("abc123"), record("https://example.com", None))
            .await
            .unwrap();
        let service = RedirectService::new(repo, RecordingCache::new());

        let first = service.resolve("abc123").await.unwrap();
        assert!(matches!(first, Resolution::Found(_)));
        assert_eq!(service.cache.sets.load(Ordering::SeqCst), 1);
        assert_eq!(service.repository.finds.load(Ordering::SeqCst), 1);

        // Second resolve is served from the cache, no store read.
        let second = service.resolve("abc123").await.unwrap();
        assert!(matches!(second, Resolution::Found(_)));
        assert_eq!(service.repository.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cache_hit_is_evicted_without_a_store_read() {
        let clock = ManualClock::new(Timestamp::from_second(1_000).unwrap());
        let cache = RecordingCache::new();
        let stale = record(
            "https://example.com",
            Some(clock.now() - SignedDuration::from_secs(1)),
        );
        cache.set_url(&code("stale12"), &stale, None).await.unwrap();

        let repo = CountingRepository::new(InMemoryRepository::new());
        let service = RedirectService::with_clock(repo, cache, clock);

        let result = service.resolve("stale12").await.unwrap();
        assert_eq!(result, Resolution::Expired);
        assert_eq!(service.cache.dels.load(Ordering::SeqCst), 1);
        assert_eq!(service.repository.finds.load(Ordering::SeqCst), 0);
    }

    /// A cache that fails every operation.
    struct BrokenCache;

    #[async_trait]
    impl UrlCache for BrokenCache {
        async fn get_url(&self, _c: &ShortCode) -> cache::Result<Option<UrlRecord>> {
            Err(CacheError::Unavailable("down".to_string()))
        }

        async fn set_url(
            &self,
            _c: &ShortCode,
            _rec: &UrlRecord,
            _ttl: Option<Duration>,
        ) -> cache::Result<()> {
            Err(CacheError::Unavailable("down".to_string()))
        }

        async fn del(&self, _c: &ShortCode) -> cache::Result<()> {
            Err(CacheError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn cache_unavailability_degrades_to_store_only() {
        let repo = InMemoryRepository::new();
        repo.insert(&code("abc123"), record("https://example.com", None))
            .await
            .unwrap();
        let service = RedirectService::new(repo, BrokenCache);

        let result = service.resolve("abc123").await.unwrap();
        assert_eq!(result, Resolution::Found(record("https://example.com", None)));
    }

    /// A store that is down.
    struct BrokenRepository;

    #[async_trait]
    impl ReadRepository for BrokenRepository {
        async fn find(&self, _c: &ShortCode) -> RepoResult<Option<UrlRecord>> {
            Err(StorageError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn store_unavailability_fails_the_resolve() {
        let service = RedirectService::new(BrokenRepository, MokaUrlCache::new());

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(
            err,
            crate::RedirectError::Storage(StorageError::Unavailable(_))
        ));
    }
}
