use crate::error::CacheError;
use crate::repository::UrlRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use std::time::Duration;

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// The TTL to apply when projecting a record into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTtl {
    /// No expiry on the mapping: cache until evicted or overwritten.
    Unbounded,
    /// Cache for the remaining lifetime of the mapping.
    Bounded(Duration),
    /// The mapping is already expired: do not cache at all, a stale
    /// entry would resurrect a dead mapping.
    Skip,
}

/// Derives the cache TTL from a mapping's expiry.
///
/// The remaining lifetime is rounded up to whole seconds so an entry
/// never outlives its mapping by less than it undershoots it.
pub fn cache_ttl(expires_at: Option<Timestamp>, now: Timestamp) -> CacheTtl {
    let Some(expires_at) = expires_at else {
        return CacheTtl::Unbounded;
    };
    let remaining = expires_at.duration_since(now);
    if remaining.is_zero() || remaining.is_negative() {
        return CacheTtl::Skip;
    }
    // remaining is positive here, so the unsigned cast is exact
    let secs = (remaining.as_millis() as u64).div_ceil(1_000);
    CacheTtl::Bounded(Duration::from_secs(secs))
}

/// A TTL key-value cache for URL records.
///
/// Entries are a disposable projection of the durable store: they may be
/// evicted or lost at any time without violating correctness, and an
/// undecodable entry is reported as a miss rather than an error.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get URL record from cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Store URL record in cache with an optional TTL.
    ///
    /// If `ttl` is `None`, the entry may persist indefinitely or use
    /// a default expiration policy depending on the implementation.
    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()>;

    /// Remove URL record from cache.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;

    /// Store a record with the TTL derived from its expiry.
    ///
    /// Already-expired records are silently skipped.
    async fn store(&self, code: &ShortCode, record: &UrlRecord, now: Timestamp) -> Result<()> {
        match cache_ttl(record.expires_at, now) {
            CacheTtl::Unbounded => self.set_url(code, record, None).await,
            CacheTtl::Bounded(ttl) => self.set_url(code, record, Some(ttl)).await,
            CacheTtl::Skip => Ok(()),
        }
    }
}
