use crate::error::{Result, ShortenError};
use crate::shortener::{CreatedUrl, ExpirationPolicy, ShortenParams, Shortener};
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use url::Url;
use hoplink_core::{Clock, Repository, ShortCode, StorageError, SystemClock, UrlCache, UrlRecord};
use hoplink_generator::Generator;

/// Highest attempt counter tried before giving up on code generation.
/// Attempts run `0..=MAX_ATTEMPTS`, so a create issues at most
/// `MAX_ATTEMPTS + 1` lookups before the durable write.
const MAX_ATTEMPTS: u32 = 5;

/// A concrete implementation of the [`Shortener`] trait.
///
/// The durable store is the source of truth: code assignment reads it
/// first, but the uniqueness constraint on insert is the final arbiter
/// against concurrent writers. The cache is only warmed after a
/// successful durable write, and a cache failure never fails the create.
#[derive(Debug, Clone)]
pub struct ShortenService<R, G, C, K = SystemClock> {
    repository: Arc<R>,
    generator: Arc<G>,
    cache: Arc<C>,
    clock: Arc<K>,
}

impl<R, G, C> ShortenService<R, G, C>
where
    R: Repository,
    G: Generator,
    C: UrlCache,
{
    /// Creates a new `ShortenService` using the system clock.
    pub fn new(repository: R, generator: G, cache: C) -> Self {
        Self::with_clock(repository, generator, cache, SystemClock)
    }
}

impl<R, G, C, K> ShortenService<R, G, C, K>
where
    R: Repository,
    G: Generator,
    C: UrlCache,
    K: Clock,
{
    /// Creates a new `ShortenService` with an injected clock.
    pub fn with_clock(repository: R, generator: G, cache: C, clock: K) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            cache: Arc::new(cache),
            clock: Arc::new(clock),
        }
    }

    /// Creates a shortened URL. See [`Shortener::create`].
    pub async fn create(&self, params: ShortenParams) -> Result<CreatedUrl> {
        Shortener::create(self, params).await
    }

    fn validate_url(long_url: &str) -> Result<()> {
        if long_url.is_empty() {
            return Err(ShortenError::Validation("long url is required".to_string()));
        }
        Url::parse(long_url)
            .map_err(|e| ShortenError::Validation(format!("invalid long url: {e}")))?;
        Ok(())
    }

    /// Trims the alias and validates it; a blank alias counts as absent.
    fn normalize_alias(alias: Option<String>) -> Result<Option<ShortCode>> {
        match alias {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                Ok(Some(ShortCode::new(trimmed)?))
            }
        }
    }

    fn resolve_expiry(policy: ExpirationPolicy, now: Timestamp) -> Result<Option<Timestamp>> {
        match policy {
            ExpirationPolicy::Never => Ok(None),
            ExpirationPolicy::AfterDuration(duration) => {
                if duration.is_zero() || duration.is_negative() {
                    return Err(ShortenError::Validation(
                        "expiry must be in the future".to_string(),
                    ));
                }
                Ok(Some(now + duration))
            }
            ExpirationPolicy::AtTimestamp(at) => {
                if at <= now {
                    return Err(ShortenError::Validation(
                        "expiry must be in the future".to_string(),
                    ));
                }
                Ok(Some(at))
            }
        }
    }

    /// Alias path: the alias may be free, or already bound to the same
    /// URL (idempotent repoint). Bound to a different URL is a conflict.
    async fn assign_alias(
        &self,
        code: ShortCode,
        long_url: &str,
    ) -> Result<(ShortCode, Option<UrlRecord>)> {
        let existing = self.repository.find(&code).await?;
        if let Some(ref record) = existing {
            if record.long_url != long_url {
                debug!(code = %code, "alias already bound to a different url");
                return Err(ShortenError::Conflict(code.to_string()));
            }
        }
        Ok((code, existing))
    }

    /// Generated path: bounded retry over the attempt counter. A code is
    /// usable if it is free or already maps to the same URL.
    async fn assign_generated(&self, long_url: &str) -> Result<(ShortCode, Option<UrlRecord>)> {
        for attempt in 0..=MAX_ATTEMPTS {
            let code = self.generator.generate(long_url, attempt);
            trace!(code = %code, attempt, "trying generated code");

            match self.repository.find(&code).await? {
                None => return Ok((code, None)),
                Some(record) if record.long_url == long_url => {
                    debug!(code = %code, attempt, "generated code already maps to the same url");
                    return Ok((code, Some(record)));
                }
                Some(_) => {
                    debug!(code = %code, attempt, "generated code collides with a different url");
                }
            }
        }
        Err(ShortenError::Exhausted(MAX_ATTEMPTS + 1))
    }

    /// Writes to the source of truth and returns the effective record.
    ///
    /// A duplicate-key error on insert means a concurrent writer took the
    /// code between our read and this write; one re-read-and-compare
    /// decides between idempotent success and a conflict.
    async fn persist(
        &self,
        code: &ShortCode,
        record: UrlRecord,
        update_in_place: bool,
    ) -> Result<UrlRecord> {
        if update_in_place {
            self.repository.update(code, record.clone()).await?;
            return Ok(record);
        }

        match self.repository.insert(code, record.clone()).await {
            Ok(()) => Ok(record),
            Err(StorageError::Conflict(_)) => {
                warn!(code = %code, "duplicate key on insert, re-reading to arbitrate");
                match self.repository.find(code).await? {
                    Some(existing) if existing.long_url == record.long_url => {
                        debug!(code = %code, "concurrent create of the same mapping, treating as success");
                        Ok(existing)
                    }
                    _ => Err(ShortenError::Conflict(code.to_string())),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Best-effort cache warm-up. The create already succeeded; a cache
    /// failure only costs the fast path. The TTL is derived from the
    /// clock after the durable write, so a record that expired while
    /// being written is never cached.
    async fn warm_cache(&self, code: &ShortCode, record: &UrlRecord) {
        if let Err(e) = self.cache.store(code, record, self.clock.now()).await {
            warn!(code = %code, error = %e, "failed to warm cache, continuing without cache");
        }
    }
}

#[async_trait]
impl<R, G, C, K> Shortener for ShortenService<R, G, C, K>
where
    R: Repository,
    G: Generator,
    C: UrlCache,
    K: Clock,
{
    async fn create(&self, params: ShortenParams) -> Result<CreatedUrl> {
        let now = self.clock.now();

        // Fail fast: no store access before validation passes.
        Self::validate_url(&params.long_url)?;
        let alias = Self::normalize_alias(params.custom_alias)?;
        let expires_at = Self::resolve_expiry(params.expiration, now)?;

        let (code, existing) = match alias {
            Some(code) => self.assign_alias(code, &params.long_url).await?,
            None => self.assign_generated(&params.long_url).await?,
        };

        let record = UrlRecord {
            long_url: params.long_url,
            expires_at,
        };
        let record = self.persist(&code, record, existing.is_some()).await?;

        self.warm_cache(&code, &record).await;

        Ok(CreatedUrl {
            code,
            long_url: record.long_url,
            expires_at: record.expires_at,
        })
    }
}
