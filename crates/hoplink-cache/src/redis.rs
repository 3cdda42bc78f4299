use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};
use hoplink_core::cache::Result;
use hoplink_core::{CacheError, ShortCode, UrlCache, UrlRecord};

/// A Redis-based implementation of [`UrlCache`].
///
/// Records are stored as JSON strings (`{"longUrl": ..., "expiresAt": ...}`)
/// under a configurable key prefix, with the TTL applied via `SET EX`.
#[derive(Debug, Clone)]
pub struct RedisUrlCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

impl RedisUrlCache {
    /// Creates a Redis URL cache from an existing multiplexed connection.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: "url:".to_string(),
        }
    }

    /// Creates a Redis URL cache by opening a new connection.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Initialization(e.to_string()))?;
        Ok(Self::new(conn))
    }

    /// Creates a Redis URL cache with a custom key prefix.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Generates the cache key for a short code.
    fn cache_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_timeout() {
        CacheError::Timeout(err.to_string())
    } else if err.is_io_error() || err.is_connection_refusal() {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Operation(err.to_string())
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let key = self.cache_key(code);
        trace!(code = %code, "fetching URL record from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<UrlRecord>(&cached) {
                Ok(record) => {
                    debug!(code = %code, "cache hit in Redis");
                    Ok(Some(record))
                }
                Err(e) => {
                    // An undecodable entry is a miss, not an error: the
                    // durable store can always rebuild it.
                    warn!(code = %code, error = %e, "failed to deserialize cached record, treating as miss");
                    Ok(None)
                }
            },
            Ok(None) => {
                trace!(code = %code, "cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(code = %code, error = %e, "Redis error on get");
                Err(map_redis_error(e))
            }
        }
    }

    async fn set_url(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = self.cache_key(code);
        trace!(code = %code, ttl = ?ttl, "storing URL record in Redis cache");

        let json = serde_json::to_string(record)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        let result = if let Some(ttl) = ttl {
            conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs()).await
        } else {
            conn.set::<_, _, ()>(&key, json).await
        };

        match result {
            Ok(()) => {
                debug!(code = %code, "cached record in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(code = %code, error = %e, "failed to cache record in Redis");
                Err(map_redis_error(e))
            }
        }
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        let key = self.cache_key(code);
        trace!(code = %code, "removing URL record from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&key).await {
            Ok(()) => {
                debug!(code = %code, "removed record from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(code = %code, error = %e, "failed to remove record from Redis cache");
                Err(map_redis_error(e))
            }
        }
    }
}

// Tests that require a running Redis instance belong in an integration
// suite; the contract itself is exercised against MokaUrlCache and the
// recording doubles in the service crates.
