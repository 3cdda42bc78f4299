use crate::error::Result;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use hoplink_core::ShortCode;

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    Never,
    /// The shortened URL expires after a certain duration from now.
    AfterDuration(SignedDuration),
    /// The shortened URL expires at a specific timestamp.
    AtTimestamp(Timestamp),
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub long_url: String,
    /// Optional caller-chosen code. Leading/trailing whitespace is
    /// trimmed; a blank alias is treated as absent.
    pub custom_alias: Option<String>,
    /// The expiration policy for the shortened URL.
    pub expiration: ExpirationPolicy,
}

impl ShortenParams {
    /// Convenience constructor for a never-expiring, auto-coded URL.
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            custom_alias: None,
            expiration: ExpirationPolicy::Never,
        }
    }
}

/// The persisted mapping as returned to the caller.
///
/// On an idempotent match (alias re-submission or a concurrent create of
/// the same mapping) this reflects the record that won, which may differ
/// from the request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedUrl {
    pub code: ShortCode,
    pub long_url: String,
    pub expires_at: Option<Timestamp>,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates (or idempotently re-creates) a shortened URL.
    async fn create(&self, params: ShortenParams) -> Result<CreatedUrl>;
}
