use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Type alias for repository results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored URL mapping.
///
/// Serialized field names follow the cache wire format
/// (`{"longUrl": ..., "expiresAt": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    /// The original URL that was shortened.
    pub long_url: String,
    /// When the mapping expires, if ever.
    pub expires_at: Option<Timestamp>,
}

impl UrlRecord {
    /// Whether the mapping is logically dead at the given instant.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A read-only view of the durable store.
///
/// This trait provides only the read operations from [`Repository`],
/// allowing the redirector to have read-only access.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the URL record for a given short code.
    ///
    /// Returns `None` if the code does not exist. Expired records are
    /// returned as-is; expiry enforcement belongs to the caller, which
    /// must distinguish "never existed" from "existed but expired".
    async fn find(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;
}

/// The durable store contract.
///
/// The store's uniqueness constraint on the code is the single source of
/// truth: [`Repository::insert`] reports a violation as
/// [`StorageError::Conflict`], never by silently overwriting.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new URL record.
    ///
    /// Returns `Err(Conflict)` if the code already exists, including when
    /// a concurrent writer inserted it between a read and this write.
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()>;

    /// Repoints an existing record to a new URL and expiry.
    ///
    /// The code is the record's identity; `created_at` is preserved and
    /// `updated_at` is owned by the store.
    async fn update(&self, code: &ShortCode, record: UrlRecord) -> Result<()>;
}
