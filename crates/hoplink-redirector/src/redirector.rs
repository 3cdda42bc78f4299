use crate::error::Result;
use async_trait::async_trait;
use hoplink_core::UrlRecord;

/// Outcome of resolving a short code.
///
/// "Never existed" and "existed but expired" are distinct so the caller
/// can present different responses (e.g. 404 vs 410).
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A live mapping; redirect to its URL.
    Found(UrlRecord),
    /// Degenerate input (empty, or a static-asset-looking path); the
    /// caller should handle it, this is not an error.
    NotApplicable,
    /// No mapping exists for this code.
    NotFound,
    /// A mapping existed but its expiry has passed.
    Expired,
}

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its stored URL record.
    async fn resolve(&self, code: &str) -> Result<Resolution>;
}
