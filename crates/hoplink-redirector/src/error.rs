use thiserror::Error;
use hoplink_core::StorageError;

pub type Result<T> = std::result::Result<T, RedirectError>;

/// Failures that abort a resolve.
///
/// Cache failures never appear here: they are degraded to a store-only
/// lookup at the point of use.
#[derive(Debug, Clone, Error)]
pub enum RedirectError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
