use thiserror::Error;
use hoplink_core::{CoreError, StorageError};

pub type Result<T> = std::result::Result<T, ShortenError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenError {
    /// Malformed input. Raised before any store access.
    #[error("invalid request: {0}")]
    Validation(String),
    /// The code (alias or generated) is already bound to a different URL.
    #[error("short code is already bound to a different url: {0}")]
    Conflict(String),
    /// Every generation attempt collided with a different URL.
    #[error("could not find a free short code after {0} attempts")]
    Exhausted(u32),
    /// The durable store failed; fatal to the operation.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CoreError> for ShortenError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::Validation(message),
        }
    }
}
