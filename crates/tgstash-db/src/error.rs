//! Storage-specific error types.

use tgstash_common::error::StashError;
use thiserror::Error;

/// Errors raised by the key-value store and the repositories on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid list cursor")]
    InvalidCursor,

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

impl From<StoreError> for StashError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidCursor => StashError::validation("invalid cursor"),
            other => StashError::Internal(other.into()),
        }
    }
}
