//! Error types for the counter store.

use thiserror::Error;

/// Result type alias for counter store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to connect to counter store: {0}")]
    Connect(String),

    #[error("counter store command failed: {0}")]
    Command(String),
}
