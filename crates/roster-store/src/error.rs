/// Errors from local slot operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be used as a slot name.
    #[error("invalid slot key: {0:?}")]
    InvalidKey(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for slot operations.
pub type StoreResult<T> = Result<T, StoreError>;
