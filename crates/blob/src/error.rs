use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),

    /// The blob exceeds the size the store accepts.
    #[error("blob too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Maximum allowed size.
        limit: u64,
    },
}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
