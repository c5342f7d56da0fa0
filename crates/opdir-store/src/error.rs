//! Error types for the store crate.

/// Errors that can occur in a datastore backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored frame could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<postcard::Error> for StoreError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
