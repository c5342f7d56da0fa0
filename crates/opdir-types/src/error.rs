//! Error types for the types crate.

/// Errors produced while encoding or parsing directory types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// A hex-encoded identifier could not be parsed.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Canonical (postcard) encoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<postcard::Error> for TypesError {
    fn from(e: postcard::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}
