//! Error and outcome types for record verification.

use opdir_types::{Fingerprint, RecordHash, TypesError};

/// Structural failures. These are never a plain "not authorized" answer:
/// the input itself is broken or could not be processed.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The stored hash does not match the recomputed record hash.
    #[error("invalid hash value: stored {stored}, computed {computed}")]
    HashMismatch {
        stored: RecordHash,
        computed: RecordHash,
    },

    /// A certificate carries key material that cannot be decoded.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A signing key does not belong to its certificate.
    #[error("invalid signing identity: {0}")]
    InvalidIdentity(String),

    /// Canonical encoding failed.
    #[error(transparent)]
    Types(#[from] TypesError),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for VerifyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Why a structurally sound record was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("record is not signed")]
    Unsigned,

    #[error("signer {subject} is not a member of sd-admin")]
    NotAdmin { subject: String },

    #[error("certificate fingerprint {actual} does not match pinned {pinned}")]
    FingerprintMismatch {
        pinned: Fingerprint,
        actual: Fingerprint,
    },

    #[error("certificate of {subject} does not chain to a trusted root")]
    UntrustedCertificate { subject: String },

    #[error("signature does not verify")]
    BadSignature,

    #[error("certificate is issued to {actual}, expected {expected}")]
    SubjectMismatch { expected: String, actual: String },
}

/// Outcome of verifying a record: valid, or a negative answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Rejected(Rejection),
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The rejection reason, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Valid => None,
            Self::Rejected(r) => Some(r),
        }
    }
}

impl From<Rejection> for Verification {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}
