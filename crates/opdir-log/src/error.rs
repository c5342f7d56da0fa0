//! Error types for the log crate.

use opdir_store::StoreError;
use opdir_types::RecordHash;
use opdir_verify::{Rejection, VerifyError};

/// Errors that can occur during log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Datastore failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Structural verification failure (hash mismatch, bad certificate).
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// The datastore holds an entry type the log does not understand.
    #[error("unknown entry type: {0}")]
    UnknownEntryType(u8),

    /// A stored record could not be decoded.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The record was not signed by an authorized, trusted operator.
    #[error("record {hash} rejected: {reason}")]
    Rejected { hash: RecordHash, reason: Rejection },

    /// A record with the same hash is already stored, or the record names
    /// itself as parent.
    #[error("record {0} is already stored")]
    DuplicateRecord(RecordHash),

    /// The record's parent is not the current tip.
    #[error("stale append: parent {parent} is not the current tip {}", display_tip(.tip))]
    StaleAppend {
        parent: RecordHash,
        tip: Option<RecordHash>,
    },

    /// The record was written but lost fork resolution.
    #[error("new record {0} not found in the authoritative chain")]
    LostAfterAppend(RecordHash),
}

impl LogError {
    /// Whether this error is the result of a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StaleAppend { .. } | Self::LostAfterAppend(_))
    }
}

fn display_tip(tip: &Option<RecordHash>) -> String {
    tip.map_or_else(|| "(none)".to_string(), |t| t.to_string())
}
