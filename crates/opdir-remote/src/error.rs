//! Error types for the remote crate.

use opdir_log::LogError;
use opdir_types::RecordHash;
use opdir_verify::{Rejection, VerifyError};

use crate::wire::CONFLICT;

/// Errors from a record source or the remote follower.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request failed or the response was not JSON-RPC.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a JSON-RPC error.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A fetched record is structurally broken.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// A fetched record failed verification.
    #[error("cannot verify directory record {hash}: {reason}")]
    Rejected { hash: RecordHash, reason: Rejection },

    /// The first fetched record neither extends the local tip nor starts
    /// a new chain.
    #[error("expected a new root record but got one with parent {parent}")]
    UnexpectedParent { parent: RecordHash },

    /// Fetched records are not hash-linked to each other.
    #[error("record {hash} does not link to its predecessor")]
    BrokenLink { hash: RecordHash },

    /// The server offered a chain whose root is older than ours.
    #[error("server tried to provide an outdated directory (root {offered} < {current})")]
    Rollback { offered: u64, current: u64 },

    /// The local log refused the operation.
    #[error(transparent)]
    Log(#[from] LogError),

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RemoteError {
    /// Whether the failure came from a concurrent writer and a retry
    /// against a fresh tip may succeed.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Log(e) => e.is_conflict(),
            Self::Rpc { code, .. } => *code == CONFLICT,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
