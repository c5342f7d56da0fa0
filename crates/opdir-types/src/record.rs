//! Change records and their signed, hash-linked envelope.

use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::error::TypesError;
use crate::{RecordHash, SignatureBytes, now_millis};

/// A single proposed mutation to one section of an operator's entry.
///
/// Immutable once hashed: the hash of the enclosing [`SignedChangeRecord`]
/// covers every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Operator the record applies to.
    pub name: String,
    /// Section of the operator's entry being replaced.
    pub section: String,
    /// Opaque JSON payload for the section.
    pub data: serde_json::Value,
    /// Creation time, Unix milliseconds.
    pub created_at: u64,
}

impl ChangeRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        section: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self::at(name, section, data, now_millis())
    }

    /// Create a record with an explicit creation time.
    pub fn at(
        name: impl Into<String>,
        section: impl Into<String>,
        data: serde_json::Value,
        created_at: u64,
    ) -> Self {
        Self {
            name: name.into(),
            section: section.into(),
            data,
            created_at,
        }
    }

    /// Compute the content hash: blake3 over the canonical postcard encoding.
    ///
    /// JSON objects inside `data` are key-sorted by `serde_json`, so the
    /// hash survives a JSON round trip.
    pub fn compute_hash(&self) -> Result<RecordHash, TypesError> {
        let bytes = postcard::to_allocvec(self)?;
        Ok(RecordHash::from_data(&bytes))
    }
}

/// Signature attached to a record: the signer's certificate plus the
/// ed25519 signature over the record's signable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSignature {
    /// Certificate of the signing operator.
    pub certificate: Certificate,
    /// ed25519 signature bytes.
    pub signature: SignatureBytes,
}

/// A change record linked into the directory log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedChangeRecord {
    /// Hash of the preceding record, `None` for a root record.
    #[serde(default)]
    pub parent_hash: Option<RecordHash>,
    /// The change itself.
    pub record: ChangeRecord,
    /// Hash of `record` (only the record, not the parent link).
    pub hash: RecordHash,
    /// Signature over parent link, record and hash.
    #[serde(default)]
    pub signature: Option<RecordSignature>,
}

impl SignedChangeRecord {
    /// Wrap a record, computing its hash. The result is not yet signed.
    pub fn unsigned(
        parent_hash: Option<RecordHash>,
        record: ChangeRecord,
    ) -> Result<Self, TypesError> {
        let hash = record.compute_hash()?;
        Ok(Self {
            parent_hash,
            record,
            hash,
            signature: None,
        })
    }

    /// Whether this record starts a new chain.
    pub fn is_root(&self) -> bool {
        self.parent_hash.is_none()
    }
}
