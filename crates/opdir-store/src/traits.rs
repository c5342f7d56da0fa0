//! The datastore capability.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A single stored blob, tagged with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Entry type tag. The log only understands its own tags.
    pub entry_type: u8,
    /// Writer-chosen identifier.
    pub id: Vec<u8>,
    /// Opaque payload.
    pub data: Vec<u8>,
}

impl DataEntry {
    pub fn new(entry_type: u8, id: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            entry_type,
            id,
            data,
        }
    }
}

/// Append-only keyed byte storage.
///
/// Entries are never updated or removed. `read` returns every entry
/// written so far, including those written by other handles or processes
/// sharing the same backing store. All backends in this crate return
/// entries in write order; callers must not depend on it for correctness.
pub trait Datastore: Send + Sync {
    /// Prepare the backing store. Safe to call more than once.
    fn init(&self) -> Result<(), StoreError>;

    /// Durably append an entry.
    fn write(&self, entry: &DataEntry) -> Result<(), StoreError>;

    /// Read back all entries.
    fn read(&self) -> Result<Vec<DataEntry>, StoreError>;
}
