//! Fjall-backed datastore.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use fjall::{Database, Keyspace, KeyspaceCreateOptions};

use crate::error::StoreError;
use crate::traits::{DataEntry, Datastore};

fn storage_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(e.to_string())
}

/// Datastore persisted in a fjall keyspace.
///
/// Keys are `sequence (BE u64) ‖ id`. The sequence resumes after the
/// highest stored key on open, so a key scan yields entries in write order
/// across restarts.
pub struct FjallDatastore {
    #[allow(dead_code)]
    db: Database,
    entries: Keyspace,
    seq: AtomicU64,
}

impl FjallDatastore {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::builder(path).open().map_err(storage_err)?;
        Self::from_db(db)
    }

    fn from_db(db: Database) -> Result<Self, StoreError> {
        let entries = db
            .keyspace("directory_entries", KeyspaceCreateOptions::default)
            .map_err(storage_err)?;
        let next = match entries.last_key_value() {
            Some(guard) => {
                let key = guard.key().map_err(storage_err)?;
                let seq: [u8; 8] = key
                    .get(..8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| storage_err("entry key shorter than its sequence"))?;
                u64::from_be_bytes(seq) + 1
            }
            None => 0,
        };
        Ok(Self {
            db,
            entries,
            seq: AtomicU64::new(next),
        })
    }

    fn next_key(&self, id: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(8 + id.len());
        key.extend_from_slice(&self.seq.fetch_add(1, Ordering::Relaxed).to_be_bytes());
        key.extend_from_slice(id);
        key
    }
}

impl Datastore for FjallDatastore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn write(&self, entry: &DataEntry) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(entry)?;
        self.entries
            .insert(self.next_key(&entry.id), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    fn read(&self) -> Result<Vec<DataEntry>, StoreError> {
        let mut out = Vec::new();
        for guard in self.entries.iter() {
            let (_, value) = guard.into_inner().map_err(storage_err)?;
            out.push(postcard::from_bytes(&value)?);
        }
        Ok(out)
    }
}
