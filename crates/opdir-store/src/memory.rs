//! In-memory datastore.

use std::sync::RwLock;

use crate::error::StoreError;
use crate::traits::{DataEntry, Datastore};

/// Volatile datastore. Clone the `Arc` around it to share one store between
/// several logs.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entries: RwLock<Vec<DataEntry>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Datastore for MemoryDatastore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn write(&self, entry: &DataEntry) -> Result<(), StoreError> {
        self.entries
            .write()
            .expect("lock poisoned")
            .push(entry.clone());
        Ok(())
    }

    fn read(&self) -> Result<Vec<DataEntry>, StoreError> {
        Ok(self.entries.read().expect("lock poisoned").clone())
    }
}
