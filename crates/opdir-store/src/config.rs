//! Datastore selection from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::file::FileDatastore;
use crate::keyspace::FjallDatastore;
use crate::memory::MemoryDatastore;
use crate::traits::Datastore;

/// Which datastore backend to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatastoreConfig {
    /// Volatile, lost on restart.
    #[default]
    Memory,
    /// Single append-only file.
    File { path: PathBuf },
    /// Fjall keyspace directory.
    Fjall { path: PathBuf },
}

impl DatastoreConfig {
    /// Open and initialise the configured backend.
    pub fn open(&self) -> Result<Arc<dyn Datastore>, StoreError> {
        let store: Arc<dyn Datastore> = match self {
            Self::Memory => Arc::new(MemoryDatastore::new()),
            Self::File { path } => Arc::new(FileDatastore::new(path)),
            Self::Fjall { path } => Arc::new(FjallDatastore::open(path)?),
        };
        store.init()?;
        info!(backend = self.name(), "datastore opened");
        Ok(store)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Fjall { .. } => "fjall",
        }
    }
}
