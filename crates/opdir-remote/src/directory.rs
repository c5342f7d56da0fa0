//! The read/submit surface shared by the authoritative log and followers.

use opdir_log::RecordLog;
use opdir_types::{DirectoryEntry, DirectoryQuery, SignedChangeRecord};

use crate::error::RemoteError;

/// A queryable operator directory.
#[async_trait::async_trait]
pub trait Directory: Send + Sync {
    /// Entries matching `query`, sorted by operator name.
    async fn entries(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>, RemoteError>;

    async fn entry(&self, name: &str) -> Result<Option<DirectoryEntry>, RemoteError>;

    /// Last authoritative record.
    async fn tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError>;

    /// Submit signed records for appending.
    async fn submit(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError>;
}

#[async_trait::async_trait]
impl Directory for RecordLog {
    async fn entries(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>, RemoteError> {
        Ok(RecordLog::entries(self, query))
    }

    async fn entry(&self, name: &str) -> Result<Option<DirectoryEntry>, RemoteError> {
        Ok(RecordLog::entry(self, name))
    }

    async fn tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError> {
        Ok(RecordLog::tip(self))
    }

    async fn submit(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError> {
        Ok(self.append(&records)?)
    }
}
