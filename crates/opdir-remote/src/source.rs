//! The RPC surface a follower reads from.

use opdir_log::RecordLog;
use opdir_types::{RecordHash, SignedChangeRecord};

use crate::error::RemoteError;

/// Where a follower gets authoritative records from.
///
/// Allows substituting an in-process log (or a mock) for the JSON-RPC
/// client.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Records strictly after `after`; the full chain if `after` is `None`
    /// or unknown to the source.
    async fn get_records(
        &self,
        after: Option<RecordHash>,
    ) -> Result<Vec<SignedChangeRecord>, RemoteError>;

    /// Last record of the source's authoritative chain.
    async fn get_tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError>;

    /// Append signed records to the authoritative log.
    async fn submit_records(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError>;
}

#[async_trait::async_trait]
impl RecordSource for RecordLog {
    async fn get_records(
        &self,
        after: Option<RecordHash>,
    ) -> Result<Vec<SignedChangeRecord>, RemoteError> {
        Ok(self.records(after.as_ref()))
    }

    async fn get_tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError> {
        Ok(self.tip())
    }

    async fn submit_records(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError> {
        Ok(self.append(&records)?)
    }
}
