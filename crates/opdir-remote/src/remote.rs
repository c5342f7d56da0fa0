//! Read-only follower of a remote authoritative log.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use opdir_log::project;
use opdir_types::{DirectoryEntry, DirectoryQuery, SignedChangeRecord, filter_entries};
use opdir_verify::{TrustStore, Verification, verify_record};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::directory::Directory;
use crate::error::RemoteError;
use crate::source::RecordSource;

/// Default cache window.
pub const DEFAULT_CACHE_FOR: Duration = Duration::from_secs(5);

/// Longest accepted cache window.
pub const MAX_CACHE_FOR: Duration = Duration::from_secs(3600);

#[derive(Default)]
struct SyncState {
    records: Vec<SignedChangeRecord>,
    entries: BTreeMap<String, DirectoryEntry>,
    last_update: Option<Instant>,
}

struct Inner {
    source: Arc<dyn RecordSource>,
    trust: TrustStore,
    cache_for: Duration,
    state: Mutex<SyncState>,
}

/// Follows a remote directory over a [`RecordSource`].
///
/// Reads are served from memory. Data older than the cache window is
/// refreshed in the background while the cached view is served; data
/// older than twice the window is refreshed before answering. Every
/// fetched record is verified before it is used.
#[derive(Clone)]
pub struct RemoteDirectory {
    inner: Arc<Inner>,
}

impl RemoteDirectory {
    /// Create a follower. `cache_for` is capped at [`MAX_CACHE_FOR`].
    pub fn new(source: Arc<dyn RecordSource>, trust: TrustStore, cache_for: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                trust,
                cache_for: cache_for.min(MAX_CACHE_FOR),
                state: Mutex::new(SyncState::default()),
            }),
        }
    }

    pub fn cache_for(&self) -> Duration {
        self.inner.cache_for
    }

    /// Fetch and integrate new records now, unless the last attempt is
    /// still inside the cache window.
    pub async fn update(&self) -> Result<(), RemoteError> {
        self.inner.refresh().await
    }

    /// The locally held chain.
    pub async fn records(&self) -> Vec<SignedChangeRecord> {
        self.inner.state.lock().await.records.clone()
    }

    async fn ensure_fresh(&self) -> Result<(), RemoteError> {
        let age = self
            .inner
            .state
            .lock()
            .await
            .last_update
            .map(|t| t.elapsed());
        let window = self.inner.cache_for;

        match age {
            Some(age) if age <= window => Ok(()),
            Some(age) if age <= window * 2 => {
                let inner = self.inner.clone();
                tokio::spawn(async move {
                    if let Err(e) = inner.refresh().await {
                        warn!(error = %e, "background directory refresh failed");
                    }
                });
                Ok(())
            }
            _ => self.inner.refresh().await,
        }
    }
}

impl Inner {
    async fn refresh(&self) -> Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        if let Some(last) = state.last_update
            && last.elapsed() < self.cache_for
        {
            return Ok(());
        }
        // Marked before fetching, so a failing source is retried at most
        // once per window.
        state.last_update = Some(Instant::now());

        let tip = state.records.last().map(|r| r.hash);
        let fetched = self.source.get_records(tip).await?;
        self.integrate(&mut state, fetched)
    }

    fn integrate(
        &self,
        state: &mut SyncState,
        fetched: Vec<SignedChangeRecord>,
    ) -> Result<(), RemoteError> {
        let Some(first) = fetched.first() else {
            return Ok(());
        };
        let tip = state.records.last().map(|r| r.hash);

        let (mut records, start) = if first.parent_hash == tip {
            let start = state.records.len();
            (state.records.clone(), start)
        } else {
            if let Some(parent) = first.parent_hash {
                return Err(RemoteError::UnexpectedParent { parent });
            }
            if let Some(current) = state.records.first()
                && first.record.created_at < current.record.created_at
            {
                return Err(RemoteError::Rollback {
                    offered: first.record.created_at,
                    current: current.record.created_at,
                });
            }
            warn!(root = %first.hash, "directory root changed, resetting");
            (Vec::new(), 0)
        };

        records.extend(fetched);
        for i in start..records.len() {
            let (preceding, rest) = records.split_at(i);
            let record = &rest[0];
            if i > 0 && record.parent_hash != Some(preceding[i - 1].hash) {
                return Err(RemoteError::BrokenLink { hash: record.hash });
            }
            if let Verification::Rejected(reason) = verify_record(record, preceding, &self.trust)? {
                return Err(RemoteError::Rejected {
                    hash: record.hash,
                    reason,
                });
            }
        }

        let added = records.len() - start;
        state.entries = project(&records);
        state.records = records;
        if added > 0 {
            info!(added, total = state.records.len(), "integrated directory records");
        } else {
            debug!("directory unchanged");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Directory for RemoteDirectory {
    async fn entries(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>, RemoteError> {
        self.ensure_fresh().await?;
        let state = self.inner.state.lock().await;
        Ok(filter_entries(state.entries.values(), query))
    }

    async fn entry(&self, name: &str) -> Result<Option<DirectoryEntry>, RemoteError> {
        self.ensure_fresh().await?;
        Ok(self.inner.state.lock().await.entries.get(name).cloned())
    }

    async fn tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError> {
        self.inner.source.get_tip().await
    }

    async fn submit(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError> {
        self.inner.source.submit_records(records).await
    }
}
