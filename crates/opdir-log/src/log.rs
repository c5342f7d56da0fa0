//! The authoritative record log.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use opdir_store::{DataEntry, Datastore, random_id};
use opdir_types::{DirectoryEntry, DirectoryQuery, RecordHash, SignedChangeRecord, filter_entries};
use opdir_verify::{TrustStore, Verification, verify_record};
use tracing::{debug, info};

use crate::chain::RecordGraph;
use crate::error::LogError;
use crate::resolver::resolve;

type Result<T> = std::result::Result<T, LogError>;

/// Datastore entry type of a JSON-encoded [`SignedChangeRecord`].
pub const SIGNED_CHANGE_RECORD: u8 = 1;

/// Length of the random id given to each stored entry.
const ENTRY_ID_LEN: usize = 16;

#[derive(Default)]
struct LogState {
    /// Hash of every stored record, authoritative or not.
    stored: HashSet<RecordHash>,
    chain: Vec<SignedChangeRecord>,
    entries: BTreeMap<String, DirectoryEntry>,
}

/// Authoritative directory log over a shared datastore.
///
/// All state is derived: every [`update`](Self::update) re-reads the whole
/// datastore, rebuilds every chain and selects one. Appends from other
/// processes sharing the datastore are picked up on the next update.
/// One lock serializes update, append and reads on this instance.
pub struct RecordLog {
    datastore: Arc<dyn Datastore>,
    trust: TrustStore,
    state: Mutex<LogState>,
}

impl RecordLog {
    /// Initialise the datastore and derive the current state.
    pub fn open(datastore: Arc<dyn Datastore>, trust: TrustStore) -> Result<Self> {
        datastore.init()?;
        let log = Self {
            datastore,
            trust,
            state: Mutex::new(LogState::default()),
        };
        log.update()?;
        Ok(log)
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// Re-derive the authoritative chain and entries from the datastore.
    ///
    /// Idempotent: with no new writes, repeated calls yield identical state.
    pub fn update(&self) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        self.update_locked(&mut state)
    }

    fn update_locked(&self, state: &mut LogState) -> Result<()> {
        let records = self.load()?;
        state.stored = records.iter().map(|r| r.hash).collect();
        let graph = RecordGraph::build(records);
        let resolution = resolve(&graph, &self.trust);
        state.chain = resolution.chain;
        state.entries = resolution.entries;
        Ok(())
    }

    fn load(&self) -> Result<Vec<SignedChangeRecord>> {
        self.datastore
            .read()?
            .into_iter()
            .map(|entry| {
                if entry.entry_type != SIGNED_CHANGE_RECORD {
                    return Err(LogError::UnknownEntryType(entry.entry_type));
                }
                serde_json::from_slice(&entry.data)
                    .map_err(|e| LogError::MalformedRecord(e.to_string()))
            })
            .collect()
    }

    /// Append records in order.
    ///
    /// For each record: refresh state, require its parent to be the current
    /// tip (unless it is a root), verify it against the current chain,
    /// write it, refresh again and confirm it became part of the chain.
    /// Stops at the first failure; earlier records stay appended.
    pub fn append(&self, records: &[SignedChangeRecord]) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        for record in records {
            self.append_one(&mut state, record)?;
        }
        Ok(())
    }

    fn append_one(&self, state: &mut LogState, record: &SignedChangeRecord) -> Result<()> {
        self.update_locked(state)?;

        // A second copy would be dropped when the graph is rebuilt.
        if record.parent_hash == Some(record.hash) || state.stored.contains(&record.hash) {
            return Err(LogError::DuplicateRecord(record.hash));
        }

        if let Some(parent) = record.parent_hash {
            let tip = state.chain.last().map(|r| r.hash);
            if tip != Some(parent) {
                return Err(LogError::StaleAppend { parent, tip });
            }
        }

        if let Verification::Rejected(reason) = verify_record(record, &state.chain, &self.trust)? {
            return Err(LogError::Rejected {
                hash: record.hash,
                reason,
            });
        }

        let data = serde_json::to_vec(record).map_err(|e| LogError::MalformedRecord(e.to_string()))?;
        self.datastore.write(&DataEntry::new(
            SIGNED_CHANGE_RECORD,
            random_id(ENTRY_ID_LEN),
            data,
        ))?;
        debug!(hash = %record.hash, "wrote record");

        self.update_locked(state)?;
        if !state.chain.iter().any(|r| r.hash == record.hash) {
            return Err(LogError::LostAfterAppend(record.hash));
        }

        info!(
            hash = %record.hash,
            name = %record.record.name,
            section = %record.record.section,
            "appended record"
        );
        Ok(())
    }

    /// Last record of the authoritative chain.
    pub fn tip(&self) -> Option<SignedChangeRecord> {
        self.state.lock().expect("lock poisoned").chain.last().cloned()
    }

    /// Records strictly after `after`. With no `after`, or one that is not
    /// in the chain, the full chain is returned.
    pub fn records(&self, after: Option<&RecordHash>) -> Vec<SignedChangeRecord> {
        let state = self.state.lock().expect("lock poisoned");
        let start = after
            .and_then(|h| state.chain.iter().position(|r| r.hash == *h))
            .map_or(0, |p| p + 1);
        state.chain[start..].to_vec()
    }

    /// The full authoritative chain.
    pub fn chain(&self) -> Vec<SignedChangeRecord> {
        self.records(None)
    }

    /// Entries matching `query`, sorted by operator name.
    pub fn entries(&self, query: &DirectoryQuery) -> Vec<DirectoryEntry> {
        let state = self.state.lock().expect("lock poisoned");
        filter_entries(state.entries.values(), query)
    }

    pub fn entry(&self, name: &str) -> Option<DirectoryEntry> {
        self.state
            .lock()
            .expect("lock poisoned")
            .entries
            .get(name)
            .cloned()
    }
}
