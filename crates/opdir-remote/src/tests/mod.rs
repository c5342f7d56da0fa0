//! Tests for the remote crate.


use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use opdir_types::{ChangeRecord, RecordHash, SignedChangeRecord};
use opdir_verify::{ADMIN_GROUP, SigningIdentity, TrustStore};
use serde_json::json;

use crate::error::RemoteError;
use crate::source::RecordSource;

const NOT_AFTER: u64 = 4_000_000_000_000;

fn test_identity() -> (TrustStore, SigningIdentity) {
    let ca = SigningIdentity::self_signed_ca("root", Vec::<String>::new(), 0, NOT_AFTER).unwrap();
    let admin = ca.issue("alice", [ADMIN_GROUP], false, 0, NOT_AFTER).unwrap();
    (TrustStore::with_root(ca.certificate().clone()), admin)
}

fn signed(
    id: &SigningIdentity,
    parent: Option<RecordHash>,
    value: &str,
    created_at: u64,
) -> SignedChangeRecord {
    id.sign_record(
        parent,
        ChangeRecord::at("alice", "endpoint", json!({ "addr": value }), created_at),
    )
    .unwrap()
}

/// A linear chain of `n` records rooted at `root_time`.
fn chain(id: &SigningIdentity, root_time: u64, n: usize) -> Vec<SignedChangeRecord> {
    let mut out: Vec<SignedChangeRecord> = Vec::new();
    for i in 0..n {
        let parent = out.last().map(|r| r.hash);
        out.push(signed(id, parent, &format!("{root_time}-{i}"), root_time + i as u64));
    }
    out
}

/// Serves a fixed chain with the same `after` semantics as the log.
#[derive(Default)]
struct MockSource {
    chain: Mutex<Vec<SignedChangeRecord>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockSource {
    fn with_chain(chain: Vec<SignedChangeRecord>) -> Self {
        let source = Self::default();
        source.set_chain(chain);
        source
    }

    fn set_chain(&self, chain: Vec<SignedChangeRecord>) {
        *self.chain.lock().unwrap() = chain;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl RecordSource for MockSource {
    async fn get_records(
        &self,
        after: Option<RecordHash>,
    ) -> Result<Vec<SignedChangeRecord>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection refused".into()));
        }
        let chain = self.chain.lock().unwrap();
        let start = after
            .and_then(|h| chain.iter().position(|r| r.hash == h))
            .map_or(0, |p| p + 1);
        Ok(chain[start..].to_vec())
    }

    async fn get_tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError> {
        Ok(self.chain.lock().unwrap().last().cloned())
    }

    async fn submit_records(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError> {
        self.chain.lock().unwrap().extend(records);
        Ok(())
    }
}
