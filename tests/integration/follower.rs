//! Integration test: a remote follower tracking an authority over HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use opdir_integration_tests::{Authority, TestPki, chain, signed};
use opdir_remote::{Directory, JsonRpcSource, RecordSource, RemoteDirectory, RemoteError};
use opdir_types::{DirectoryQuery, RecordHash, SignedChangeRecord};
use serde_json::json;

/// Submit through the follower, read back through a second follower.
#[tokio::test]
async fn test_follower_round_trip() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let authority = Authority::start(pki.trust.clone()).await;

    let writer = authority.follower(pki.trust.clone());
    let records = chain(&alice, 1_000, 3);
    writer.submit(records.clone()).await.unwrap();
    assert_eq!(authority.log().chain(), records);

    let reader = authority.follower(pki.trust.clone());
    let entry = reader.entry("alice").await.unwrap().unwrap();
    assert_eq!(entry.section("endpoint"), Some(&json!("1000-2")));
    assert_eq!(reader.tip().await.unwrap(), records.last().cloned());
    assert_eq!(reader.records().await, records);
}

/// Records appended after the first sync arrive incrementally.
#[tokio::test]
async fn test_follower_picks_up_appends() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let bob = pki.admin("bob");
    let authority = Authority::start(pki.trust.clone()).await;

    let root = signed(&alice, None, "endpoint", "a1", 1_000);
    authority.log().append(&[root.clone()]).unwrap();

    let follower = authority.follower(pki.trust.clone());
    assert_eq!(follower.entries(&DirectoryQuery::all()).await.unwrap().len(), 1);

    let next = signed(&bob, Some(root.hash), "endpoint", "b1", 1_010);
    authority.log().append(&[next.clone()]).unwrap();

    let entries = follower.entries(&DirectoryQuery::all()).await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    assert_eq!(follower.records().await, vec![root, next]);
}

/// A newer root chain on the authority replaces the follower's state.
#[tokio::test]
async fn test_follower_follows_reset() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let authority = Authority::start(pki.trust.clone()).await;

    authority.log().append(&chain(&alice, 1_000, 2)).unwrap();
    let follower = authority.follower(pki.trust.clone());
    follower.update().await.unwrap();
    assert_eq!(follower.records().await.len(), 2);

    let fresh = chain(&alice, 5_000, 1);
    authority.client().submit_records(fresh.clone()).await.unwrap();
    assert_eq!(authority.log().chain(), fresh);

    follower.update().await.unwrap();
    assert_eq!(follower.records().await, fresh);
    let entry = follower.entry("alice").await.unwrap().unwrap();
    assert_eq!(entry.section("endpoint"), Some(&json!("5000-0")));
}

/// A follower never adopts a chain older than the one it holds.
#[tokio::test]
async fn test_follower_refuses_rollback() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");

    let newer = Authority::start(pki.trust.clone()).await;
    let held = chain(&alice, 5_000, 1);
    newer.log().append(&held).unwrap();
    let older = Authority::start(pki.trust.clone()).await;
    older.log().append(&chain(&alice, 1_000, 1)).unwrap();

    // First sync from the newer authority, every later one from the older.
    let source = SwitchingSource::new(newer.client(), older.client());
    let follower = RemoteDirectory::new(Arc::new(source), pki.trust.clone(), Duration::ZERO);
    follower.update().await.unwrap();

    let err = follower.update().await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Rollback { offered: 1_000, current: 5_000 }),
        "got {err:?}"
    );
    assert_eq!(follower.records().await, held);
}

/// Queries fail when the authority is gone and nothing was ever synced.
#[tokio::test]
async fn test_unreachable_authority_is_transport_error() {
    let pki = TestPki::new();
    let authority = Authority::start(pki.trust.clone()).await;
    let follower = authority.follower(pki.trust.clone());
    authority.stop().await;

    let err = follower.entries(&DirectoryQuery::all()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)), "got {err:?}");
}

/// Serves from `first` once, then from `second`.
struct SwitchingSource {
    first: JsonRpcSource,
    second: JsonRpcSource,
    used: AtomicBool,
}

impl SwitchingSource {
    fn new(first: JsonRpcSource, second: JsonRpcSource) -> Self {
        Self {
            first,
            second,
            used: AtomicBool::new(false),
        }
    }

    fn current(&self) -> &JsonRpcSource {
        if self.used.swap(true, Ordering::SeqCst) {
            &self.second
        } else {
            &self.first
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for SwitchingSource {
    async fn get_records(
        &self,
        after: Option<RecordHash>,
    ) -> Result<Vec<SignedChangeRecord>, RemoteError> {
        self.current().get_records(after).await
    }

    async fn get_tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError> {
        self.current().get_tip().await
    }

    async fn submit_records(
        &self,
        records: Vec<SignedChangeRecord>,
    ) -> Result<(), RemoteError> {
        self.current().submit_records(records).await
    }
}
