//! Integration test: an authority restarted over the same datastore.

use opdir_integration_tests::{Authority, TestPki, chain};
use opdir_remote::{Directory, RecordSource};
use opdir_store::DatastoreConfig;

async fn restart_keeps_chain(config: DatastoreConfig) {
    let pki = TestPki::new();
    let alice = pki.admin("alice");

    let records = chain(&alice, 1_000, 4);
    let first = Authority::start_with(config.open().unwrap(), pki.trust.clone()).await;
    first.client().submit_records(records.clone()).await.unwrap();
    first.stop().await;

    let second = Authority::start_with(config.open().unwrap(), pki.trust.clone()).await;
    assert_eq!(second.log().chain(), records);

    let follower = second.follower(pki.trust.clone());
    assert_eq!(follower.tip().await.unwrap(), records.last().cloned());
    let entry = follower.entry("alice").await.unwrap().unwrap();
    assert_eq!(entry.records, records);
}

#[tokio::test]
async fn test_file_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    restart_keeps_chain(DatastoreConfig::File {
        path: dir.path().join("records.log"),
    })
    .await;
}
