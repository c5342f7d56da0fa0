//! Integration test: submitting records to an authority over JSON-RPC.

use opdir_integration_tests::{Authority, TestPki, chain, signed};
use opdir_remote::wire::REJECTED;
use opdir_remote::{RecordSource, RemoteError};
use opdir_types::{ChangeRecord, KEY_USAGE_SIGNING, OperatorCertificate, SECTION_CERTIFICATES};
use serde_json::json;

/// Appending onto anything but the tip is a conflict the client can retry.
#[tokio::test]
async fn test_stale_parent_is_conflict() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let authority = Authority::start(pki.trust.clone()).await;
    let client = authority.client();

    let records = chain(&alice, 1_000, 2);
    client.submit_records(records.clone()).await.unwrap();

    let stale = signed(&alice, Some(records[0].hash), "endpoint", "late", 1_100);
    let err = client.submit_records(vec![stale]).await.unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");

    // Retrying against the fresh tip succeeds.
    let tip = client.get_tip().await.unwrap().unwrap();
    let retry = signed(&alice, Some(tip.hash), "endpoint", "late", 1_100);
    client.submit_records(vec![retry.clone()]).await.unwrap();
    assert_eq!(authority.log().tip(), Some(retry));
}

/// Signers outside `sd-admin` are refused and nothing is stored.
#[tokio::test]
async fn test_non_admin_is_rejected() {
    let pki = TestPki::new();
    let mallory = pki.member("mallory");
    let authority = Authority::start(pki.trust.clone()).await;

    let record = signed(&mallory, None, "endpoint", "evil", 1_000);
    let err = authority.client().submit_records(vec![record]).await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Rpc { code, .. } if code == REJECTED),
        "got {err:?}"
    );
    assert!(authority.log().tip().is_none());
}

/// Once an operator pins a signing key, a different CA-issued key for the
/// same name cannot write.
#[tokio::test]
async fn test_pinned_key_blocks_replacement() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let impostor = pki.admin("alice");
    let authority = Authority::start(pki.trust.clone()).await;
    let client = authority.client();

    let pinned = vec![OperatorCertificate {
        fingerprint: alice.certificate().fingerprint().unwrap(),
        key_usage: KEY_USAGE_SIGNING.to_string(),
    }];
    let pin = alice
        .sign_record(
            None,
            ChangeRecord::at("alice", SECTION_CERTIFICATES, json!(pinned), 1_000),
        )
        .unwrap();
    client.submit_records(vec![pin.clone()]).await.unwrap();

    let forged = signed(&impostor, Some(pin.hash), "endpoint", "hijack", 1_010);
    let err = client.submit_records(vec![forged]).await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Rpc { code, .. } if code == REJECTED),
        "got {err:?}"
    );

    let genuine = signed(&alice, Some(pin.hash), "endpoint", "10.0.0.1", 1_010);
    client.submit_records(vec![genuine]).await.unwrap();
    let entry = authority.log().entry("alice").unwrap();
    assert_eq!(entry.section("endpoint"), Some(&json!("10.0.0.1")));
}

/// Concurrent writers racing on the same parent: exactly one wins.
#[tokio::test]
async fn test_concurrent_submissions_one_wins() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let authority = Authority::start(pki.trust.clone()).await;

    let root = signed(&alice, None, "endpoint", "root", 1_000);
    authority.client().submit_records(vec![root.clone()]).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8u64 {
        let client = authority.client();
        let record = signed(&alice, Some(root.hash), "endpoint", &format!("w{i}"), 1_001 + i);
        tasks.push(tokio::spawn(async move {
            client.submit_records(vec![record]).await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => accepted += 1,
            Err(e) => assert!(e.is_conflict(), "got {e:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(authority.log().chain().len(), 2);
}

/// Structurally broken input is rejected before anything is written.
#[tokio::test]
async fn test_tampered_record_is_rejected() {
    let pki = TestPki::new();
    let alice = pki.admin("alice");
    let authority = Authority::start(pki.trust.clone()).await;

    let mut record = signed(&alice, None, "endpoint", "10.0.0.1", 1_000);
    record.record.data = json!("10.0.0.2");
    let err = authority.client().submit_records(vec![record]).await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Rpc { code, .. } if code == REJECTED),
        "got {err:?}"
    );
    assert!(authority.log().chain().is_empty());
}
