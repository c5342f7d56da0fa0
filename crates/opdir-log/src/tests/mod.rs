//! Tests for the log crate.


use std::sync::Arc;

use opdir_store::{DataEntry, Datastore, MemoryDatastore, random_id};
use opdir_types::{ChangeRecord, RecordHash, SignedChangeRecord};
use opdir_verify::{ADMIN_GROUP, SigningIdentity, TrustStore};
use serde_json::json;

use crate::log::{RecordLog, SIGNED_CHANGE_RECORD};

const NOT_AFTER: u64 = 4_000_000_000_000;

/// A root CA, its trust store, and an `sd-admin` operator named `name`.
fn test_identity(name: &str) -> (SigningIdentity, TrustStore, SigningIdentity) {
    let ca = SigningIdentity::self_signed_ca("root", Vec::<String>::new(), 0, NOT_AFTER).unwrap();
    let trust = TrustStore::with_root(ca.certificate().clone());
    let admin = ca.issue(name, [ADMIN_GROUP], false, 0, NOT_AFTER).unwrap();
    (ca, trust, admin)
}

/// Sign an `endpoint` record for the identity's subject at `created_at`.
fn signed(
    id: &SigningIdentity,
    parent: Option<RecordHash>,
    value: &str,
    created_at: u64,
) -> SignedChangeRecord {
    let name = id.certificate().subject.clone();
    id.sign_record(
        parent,
        ChangeRecord::at(name, "endpoint", json!({ "addr": value }), created_at),
    )
    .unwrap()
}

/// Write a record straight to the datastore, skipping every append check.
fn write_raw(store: &dyn Datastore, record: &SignedChangeRecord) {
    store
        .write(&DataEntry::new(
            SIGNED_CHANGE_RECORD,
            random_id(16),
            serde_json::to_vec(record).unwrap(),
        ))
        .unwrap();
}

fn memory_log(trust: &TrustStore) -> (Arc<MemoryDatastore>, RecordLog) {
    let store = Arc::new(MemoryDatastore::new());
    let log = RecordLog::open(store.clone(), trust.clone()).unwrap();
    (store, log)
}
