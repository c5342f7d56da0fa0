//! Tests for the verify crate.

mod trust_tests;

use opdir_types::{
    ChangeRecord, Fingerprint, KEY_USAGE_SIGNING, SECTION_CERTIFICATES, SignedChangeRecord,
};
use serde_json::json;

use crate::signing::SigningIdentity;
use crate::trust::TrustStore;
use crate::verifier::ADMIN_GROUP;

const NOT_BEFORE: u64 = 0;
const NOT_AFTER: u64 = 4_000_000_000_000;
const NOW: u64 = 1_700_000_000_000;

/// No preceding records.
const EMPTY: &[SignedChangeRecord] = &[];

/// A root CA and the trust store anchored on it.
fn test_ca() -> (SigningIdentity, TrustStore) {
    let ca = SigningIdentity::self_signed_ca("root", Vec::<String>::new(), NOT_BEFORE, NOT_AFTER)
        .unwrap();
    let trust = TrustStore::with_root(ca.certificate().clone());
    (ca, trust)
}

/// An `sd-admin` operator certificate issued by `ca`.
fn test_admin(ca: &SigningIdentity, name: &str) -> SigningIdentity {
    ca.issue(name, [ADMIN_GROUP], false, NOT_BEFORE, NOT_AFTER)
        .unwrap()
}

fn record(name: &str, section: &str, data: serde_json::Value) -> ChangeRecord {
    ChangeRecord::at(name, section, data, NOW)
}

/// A `certificates` record pinning `fingerprint` for signing.
fn certificates_record(name: &str, fingerprint: Fingerprint) -> ChangeRecord {
    record(
        name,
        SECTION_CERTIFICATES,
        json!([{"fingerprint": fingerprint.to_string(), "key_usage": KEY_USAGE_SIGNING}]),
    )
}
