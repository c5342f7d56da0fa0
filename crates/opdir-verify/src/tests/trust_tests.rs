//! Tests for certificate chain validation.

use ed25519_dalek::SigningKey;

use super::{NOT_AFTER, NOT_BEFORE, NOW, test_admin, test_ca};
use crate::certificate::CertificateBuilder;
use crate::trust::TrustStore;
use crate::verifier::ADMIN_GROUP;

#[test]
fn test_direct_issue_is_trusted() {
    let (ca, trust) = test_ca();
    let alice = test_admin(&ca, "alice");
    assert!(trust.verify_chain(alice.certificate(), NOW).unwrap());
    assert!(trust.verify_chain(ca.certificate(), NOW).unwrap());
}

#[test]
fn test_intermediate_chain_is_trusted() {
    let (root, _) = test_ca();
    let intermediate = root
        .issue("ops-ca", Vec::<String>::new(), true, NOT_BEFORE, NOT_AFTER)
        .unwrap();
    let alice = test_admin(&intermediate, "alice");

    let without = TrustStore::with_root(root.certificate().clone());
    assert!(!without.verify_chain(alice.certificate(), NOW).unwrap());

    let with = TrustStore::new(
        vec![root.certificate().clone()],
        vec![intermediate.certificate().clone()],
    );
    assert!(with.verify_chain(alice.certificate(), NOW).unwrap());
}

#[test]
fn test_non_ca_cannot_issue() {
    let (root, _) = test_ca();
    let leaf = test_admin(&root, "leaf");
    let child = test_admin(&leaf, "child");

    let trust = TrustStore::new(
        vec![root.certificate().clone()],
        vec![leaf.certificate().clone()],
    );
    assert!(!trust.verify_chain(child.certificate(), NOW).unwrap());
}

#[test]
fn test_expired_certificate_is_untrusted() {
    let (ca, trust) = test_ca();
    let short = ca
        .issue("alice", [ADMIN_GROUP], false, NOW - 10, NOW + 10)
        .unwrap();

    assert!(trust.verify_chain(short.certificate(), NOW).unwrap());
    assert!(!trust.verify_chain(short.certificate(), NOW + 11).unwrap());
    assert!(!trust.verify_chain(short.certificate(), NOW - 11).unwrap());
}

#[test]
fn test_forged_issuer_key_is_untrusted() {
    let (ca, trust) = test_ca();
    let forger = SigningKey::from_bytes(&[9u8; 32]);
    let victim = SigningKey::from_bytes(&[10u8; 32]);

    // Claims the CA as issuer but is signed by another key.
    let mut cert = CertificateBuilder::new("alice", NOT_BEFORE, NOT_AFTER)
        .group(ADMIN_GROUP)
        .issue(&victim.verifying_key(), &forger)
        .unwrap();
    cert.issuer_key = ca.certificate().public_key;

    assert!(!trust.verify_chain(&cert, NOW).unwrap());
}
