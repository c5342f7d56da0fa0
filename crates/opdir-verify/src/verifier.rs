//! Record verification: hash integrity, signer authorization, key pinning
//! and certificate trust.

use ed25519_dalek::{Signature, Verifier};
use opdir_types::{
    ChangeRecord, Fingerprint, KEY_USAGE_SIGNING, OperatorCertificate, RecordHash,
    SECTION_CERTIFICATES, SignedChangeRecord,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::certificate::verifying_key;
use crate::error::{Rejection, Verification, VerifyError};
use crate::trust::TrustStore;

/// Group a signer must belong to in order to author directory records.
pub const ADMIN_GROUP: &str = "sd-admin";

/// Everything a record signature covers: the record without its signature.
#[derive(Serialize)]
struct SignablePayload<'a> {
    parent_hash: Option<&'a RecordHash>,
    record: &'a ChangeRecord,
    hash: &'a RecordHash,
}

/// Canonical bytes covered by a record signature.
pub fn signable_bytes(record: &SignedChangeRecord) -> Result<Vec<u8>, VerifyError> {
    let payload = SignablePayload {
        parent_hash: record.parent_hash.as_ref(),
        record: &record.record,
        hash: &record.hash,
    };
    Ok(postcard::to_allocvec(&payload).map_err(opdir_types::TypesError::from)?)
}

/// The most recent `signing` fingerprint `name` published in a
/// `certificates` record among `preceding`.
///
/// Unparseable certificate lists are logged and skipped.
pub fn pinned_fingerprint<'a, I>(preceding: I, name: &str) -> Option<Fingerprint>
where
    I: IntoIterator<Item = &'a SignedChangeRecord>,
{
    let mut pinned = None;
    for r in preceding {
        if r.record.section != SECTION_CERTIFICATES || r.record.name != name {
            continue;
        }
        let certs: Vec<OperatorCertificate> = match serde_json::from_value(r.record.data.clone()) {
            Ok(c) => c,
            Err(e) => {
                warn!(hash = %r.hash, error = %e, "ignoring malformed certificates record");
                continue;
            }
        };
        for c in certs {
            if c.key_usage == KEY_USAGE_SIGNING {
                pinned = Some(c.fingerprint);
            }
        }
    }
    pinned
}

/// Verify one record against the records preceding it in its chain.
///
/// A hash mismatch or undecodable certificate is an error. Every
/// authorization failure is a [`Verification::Rejected`]. The record is
/// only read, never modified.
pub fn verify_record<'a, I>(
    record: &SignedChangeRecord,
    preceding: I,
    trust: &TrustStore,
) -> Result<Verification, VerifyError>
where
    I: IntoIterator<Item = &'a SignedChangeRecord>,
{
    let computed = record.record.compute_hash()?;
    if computed != record.hash {
        return Err(VerifyError::HashMismatch {
            stored: record.hash,
            computed,
        });
    }

    let Some(signature) = &record.signature else {
        return Ok(Rejection::Unsigned.into());
    };
    let cert = &signature.certificate;
    let key = verifying_key(cert)?;

    if !cert.has_group(ADMIN_GROUP) {
        return Ok(Rejection::NotAdmin {
            subject: cert.subject.clone(),
        }
        .into());
    }

    if let Some(pinned) = pinned_fingerprint(preceding, &cert.subject) {
        let actual = cert.fingerprint()?;
        if actual != pinned {
            debug!(subject = %cert.subject, %pinned, %actual, "signer key does not match pinned fingerprint");
            return Ok(Rejection::FingerprintMismatch { pinned, actual }.into());
        }
    }

    if !trust.verify_chain(cert, record.record.created_at)? {
        return Ok(Rejection::UntrustedCertificate {
            subject: cert.subject.clone(),
        }
        .into());
    }

    let sig = Signature::from_bytes(signature.signature.as_bytes());
    if key.verify(&signable_bytes(record)?, &sig).is_err() {
        return Ok(Rejection::BadSignature.into());
    }

    Ok(Verification::Valid)
}
