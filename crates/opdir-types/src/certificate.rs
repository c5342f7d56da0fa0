//! Operator certificates.
//!
//! A [`Certificate`] binds an operator name and group memberships to an
//! ed25519 public key, signed by an issuing CA key. Roots are self-signed
//! (`issuer_key == public_key`). Issuance and chain validation live in
//! `opdir-verify`; this module only defines the data and its canonical
//! encodings.

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::{Fingerprint, PublicKeyBytes, SignatureBytes};

/// An ed25519 operator credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Operator name the certificate was issued to.
    pub subject: String,
    /// Group memberships (e.g. `sd-admin`).
    #[serde(default)]
    pub groups: Vec<String>,
    /// Subject's public key.
    pub public_key: PublicKeyBytes,
    /// Public key of the issuing certificate.
    pub issuer_key: PublicKeyBytes,
    /// Whether this certificate may issue other certificates.
    #[serde(default)]
    pub is_ca: bool,
    /// Start of validity, Unix milliseconds.
    pub not_before: u64,
    /// End of validity, Unix milliseconds.
    pub not_after: u64,
    /// Issuer's signature over [`Certificate::tbs_bytes`].
    pub issuer_signature: SignatureBytes,
}

/// Signed portion of a certificate (everything but the issuer signature).
#[derive(Serialize)]
struct CertificateBody<'a> {
    subject: &'a str,
    groups: &'a [String],
    public_key: &'a PublicKeyBytes,
    issuer_key: &'a PublicKeyBytes,
    is_ca: bool,
    not_before: u64,
    not_after: u64,
}

impl Certificate {
    /// Canonical bytes covered by the issuer signature.
    pub fn tbs_bytes(&self) -> Result<Vec<u8>, TypesError> {
        let body = CertificateBody {
            subject: &self.subject,
            groups: &self.groups,
            public_key: &self.public_key,
            issuer_key: &self.issuer_key,
            is_ca: self.is_ca,
            not_before: self.not_before,
            not_after: self.not_after,
        };
        Ok(postcard::to_allocvec(&body)?)
    }

    /// Fingerprint of the full certificate, issuer signature included.
    pub fn fingerprint(&self) -> Result<Fingerprint, TypesError> {
        let bytes = postcard::to_allocvec(self)?;
        Ok(Fingerprint::from_data(&bytes))
    }

    /// Whether the certificate lists the given group.
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Whether the certificate was signed by its own key.
    pub fn is_self_signed(&self) -> bool {
        self.issuer_key == self.public_key
    }

    /// Whether `at` (Unix milliseconds) falls inside the validity window.
    pub fn is_valid_at(&self, at: u64) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// A pinned certificate fingerprint, as published in an operator's
/// `certificates` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCertificate {
    /// Fingerprint of the certificate.
    pub fingerprint: Fingerprint,
    /// What the certificate is used for (e.g. `signing`).
    pub key_usage: String,
}
