//! Certificate issuance and key decoding.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use opdir_types::{Certificate, PublicKeyBytes, SignatureBytes};

use crate::error::VerifyError;

/// Builder for new certificates.
#[derive(Debug, Clone)]
pub struct CertificateBuilder {
    subject: String,
    groups: Vec<String>,
    is_ca: bool,
    not_before: u64,
    not_after: u64,
}

impl CertificateBuilder {
    /// Start a certificate for `subject`, valid over `[not_before, not_after]`
    /// (Unix milliseconds).
    pub fn new(subject: impl Into<String>, not_before: u64, not_after: u64) -> Self {
        Self {
            subject: subject.into(),
            groups: Vec::new(),
            is_ca: false,
            not_before,
            not_after,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn ca(mut self, is_ca: bool) -> Self {
        self.is_ca = is_ca;
        self
    }

    /// Sign the certificate with its own key, producing a root.
    pub fn self_signed(self, key: &SigningKey) -> Result<Certificate, VerifyError> {
        let public = PublicKeyBytes::from(key.verifying_key().to_bytes());
        self.sign(public, key)
    }

    /// Issue a certificate for `subject_key`, signed by `issuer`.
    pub fn issue(
        self,
        subject_key: &VerifyingKey,
        issuer: &SigningKey,
    ) -> Result<Certificate, VerifyError> {
        self.sign(PublicKeyBytes::from(subject_key.to_bytes()), issuer)
    }

    fn sign(self, public_key: PublicKeyBytes, issuer: &SigningKey) -> Result<Certificate, VerifyError> {
        let mut cert = Certificate {
            subject: self.subject,
            groups: self.groups,
            public_key,
            issuer_key: PublicKeyBytes::from(issuer.verifying_key().to_bytes()),
            is_ca: self.is_ca,
            not_before: self.not_before,
            not_after: self.not_after,
            issuer_signature: SignatureBytes::from([0u8; 64]),
        };
        let sig = issuer.sign(&cert.tbs_bytes()?);
        cert.issuer_signature = SignatureBytes::from(sig.to_bytes());
        Ok(cert)
    }
}

/// Decode the subject public key of a certificate.
pub fn verifying_key(cert: &Certificate) -> Result<VerifyingKey, VerifyError> {
    decode_key(&cert.public_key)
}

pub(crate) fn decode_key(key: &PublicKeyBytes) -> Result<VerifyingKey, VerifyError> {
    VerifyingKey::from_bytes(key.as_bytes())
        .map_err(|e| VerifyError::MalformedCertificate(e.to_string()))
}

/// Check that `cert` carries a valid signature by `issuer_key`.
pub(crate) fn is_signed_by(cert: &Certificate, issuer_key: &VerifyingKey) -> Result<bool, VerifyError> {
    let tbs = cert.tbs_bytes()?;
    let sig = Signature::from_bytes(cert.issuer_signature.as_bytes());
    Ok(issuer_key.verify(&tbs, &sig).is_ok())
}
