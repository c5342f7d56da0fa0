//! Signing identities and detached signatures over arbitrary JSON.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use opdir_types::{
    Certificate, ChangeRecord, PublicKeyBytes, RecordHash, RecordSignature, SignatureBytes,
    SignedChangeRecord, hex,
};
use serde::{Deserialize, Serialize};

use crate::certificate::{CertificateBuilder, verifying_key};
use crate::error::{Rejection, Verification, VerifyError};
use crate::trust::TrustStore;
use crate::verifier::signable_bytes;

/// A certificate together with its private key.
#[derive(Clone)]
pub struct SigningIdentity {
    certificate: Certificate,
    signing_key: SigningKey,
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("subject", &self.certificate.subject)
            .finish_non_exhaustive()
    }
}

/// On-disk form of a [`SigningIdentity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityFile {
    pub certificate: Certificate,
    /// Hex-encoded ed25519 secret key.
    pub secret_key: String,
}

impl SigningIdentity {
    /// Pair a certificate with its key, checking that they belong together.
    pub fn new(certificate: Certificate, signing_key: SigningKey) -> Result<Self, VerifyError> {
        let public = PublicKeyBytes::from(signing_key.verifying_key().to_bytes());
        if public != certificate.public_key {
            return Err(VerifyError::InvalidIdentity(format!(
                "key does not match certificate of {}",
                certificate.subject
            )));
        }
        Ok(Self {
            certificate,
            signing_key,
        })
    }

    /// Generate a fresh self-signed CA identity.
    pub fn self_signed_ca<I, S>(
        subject: &str,
        groups: I,
        not_before: u64,
        not_after: u64,
    ) -> Result<Self, VerifyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let certificate = CertificateBuilder::new(subject, not_before, not_after)
            .groups(groups)
            .ca(true)
            .self_signed(&key)?;
        Self::new(certificate, key)
    }

    /// Generate a new key and issue a certificate for it, signed by `self`.
    pub fn issue<I, S>(
        &self,
        subject: &str,
        groups: I,
        is_ca: bool,
        not_before: u64,
        not_after: u64,
    ) -> Result<Self, VerifyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let certificate = CertificateBuilder::new(subject, not_before, not_after)
            .groups(groups)
            .ca(is_ca)
            .issue(&key.verifying_key(), &self.signing_key)?;
        Self::new(certificate, key)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Hash, link and sign a change record.
    pub fn sign_record(
        &self,
        parent_hash: Option<RecordHash>,
        record: ChangeRecord,
    ) -> Result<SignedChangeRecord, VerifyError> {
        let mut signed = SignedChangeRecord::unsigned(parent_hash, record)?;
        let sig = self.signing_key.sign(&signable_bytes(&signed)?);
        signed.signature = Some(RecordSignature {
            certificate: self.certificate.clone(),
            signature: SignatureBytes::from(sig.to_bytes()),
        });
        Ok(signed)
    }

    /// Sign an arbitrary JSON value.
    pub fn sign_value(&self, data: serde_json::Value) -> Result<SignedData, VerifyError> {
        let bytes = postcard::to_allocvec(&data).map_err(opdir_types::TypesError::from)?;
        let sig = self.signing_key.sign(&bytes);
        Ok(SignedData {
            data,
            signature: RecordSignature {
                certificate: self.certificate.clone(),
                signature: SignatureBytes::from(sig.to_bytes()),
            },
        })
    }

    pub fn to_file(&self) -> IdentityFile {
        IdentityFile {
            certificate: self.certificate.clone(),
            secret_key: hex::encode(&self.signing_key.to_bytes()),
        }
    }

    pub fn from_file(file: IdentityFile) -> Result<Self, VerifyError> {
        let secret = hex::decode::<32>(&file.secret_key)?;
        Self::new(file.certificate, SigningKey::from_bytes(&secret))
    }
}

/// A JSON value with a detached signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedData {
    pub data: serde_json::Value,
    pub signature: RecordSignature,
}

/// Verify a [`SignedData`] produced by `sign_value`.
///
/// The signer certificate must be issued to `name`, chain to `trust` at
/// `at`, and its key must verify the signature.
pub fn verify_signed_value(
    signed: &SignedData,
    trust: &TrustStore,
    name: &str,
    at: u64,
) -> Result<Verification, VerifyError> {
    let cert = &signed.signature.certificate;
    let key = verifying_key(cert)?;

    if cert.subject != name {
        return Ok(Rejection::SubjectMismatch {
            expected: name.to_string(),
            actual: cert.subject.clone(),
        }
        .into());
    }
    if !trust.verify_chain(cert, at)? {
        return Ok(Rejection::UntrustedCertificate {
            subject: cert.subject.clone(),
        }
        .into());
    }

    let bytes = postcard::to_allocvec(&signed.data).map_err(opdir_types::TypesError::from)?;
    let sig = Signature::from_bytes(signed.signature.signature.as_bytes());
    if key.verify(&bytes, &sig).is_err() {
        return Ok(Rejection::BadSignature.into());
    }
    Ok(Verification::Valid)
}
