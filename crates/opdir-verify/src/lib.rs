//! Signing and verification for the operator directory.
//!
//! Every change record is signed by an operator certificate. A record is
//! accepted only when:
//!
//! - its stored hash matches the record content,
//! - the signer is a member of [`ADMIN_GROUP`],
//! - the signer's certificate matches the most recent `signing`
//!   fingerprint it pinned earlier in the chain (if any),
//! - the certificate chains to a root in the [`TrustStore`] and the
//!   ed25519 signature verifies.
//!
//! Hash mismatches and undecodable certificates are [`VerifyError`]s; all
//! other failures are negative [`Verification`] results.

mod certificate;
mod error;
mod signing;
mod trust;
mod verifier;

#[cfg(test)]
mod tests;

pub use certificate::{CertificateBuilder, verifying_key};
pub use error::{Rejection, Verification, VerifyError};
pub use signing::{IdentityFile, SignedData, SigningIdentity, verify_signed_value};
pub use trust::TrustStore;
pub use verifier::{ADMIN_GROUP, pinned_fingerprint, signable_bytes, verify_record};
