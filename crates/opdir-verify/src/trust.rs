//! Trust anchors and certificate chain validation.

use opdir_types::Certificate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::certificate::{decode_key, is_signed_by};
use crate::error::VerifyError;

/// Longest issuer chain walked before giving up.
const MAX_CHAIN_DEPTH: usize = 8;

/// Root and intermediate CA certificates used to validate signers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustStore {
    #[serde(default)]
    pub roots: Vec<Certificate>,
    #[serde(default)]
    pub intermediates: Vec<Certificate>,
}

impl TrustStore {
    pub fn new(roots: Vec<Certificate>, intermediates: Vec<Certificate>) -> Self {
        Self {
            roots,
            intermediates,
        }
    }

    /// Trust store with a single root and no intermediates.
    pub fn with_root(root: Certificate) -> Self {
        Self::new(vec![root], Vec::new())
    }

    /// Whether `cert` chains to one of the roots, with every link valid at
    /// `at` (Unix milliseconds).
    ///
    /// Each issuer must be a CA whose public key matches the child's
    /// `issuer_key` and whose signature over the child verifies.
    pub fn verify_chain(&self, cert: &Certificate, at: u64) -> Result<bool, VerifyError> {
        let mut current = cert;
        for _ in 0..MAX_CHAIN_DEPTH {
            if !current.is_valid_at(at) {
                debug!(subject = %current.subject, at, "certificate outside validity window");
                return Ok(false);
            }
            if self.roots.iter().any(|r| r == current) {
                return Ok(true);
            }

            let issuer = self
                .roots
                .iter()
                .chain(self.intermediates.iter())
                .filter(|c| c.is_ca && c.public_key == current.issuer_key)
                .find(|c| {
                    decode_key(&c.public_key)
                        .and_then(|key| is_signed_by(current, &key))
                        .unwrap_or(false)
                });

            match issuer {
                Some(next) if next == current => return Ok(false),
                Some(next) => current = next,
                None => {
                    debug!(subject = %current.subject, "no trusted issuer found");
                    return Ok(false);
                }
            }
        }
        debug!(subject = %cert.subject, "certificate chain too deep");
        Ok(false)
    }
}
