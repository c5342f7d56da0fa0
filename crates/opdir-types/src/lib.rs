//! Shared types and identifiers for the operator directory.
//!
//! This crate defines the data model used across the workspace:
//! identifiers ([`RecordHash`], [`Fingerprint`], [`PublicKeyBytes`]),
//! signed change records ([`ChangeRecord`], [`SignedChangeRecord`]),
//! operator certificates ([`Certificate`], [`OperatorCertificate`]) and the
//! projected directory view ([`DirectoryEntry`], [`DirectoryQuery`]).
//!
//! Everything here is plain data. Signing and verification live in
//! `opdir-verify`, chain resolution in `opdir-log`.

mod certificate;
mod entry;
mod error;
mod record;


use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use certificate::{Certificate, OperatorCertificate};
pub use entry::{DirectoryEntry, DirectoryQuery, filter_entries};
pub use error::TypesError;
pub use record::{ChangeRecord, RecordSignature, SignedChangeRecord};

/// Section holding an operator's pinned certificate fingerprints.
pub const SECTION_CERTIFICATES: &str = "certificates";

/// Key usage of the certificate an operator signs directory records with.
pub const KEY_USAGE_SIGNING: &str = "signing";

// ---------------------------------------------------------------------------
// ID types
// ---------------------------------------------------------------------------

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Create an ID by hashing arbitrary data with BLAKE3.
            pub fn from_data(data: &[u8]) -> Self {
                Self(blake3::hash(data).into())
            }

            /// Return the raw 32-byte representation.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                hex::decode::<32>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

define_id!(
    /// Content hash of a change record: `blake3(postcard(ChangeRecord))`.
    RecordHash
);

define_id!(
    /// Certificate fingerprint: `blake3(postcard(Certificate))`.
    Fingerprint
);

define_id!(
    /// Raw ed25519 public key bytes carried inside a certificate.
    PublicKeyBytes
);

/// A 64-byte ed25519 signature, hex-encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureBytes([u8; 64]);

impl SignatureBytes {
    /// Return the raw 64-byte representation.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl From<[u8; 64]> for SignatureBytes {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes({self})")
    }
}

impl FromStr for SignatureBytes {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode::<64>(s).map(Self)
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Current Unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Lowercase hex encoding for fixed-size identifiers.
pub mod hex {
    use crate::TypesError;

    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: &[u8]) -> String {
        ::hex::encode(bytes)
    }

    /// Decode exactly `N` bytes from a hex string.
    pub fn decode<const N: usize>(s: &str) -> Result<[u8; N], TypesError> {
        let mut out = [0u8; N];
        ::hex::decode_to_slice(s, &mut out)
            .map_err(|e| TypesError::InvalidHex(format!("{s:?}: {e}")))?;
        Ok(out)
    }
}
