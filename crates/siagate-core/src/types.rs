//! Strong identifier types for Siagate.
//!
//! All identifiers are newtypes over [`Hash256`] to prevent misuse at compile
//! time. None of them has a public constructor from an object: they come out
//! of the derivations in [`crate::ids`] or from parsing their text form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::{Hash256, HASH_SIZE};
use crate::error::{CoreError, Result};

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Hash256);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
                Self(Hash256(bytes))
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
                &self.0 .0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                self.0.to_hex()
            }

            /// Parse from a 64-character hex string.
            pub fn from_hex(s: &str) -> Result<Self> {
                Hash256::from_hex(s).map(Self).map_err(|e| match e {
                    CoreError::InvalidIdentifier { expected, got, .. } => {
                        CoreError::InvalidIdentifier { kind: $kind, expected, got }
                    }
                    other => other,
                })
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_ref()
            }
        }

        impl From<Hash256> for $name {
            fn from(hash: Hash256) -> Self {
                Self(hash)
            }
        }
    };
}

hash_id!(
    /// Uniquely identifies a transaction.
    TransactionId,
    "transaction id"
);
hash_id!(
    /// Uniquely identifies a siacoin output.
    SiacoinOutputId,
    "siacoin output id"
);
hash_id!(
    /// Uniquely identifies a siafund output.
    SiafundOutputId,
    "siafund output id"
);
hash_id!(
    /// Uniquely identifies a file contract.
    FileContractId,
    "file contract id"
);
hash_id!(
    /// Uniquely identifies an output of any kind.
    OutputId,
    "output id"
);
hash_id!(
    /// Uniquely identifies a block.
    BlockId,
    "block id"
);
hash_id!(
    /// Identifies a consensus change; used as a subscription resumption point.
    ConsensusChangeId,
    "consensus change id"
);

impl ConsensusChangeId {
    /// Resume from genesis: replay every change.
    pub const BEGINNING: Self = Self(Hash256([0u8; HASH_SIZE]));

    /// Resume from the current tip: deliver only future changes.
    pub const RECENT: Self = Self(Hash256([0xff; HASH_SIZE]));
}

/// Size of the typo-catching checksum appended to textual unlock hashes.
///
/// Not cryptographically meaningful. Six bytes bring the textual address to
/// 38 bytes, leaving room for a future version prefix.
pub const UNLOCK_HASH_CHECKSUM_SIZE: usize = 6;

/// Hash of the unlock conditions that must be met to spend an output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct UnlockHash(pub Hash256);

impl UnlockHash {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(Hash256(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0 .0
    }

    /// The checksum appended to the textual form.
    pub fn checksum(&self) -> [u8; UNLOCK_HASH_CHECKSUM_SIZE] {
        let digest = Hash256::hash(self.as_bytes());
        let mut out = [0u8; UNLOCK_HASH_CHECKSUM_SIZE];
        out.copy_from_slice(&digest.0[..UNLOCK_HASH_CHECKSUM_SIZE]);
        out
    }

    /// Textual form: hex of the hash followed by hex of the checksum.
    pub fn to_text(&self) -> String {
        let mut s = self.0.to_hex();
        s.push_str(&hex::encode(self.checksum()));
        s
    }

    /// Parse the textual form, verifying the checksum.
    pub fn from_text(s: &str) -> Result<Self> {
        let expected = (HASH_SIZE + UNLOCK_HASH_CHECKSUM_SIZE) * 2;
        if s.len() != expected {
            return Err(CoreError::InvalidIdentifier {
                kind: "unlock hash",
                expected,
                got: s.len(),
            });
        }
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(&bytes[..HASH_SIZE]);
        let uh = Self::from_bytes(arr);
        if uh.checksum()[..] != bytes[HASH_SIZE..] {
            return Err(CoreError::InvalidChecksum);
        }
        Ok(uh)
    }
}

impl fmt::Debug for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnlockHash({})", &self.0.to_hex()[..16])
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for UnlockHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl From<Hash256> for UnlockHash {
    fn from(hash: Hash256) -> Self {
        Self(hash)
    }
}

impl Serialize for UnlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_text())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for UnlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_text(&s).map_err(serde::de::Error::custom)
        } else {
            Hash256::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex_roundtrip() {
        let id = TransactionId::from_bytes([0x42; 32]);
        let recovered = TransactionId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_id_debug() {
        let id = BlockId::from_bytes([0xcd; 32]);
        let debug = format!("{:?}", id);
        assert_eq!(debug, "BlockId(cdcdcdcdcdcdcdcd)");
    }

    #[test]
    fn test_id_wrong_length_names_kind() {
        let err = BlockId::from_hex("abc").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidIdentifier {
                kind: "block id",
                ..
            }
        ));
    }

    #[test]
    fn test_change_id_sentinels() {
        assert_eq!(ConsensusChangeId::BEGINNING.to_hex(), "0".repeat(64));
        assert_eq!(ConsensusChangeId::RECENT.to_hex(), "f".repeat(64));
    }

    #[test]
    fn test_unlock_hash_text_roundtrip() {
        let uh = UnlockHash::from_bytes([0x11; 32]);
        let text = uh.to_text();
        assert_eq!(text.len(), 76);
        assert_eq!(text.parse::<UnlockHash>().unwrap(), uh);
    }

    #[test]
    fn test_unlock_hash_bad_checksum() {
        let uh = UnlockHash::from_bytes([0x11; 32]);
        let mut text = uh.to_text();
        let last = text.pop().unwrap();
        text.push(if last == '0' { '1' } else { '0' });
        assert_eq!(text.parse::<UnlockHash>(), Err(CoreError::InvalidChecksum));
    }

    #[test]
    fn test_id_json_transparent() {
        let id = SiacoinOutputId::from_bytes([0x01; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
    }
}
