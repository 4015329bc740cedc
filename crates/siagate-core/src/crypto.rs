//! Cryptographic primitives for Siagate.
//!
//! Wraps Blake3 hashing and Ed25519 signing with strong types. The hash is an
//! opaque building block: nothing above this module depends on which function
//! sits behind [`Hash256::hash`].

use bytes::Bytes;
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::specifier::{Specifier, SPECIFIER_ED25519};
use crate::transaction::{CoveredFields, SiaPublicKey, Transaction, TransactionSignature};

/// Length of every hash-sized value in the ledger.
pub const HASH_SIZE: usize = 32;

/// A 32-byte Blake3 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; HASH_SIZE]);

impl Hash256 {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash the concatenation of several byte slices.
    pub fn hash_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != HASH_SIZE * 2 {
            return Err(CoreError::InvalidIdentifier {
                kind: "hash",
                expected: HASH_SIZE * 2,
                got: s.len(),
            });
        }
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; HASH_SIZE]);
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash256 {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

/// Hex in human-readable formats (JSON), raw bytes in binary ones (CBOR).
impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; HASH_SIZE]>::deserialize(deserializer).map(Self)
        }
    }
}

/// An Ed25519 keypair for signing transactions.
///
/// Signing is a client concern; verification belongs to the consensus engine.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// The public key, tagged with its algorithm specifier.
    pub fn public_key(&self) -> SiaPublicKey {
        SiaPublicKey {
            algorithm: SPECIFIER_ED25519,
            key: Bytes::copy_from_slice(self.signing_key.verifying_key().as_bytes()),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Bytes {
        let sig = self.signing_key.sign(message);
        Bytes::copy_from_slice(&sig.to_bytes())
    }

    /// Sign the whole of `txn` on behalf of the input identified by `parent_id`.
    ///
    /// The signature covers the transaction's signature hash, which excludes
    /// every existing signature.
    pub fn sign_transaction(
        &self,
        txn: &Transaction,
        parent_id: Hash256,
        public_key_index: u64,
    ) -> TransactionSignature {
        let sig_hash = txn.sig_hash(&parent_id, public_key_index, 0);
        TransactionSignature {
            parent_id,
            public_key_index,
            timelock: 0,
            covered_fields: CoveredFields::whole_transaction(),
            signature: self.sign(sig_hash.as_bytes()),
        }
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", hex::encode(&self.public_key().key[..8]))
    }
}

/// Whether `algorithm` names the key type this module signs with.
pub fn is_ed25519(algorithm: &Specifier) -> bool {
    *algorithm == SPECIFIER_ED25519
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let h1 = Hash256::hash(b"test data");
        let h2 = Hash256::hash(b"test data");
        assert_eq!(h1, h2);
        assert_ne!(h1, Hash256::hash(b"different data"));
    }

    #[test]
    fn test_hash_parts_matches_concatenation() {
        let joined = Hash256::hash(b"siacoin output");
        let parts = Hash256::hash_parts(&[b"siacoin", b" ", b"output"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = Hash256::hash(b"roundtrip");
        let parsed: Hash256 = h.to_hex().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn test_hash_from_hex_wrong_length() {
        let err = Hash256::from_hex("abcd").unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentifier { got: 4, .. }));
    }

    #[test]
    fn test_hash_json_is_hex_string() {
        let h = Hash256::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let kp1 = Keypair::from_seed(&[0x42; 32]);
        let kp2 = Keypair::from_seed(&[0x42; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert!(is_ed25519(&kp1.public_key().algorithm));
        assert_eq!(kp1.sign(b"msg"), kp2.sign(b"msg"));
    }
}
