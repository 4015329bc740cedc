//! Specifiers: fixed-width domain-separation tags.
//!
//! A specifier is prefixed to a hash pre-image so that two entity kinds can
//! never produce the same identifier from the same parent bytes.
//!
//! **FROZEN**: the bytes of every constant below are part of the ledger's
//! compatibility surface. Changing one changes every ID of that kind.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Width of a specifier in bytes.
pub const SPECIFIER_LEN: usize = 16;

/// A 16-byte ASCII tag, zero-padded on the right and truncated at 16 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Specifier(pub [u8; SPECIFIER_LEN]);

impl Specifier {
    /// Build a specifier from a name.
    pub const fn new(name: &str) -> Self {
        let src = name.as_bytes();
        let mut out = [0u8; SPECIFIER_LEN];
        let mut i = 0;
        while i < src.len() && i < SPECIFIER_LEN {
            out[i] = src[i];
            i += 1;
        }
        Self(out)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SPECIFIER_LEN] {
        &self.0
    }

    /// The name with trailing padding removed.
    pub fn name(&self) -> String {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({:?})", self.name())
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Specifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.name())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Specifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            if s.len() > SPECIFIER_LEN {
                return Err(serde::de::Error::custom("specifier longer than 16 bytes"));
            }
            Ok(Self::new(&s))
        } else {
            <[u8; SPECIFIER_LEN]>::deserialize(deserializer).map(Self)
        }
    }
}

pub const SPECIFIER_CLAIM_OUTPUT: Specifier = Specifier::new("claim output");
pub const SPECIFIER_FILE_CONTRACT: Specifier = Specifier::new("file contract");
pub const SPECIFIER_FILE_CONTRACT_REVISION: Specifier = Specifier::new("file contract re");
pub const SPECIFIER_MINER_FEE: Specifier = Specifier::new("miner fee");
pub const SPECIFIER_MINER_PAYOUT: Specifier = Specifier::new("miner payout");
pub const SPECIFIER_SIACOIN_INPUT: Specifier = Specifier::new("siacoin input");
pub const SPECIFIER_SIACOIN_OUTPUT: Specifier = Specifier::new("siacoin output");
pub const SPECIFIER_SIAFUND_INPUT: Specifier = Specifier::new("siafund input");
pub const SPECIFIER_SIAFUND_OUTPUT: Specifier = Specifier::new("siafund output");
pub const SPECIFIER_STORAGE_PROOF_OUTPUT: Specifier = Specifier::new("storage proof");

/// Prefix for Foundation subsidy outputs and for Foundation unlock-hash
/// updates carried in arbitrary data.
pub const SPECIFIER_FOUNDATION: Specifier = Specifier::new("foundation");

/// Algorithm tag for Ed25519 public keys.
pub const SPECIFIER_ED25519: Specifier = Specifier::new("ed25519");

/// Every entity-kind specifier, for uniqueness checks.
pub const ENTITY_SPECIFIERS: [Specifier; 11] = [
    SPECIFIER_CLAIM_OUTPUT,
    SPECIFIER_FILE_CONTRACT,
    SPECIFIER_FILE_CONTRACT_REVISION,
    SPECIFIER_MINER_FEE,
    SPECIFIER_MINER_PAYOUT,
    SPECIFIER_SIACOIN_INPUT,
    SPECIFIER_SIACOIN_OUTPUT,
    SPECIFIER_SIAFUND_INPUT,
    SPECIFIER_SIAFUND_OUTPUT,
    SPECIFIER_STORAGE_PROOF_OUTPUT,
    SPECIFIER_FOUNDATION,
];
