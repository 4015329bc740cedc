//! Proof-of-work targets.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{Hash256, HASH_SIZE};
use crate::currency::Currency;

/// A hash-sized proof-of-work target. A block ID must not exceed it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(pub Hash256);

impl Target {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(Hash256(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0 .0
    }

    /// The target read as a big-endian integer.
    pub fn int(&self) -> U256 {
        U256::from_big_endian(self.as_bytes())
    }

    /// How many times harder this target is than `root_depth`.
    ///
    /// A zero target would divide by zero; it reports `root_depth` itself.
    pub fn difficulty(&self, root_depth: &Target) -> Currency {
        let target = self.int();
        if target.is_zero() {
            return Currency::from_u256(root_depth.int());
        }
        Currency::from_u256(root_depth.int() / target)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", &self.0.to_hex()[..16])
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
