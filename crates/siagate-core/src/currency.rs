//! Currency: unsigned 256-bit ledger amounts.
//!
//! All arithmetic is checked. Ledger values never wrap and never go negative.

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// An amount of siacoins (in hastings) or siafunds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Currency(U256);

impl Currency {
    /// Zero.
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));

    /// The largest representable amount.
    pub const MAX: Self = Self(U256::MAX);

    /// Wrap a raw 256-bit integer.
    pub const fn from_u256(value: U256) -> Self {
        Self(value)
    }

    /// The raw 256-bit integer.
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Big-endian 32-byte encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    /// Decode from big-endian 32 bytes.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(U256::from_big_endian(bytes))
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or(CoreError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(CoreError::Underflow)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self> {
        self.0.checked_mul(rhs.0).map(Self).ok_or(CoreError::Overflow)
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_div(rhs.0)
            .map(Self)
            .ok_or(CoreError::DivisionByZero)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn sum<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        iter.into_iter()
            .try_fold(Self::ZERO, |acc, value| acc.checked_add(value))
    }
}

impl From<u64> for Currency {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Currency {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.0)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidCurrency(s.to_string()));
        }
        U256::from_dec_str(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidCurrency(format!("{}: {:?}", s, e)))
    }
}

/// Decimal string in human-readable formats, 32 big-endian bytes otherwise.
impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.to_be_bytes().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(|b| Self::from_be_bytes(&b))
        }
    }
}
