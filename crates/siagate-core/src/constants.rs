//! Consensus constants per network.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::block::{BlockHeight, Timestamp};
use crate::currency::Currency;
use crate::error::{CoreError, Result};
use crate::target::Target;

/// Which constants table is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Standard,
    /// Short windows and an easy root target, for tests and local chains.
    Testing,
}

/// The fraction of each contract payout paid into the siafund pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiafundPortion {
    pub numerator: u64,
    pub denominator: u64,
}

impl fmt::Display for SiafundPortion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for SiafundPortion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::EncodingError(format!("invalid siafund portion: {}", s));
        let (num, den) = s.split_once('/').ok_or_else(invalid)?;
        let numerator = num.parse().map_err(|_| invalid())?;
        let denominator: u64 = den.parse().map_err(|_| invalid())?;
        if denominator == 0 {
            return Err(CoreError::DivisionByZero);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

/// Rendered as `"39/1000"`.
impl Serialize for SiafundPortion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SiafundPortion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The consensus constants reported by the tip summary and used by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConstants {
    #[serde(rename = "blockfrequency")]
    pub block_frequency: BlockHeight,
    #[serde(rename = "blocksizelimit")]
    pub block_size_limit: u64,
    #[serde(rename = "extremefuturethreshold")]
    pub extreme_future_threshold: Timestamp,
    #[serde(rename = "futurethreshold")]
    pub future_threshold: Timestamp,
    #[serde(rename = "genesistimestamp")]
    pub genesis_timestamp: Timestamp,
    #[serde(rename = "maturitydelay")]
    pub maturity_delay: BlockHeight,
    #[serde(rename = "mediantimestampwindow")]
    pub median_timestamp_window: u64,
    #[serde(rename = "siafundcount")]
    pub siafund_count: Currency,
    #[serde(rename = "siafundportion")]
    pub siafund_portion: SiafundPortion,
    #[serde(rename = "initialcoinbase")]
    pub initial_coinbase: u64,
    #[serde(rename = "minimumcoinbase")]
    pub minimum_coinbase: u64,
    #[serde(rename = "roottarget")]
    pub root_target: Target,
    #[serde(rename = "rootdepth")]
    pub root_depth: Target,
    #[serde(rename = "siacoinprecision")]
    pub siacoin_precision: Currency,
}

impl ConsensusConstants {
    /// The constants table for `network`.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Standard => Self::standard(),
            Network::Testing => Self::testing(),
        }
    }

    fn standard() -> Self {
        let mut root_target = [0u8; 32];
        root_target[4] = 32;
        Self {
            block_frequency: 600,
            block_size_limit: 2_000_000,
            extreme_future_threshold: 18_000,
            future_threshold: 10_800,
            genesis_timestamp: 1_433_600_000,
            maturity_delay: 144,
            median_timestamp_window: 11,
            siafund_count: Currency::from(10_000u64),
            siafund_portion: SiafundPortion {
                numerator: 39,
                denominator: 1000,
            },
            initial_coinbase: 300_000,
            minimum_coinbase: 30_000,
            root_target: Target::from_bytes(root_target),
            root_depth: Target::from_bytes([0xff; 32]),
            siacoin_precision: Currency::from(10u128.pow(24)),
        }
    }

    fn testing() -> Self {
        let mut root_target = [0u8; 32];
        root_target[0] = 128;
        Self {
            block_frequency: 1,
            block_size_limit: 2_000_000,
            extreme_future_threshold: 6,
            future_threshold: 3,
            genesis_timestamp: 1_424_139_000,
            maturity_delay: 3,
            median_timestamp_window: 11,
            root_target: Target::from_bytes(root_target),
            ..Self::standard()
        }
    }

    /// The siafund-pool contribution of a contract with the given payout.
    ///
    /// `payout * portion`, rounded down to a multiple of the siafund count so
    /// the pool always divides evenly among siafunds.
    pub fn tax(&self, payout: Currency) -> Result<Currency> {
        let raw = payout
            .checked_mul(Currency::from(self.siafund_portion.numerator))?
            .checked_div(Currency::from(self.siafund_portion.denominator))?;
        let remainder = raw.as_u256() % self.siafund_count.as_u256();
        raw.checked_sub(Currency::from_u256(remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_constants() {
        let c = ConsensusConstants::for_network(Network::Standard);
        assert_eq!(c.block_frequency, 600);
        assert_eq!(c.maturity_delay, 144);
        assert_eq!(c.siafund_count, Currency::from(10_000u64));
        assert_eq!(c.siafund_portion.to_string(), "39/1000");
        assert_eq!(
            c.siacoin_precision.to_string(),
            "1000000000000000000000000"
        );
        assert_eq!(c.root_target.as_bytes()[4], 32);
    }

    #[test]
    fn test_testing_constants_differ() {
        let std = ConsensusConstants::for_network(Network::Standard);
        let test = ConsensusConstants::for_network(Network::Testing);
        assert_ne!(std.root_target, test.root_target);
        assert_eq!(test.siafund_count, std.siafund_count);
    }

    #[test]
    fn test_tax_rounds_to_siafund_count() {
        let c = ConsensusConstants::for_network(Network::Standard);
        // 1_000_000 * 39 / 1000 = 39_000, rounded down to 30_000
        assert_eq!(
            c.tax(Currency::from(1_000_000u64)).unwrap(),
            Currency::from(30_000u64)
        );
        assert_eq!(c.tax(Currency::from(100u64)).unwrap(), Currency::ZERO);
    }

    #[test]
    fn test_siafund_portion_json() {
        let c = ConsensusConstants::for_network(Network::Standard);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["siafundportion"], "39/1000");
        assert_eq!(json["siafundcount"], "10000");
        let back: ConsensusConstants = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_network_json() {
        assert_eq!(serde_json::to_string(&Network::Testing).unwrap(), "\"testing\"");
    }
}
