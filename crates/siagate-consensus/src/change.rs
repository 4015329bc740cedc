//! Consensus changes: the atomic, ordered deltas a consensus set publishes.

use serde::{Deserialize, Serialize};
use std::fmt;

use siagate_core::{
    Block, ConsensusChangeId, Currency, FileContract, FileContractId, Hash256, SiacoinOutput,
    SiacoinOutputId, SiafundOutput, SiafundOutputId, Target,
};

/// Whether a diff adds an object to the consensus set or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffDirection {
    Apply,
    Revert,
}

impl DiffDirection {
    /// The opposite direction.
    pub fn inverse(self) -> Self {
        match self {
            DiffDirection::Apply => DiffDirection::Revert,
            DiffDirection::Revert => DiffDirection::Apply,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiacoinOutputDiff {
    pub direction: DiffDirection,
    pub id: SiacoinOutputId,
    #[serde(rename = "siacoinoutput")]
    pub output: SiacoinOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContractDiff {
    pub direction: DiffDirection,
    pub id: FileContractId,
    #[serde(rename = "filecontract")]
    pub contract: FileContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiafundOutputDiff {
    pub direction: DiffDirection,
    pub id: SiafundOutputId,
    #[serde(rename = "siafundoutput")]
    pub output: SiafundOutput,
}

/// A change in the siafund pool. Reverting restores `previous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiafundPoolDiff {
    pub direction: DiffDirection,
    pub previous: Currency,
    pub adjusted: Currency,
}

impl SiacoinOutputDiff {
    pub fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }
}

impl FileContractDiff {
    pub fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }
}

impl SiafundOutputDiff {
    pub fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }
}

impl SiafundPoolDiff {
    pub fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            previous: self.adjusted,
            adjusted: self.previous,
        }
    }
}

/// An atomic delta to the consensus set.
///
/// Reverted blocks are listed tip first; applied blocks in chain order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusChange {
    pub id: ConsensusChangeId,
    #[serde(rename = "revertedblocks")]
    pub reverted_blocks: Vec<Block>,
    #[serde(rename = "appliedblocks")]
    pub applied_blocks: Vec<Block>,
    #[serde(rename = "siacoinoutputdiffs")]
    pub siacoin_output_diffs: Vec<SiacoinOutputDiff>,
    #[serde(rename = "filecontractdiffs")]
    pub file_contract_diffs: Vec<FileContractDiff>,
    #[serde(rename = "siafundoutputdiffs")]
    pub siafund_output_diffs: Vec<SiafundOutputDiff>,
    #[serde(rename = "siafundpooldiffs")]
    pub siafund_pool_diffs: Vec<SiafundPoolDiff>,
    #[serde(rename = "childtarget")]
    pub child_target: Target,
    pub synced: bool,
}

impl ConsensusChange {
    /// `H(u64_le(seq) || reverted block ids || applied block ids)`.
    pub fn compute_id(seq: u64, reverted: &[Block], applied: &[Block]) -> ConsensusChangeId {
        let mut hasher_input = seq.to_le_bytes().to_vec();
        for block in reverted.iter().chain(applied) {
            hasher_input.extend_from_slice(block.id().as_bytes());
        }
        ConsensusChangeId(Hash256::hash(&hasher_input))
    }
}

/// Identifies one registered subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId([u8; 16]);

impl SubscriberId {
    /// A fresh random identifier.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriberId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
