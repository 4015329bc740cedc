//! Blocks and block identity.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_siacoin_output_bytes, canonical_transaction_bytes};
use crate::crypto::Hash256;
use crate::transaction::{SiacoinOutput, Transaction};
use crate::types::BlockId;

/// Position of a block in the chain. Genesis is height 0.
pub type BlockHeight = u64;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Proof-of-work nonce.
pub type BlockNonce = [u8; 8];

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// A block: a header plus the miner payouts and transactions it commits to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "parentid")]
    pub parent_id: BlockId,
    pub nonce: BlockNonce,
    pub timestamp: Timestamp,
    #[serde(rename = "minerpayouts", default)]
    pub miner_payouts: Vec<SiacoinOutput>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The block's identity: a hash of the header fields and the Merkle root.
    pub fn id(&self) -> BlockId {
        BlockId(Hash256::hash_parts(&[
            self.parent_id.as_bytes(),
            &self.nonce,
            &self.timestamp.to_le_bytes(),
            self.merkle_root().as_bytes(),
        ]))
    }

    /// Merkle root over the miner payouts followed by the full transactions.
    pub fn merkle_root(&self) -> Hash256 {
        let leaves = self
            .miner_payouts
            .iter()
            .map(canonical_siacoin_output_bytes)
            .chain(self.transactions.iter().map(canonical_transaction_bytes))
            .map(|leaf| Hash256::hash_parts(&[&[LEAF_PREFIX], &leaf]))
            .collect();
        merkle_root(leaves)
    }
}

/// Fold a level of hashes pairwise until one remains.
///
/// An unpaired hash at the end of a level is promoted unchanged. An empty tree
/// has the zero root.
fn merkle_root(mut level: Vec<Hash256>) -> Hash256 {
    if level.is_empty() {
        return Hash256::ZERO;
    }
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => {
                    Hash256::hash_parts(&[&[NODE_PREFIX], left.as_bytes(), right.as_bytes()])
                }
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level[0]
}
