//! Test fixtures and helpers.
//!
//! Common setup code for engine, streaming and API tests.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use siagate_consensus::{ConsensusChange, ConsensusSet, MemoryConsensusSet, Result};
use siagate_core::{
    Block, Currency, Keypair, Network, SiacoinOutputId, SiafundOutputId, Transaction,
    TransactionBuilder, UnlockConditions, UnlockHash,
};
use siagate_stream::ChangeDecoder;

/// Siacoins the genesis block pays to the fixture's keypair.
pub const GENESIS_SIACOINS: u64 = 1_000_000;

/// Siafunds the genesis block pays to the fixture's keypair.
pub const GENESIS_SIAFUNDS: u64 = 10_000;

/// A testing-network chain whose genesis funds a single keypair.
pub struct TestChain {
    pub keypair: Keypair,
    pub cs: Arc<MemoryConsensusSet>,
    /// The genesis siacoin output.
    pub coin: SiacoinOutputId,
    /// The genesis siafund output.
    pub fund: SiafundOutputId,
}

impl TestChain {
    /// Create a chain funded for a random keypair.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a chain funded for a deterministic keypair.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let keypair = Keypair::from_seed(&seed);
        let owner = UnlockConditions::single_key(keypair.public_key()).unlock_hash();
        let funding = TransactionBuilder::new()
            .siacoin_output(Currency::from(GENESIS_SIACOINS), owner)
            .siafund_output(Currency::from(GENESIS_SIAFUNDS), owner)
            .build();
        let coin = funding.siacoin_output_id(0);
        let fund = funding.siafund_output_id(0);
        let genesis = Block {
            timestamp: siagate_core::ConsensusConstants::for_network(Network::Testing)
                .genesis_timestamp,
            transactions: vec![funding],
            ..Block::default()
        };

        // the keypair also controls the Foundation, so update tests can sign
        let cs = MemoryConsensusSet::new(genesis, Network::Testing, owner, owner);
        Self {
            keypair,
            cs: Arc::new(cs),
            coin,
            fund,
        }
    }

    /// The unlock conditions guarding the genesis outputs.
    pub fn unlock_conditions(&self) -> UnlockConditions {
        UnlockConditions::single_key(self.keypair.public_key())
    }

    pub fn unlock_hash(&self) -> UnlockHash {
        self.unlock_conditions().unlock_hash()
    }

    /// The consensus set as the trait object the API layers take.
    pub fn consensus_set(&self) -> Arc<dyn ConsensusSet> {
        self.cs.clone()
    }

    /// A block extending the current tip with `txns`.
    pub async fn next_block(&self, txns: Vec<Transaction>) -> Block {
        let height = self.cs.height().await;
        let parent = self.cs.block_at_height(height).await.unwrap_or_default();
        Block {
            parent_id: parent.id(),
            timestamp: parent.timestamp + 1,
            transactions: txns,
            ..Block::default()
        }
    }

    /// Mine a block containing `txns` onto the tip.
    pub async fn mine(&self, txns: Vec<Transaction>) -> Result<ConsensusChange> {
        let block = self.next_block(txns).await;
        self.cs.accept_block(block).await
    }

    /// Mine `n` empty blocks.
    pub async fn mine_empty(&self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.mine(vec![]).await?;
        }
        Ok(())
    }

    /// A signed transaction moving the whole genesis coin to `to`.
    pub fn spend_genesis_coin(&self, to: UnlockHash) -> Transaction {
        TransactionBuilder::new()
            .siacoin_input(self.coin, self.unlock_conditions())
            .siacoin_output(Currency::from(GENESIS_SIACOINS), to)
            .sign(&self.keypair)
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Read from `reader` until at least `n` changes have been decoded.
///
/// Returns fewer if the stream ends first.
pub async fn read_changes<R: AsyncRead + Unpin>(reader: &mut R, n: usize) -> Vec<ConsensusChange> {
    let mut buf = Vec::new();
    loop {
        let (changes, _) = ChangeDecoder::new(buf.clone()).decode_all();
        if changes.len() >= n {
            return changes;
        }
        let mut chunk = [0u8; 4096];
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => return changes,
            Ok(read) => buf.extend_from_slice(&chunk[..read]),
        }
    }
}
